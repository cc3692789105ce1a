use core::cell::Cell;

/// Update a reference count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefCounterUpdate {
    AddRef = 1,
    Read = 0,
    Release = -1,
}

/// A single-threaded reference counter.
#[derive(Debug, Default)]
#[repr(transparent)]
pub struct RefCounter {
    counter: Cell<u16>,
}

impl RefCounter {
    pub const MAX: u16 = u16::MAX;
    /// Applies `update` and returns the previous value.
    ///
    /// The caller keeps the counter in `0..=MAX`.
    #[inline(always)]
    pub fn update(&self, update: RefCounterUpdate) -> u16 {
        let result = self.counter.get();
        match update {
            RefCounterUpdate::AddRef => self.counter.set(result + 1),
            RefCounterUpdate::Read => {}
            RefCounterUpdate::Release => self.counter.set(result - 1),
        }
        result
    }
    #[inline(always)]
    pub fn get(&self) -> u16 {
        self.update(RefCounterUpdate::Read)
    }
}
