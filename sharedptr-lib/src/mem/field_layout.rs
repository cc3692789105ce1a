use core::{
    alloc::Layout,
    marker::PhantomData,
    mem::{align_of, size_of},
};

const fn max(a: usize, b: usize) -> usize {
    if a > b {
        a
    } else {
        b
    }
}

/// A `T` field followed by an adjacent field aligned to `adjacent_align`.
pub struct FieldLayout<T> {
    pub align: usize,
    pub size: usize,
    _0: PhantomData<T>,
}

impl<T> FieldLayout<T> {
    pub const fn align_to(adjacent_align: usize) -> FieldLayout<T> {
        assert!(adjacent_align.is_power_of_two());
        FieldLayout {
            align: max(align_of::<T>(), adjacent_align),
            size: {
                let mask = adjacent_align - 1;
                (size_of::<T>() + mask) & !mask
            },
            _0: PhantomData,
        }
    }
    /// The layout of the `T` field and `adjacent_size` bytes after it.
    #[inline(always)]
    pub const fn layout(&self, adjacent_size: usize) -> Layout {
        unsafe { Layout::from_size_align_unchecked(self.size + adjacent_size, self.align) }
    }
    #[inline(always)]
    pub unsafe fn to_adjacent(&self, p: *mut T) -> *mut u8 {
        (p as *mut u8).add(self.size)
    }
    #[inline(always)]
    pub unsafe fn from_adjacent(&self, p: *mut u8) -> *mut T {
        p.sub(self.size) as *mut T
    }
}
