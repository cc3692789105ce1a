use core::{alloc::Layout, cell::Cell};

use super::{
    field_layout::FieldLayout,
    global::{Global, GLOBAL},
    Manager,
};

/// A manager that counts its live allocations and their total size.
///
/// Every allocation is prefixed with a pointer back to the `Local`, so `dealloc` can find the
/// counters without a manager value.
#[derive(Debug, Default)]
pub struct Local {
    counter: Cell<usize>,
    size: Cell<usize>,
}

type Header = *const Local;

type HeaderLayout = FieldLayout<Header>;

impl Local {
    fn layout(block_layout: Layout) -> (HeaderLayout, Layout) {
        let header_layout = HeaderLayout::align_to(block_layout.align());
        let layout = header_layout.layout(block_layout.size());
        (header_layout, layout)
    }
    /// The number of live allocations.
    pub fn count(&self) -> usize {
        self.counter.get()
    }
    /// The number of bytes in live allocations, including the back pointers.
    pub fn size(&self) -> usize {
        self.size.get()
    }
}

impl Manager for &'static Local {
    unsafe fn alloc(self, block_layout: Layout) -> *mut u8 {
        let (header_layout, layout) = Local::layout(block_layout);
        let p = GLOBAL.alloc(layout) as *mut Header;
        if p.is_null() {
            return p as *mut u8;
        }
        self.counter.set(self.counter.get() + 1);
        self.size.set(self.size.get() + layout.size());
        p.write(self as *const Local);
        header_layout.to_adjacent(p)
    }
    unsafe fn dealloc(block_p: *mut u8, block_layout: Layout) {
        let (header_layout, layout) = Local::layout(block_layout);
        let p = header_layout.from_adjacent(block_p);
        {
            let local = &**p;
            local.counter.set(local.counter.get() - 1);
            local.size.set(local.size.get() - layout.size());
        }
        Global::dealloc(p as *mut u8, layout);
    }
}
