pub mod global;
pub mod local;

pub(crate) mod counter;
pub(crate) mod proxy;
pub(crate) mod referencer;

mod field_layout;

use core::{alloc::Layout, ptr::NonNull};
use std::alloc::handle_alloc_error;

/// A raw allocator for managed objects and their control blocks.
pub trait Manager: Copy {
    // required:
    unsafe fn alloc(self, layout: Layout) -> *mut u8;
    unsafe fn dealloc(ptr: *mut u8, layout: Layout);
    // optional:
    /// Allocate memory for a `T` object and move the `value` there.
    fn new_object<T>(self, value: T) -> NonNull<T> {
        let layout = Layout::new::<T>();
        let p = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            match NonNull::new(unsafe { self.alloc(layout) } as *mut T) {
                Some(p) => p,
                None => handle_alloc_error(layout),
            }
        };
        unsafe { p.as_ptr().write(value) };
        p
    }
    /// Drop the object and release its memory.
    ///
    /// `p` has to be created by `new_object` of the same manager type.
    unsafe fn delete_object<T>(p: NonNull<T>) {
        p.as_ptr().drop_in_place();
        let layout = Layout::new::<T>();
        if layout.size() != 0 {
            Self::dealloc(p.as_ptr() as *mut u8, layout);
        }
    }
}
