use core::ptr::NonNull;

use super::referencer::ReferencerBase;

/// A non-owning, copyable pointer to a control block.
///
/// Copying a proxy doesn't change the counts; its owner does that. The proxy is the only place
/// that frees a control block: whenever a `remove_*` leaves the block without references.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReferencerProxy {
    block: Option<NonNull<ReferencerBase>>,
}

impl ReferencerProxy {
    pub const fn null() -> Self {
        Self { block: None }
    }
    /// `block` has to stay allocated while it has references.
    #[inline(always)]
    pub const unsafe fn new(block: NonNull<ReferencerBase>) -> Self {
        Self { block: Some(block) }
    }
    #[inline(always)]
    pub const fn is_valid(&self) -> bool {
        self.block.is_some()
    }
    #[inline(always)]
    fn base(&self) -> Option<&ReferencerBase> {
        self.block.map(|block| unsafe { &*block.as_ptr() })
    }
    pub fn shared_num(&self) -> u16 {
        self.base().map_or(0, ReferencerBase::shared_num)
    }
    pub fn weak_num(&self) -> u16 {
        self.base().map_or(0, ReferencerBase::weak_num)
    }
    pub fn has_object(&self) -> bool {
        self.block
            .is_some_and(|block| unsafe { ReferencerBase::has_object(block) })
    }
    pub fn add_shared(&self) {
        if let Some(base) = self.base() {
            base.add_shared();
        }
    }
    pub fn add_weak(&self) {
        if let Some(base) = self.base() {
            base.add_weak();
        }
    }
    pub fn remove_shared(&mut self) {
        if let Some(block) = self.block {
            unsafe { ReferencerBase::remove_shared(block) };
            self.delete_if_unreferenced(block);
        }
    }
    pub fn remove_weak(&mut self) {
        if let Some(block) = self.block {
            unsafe { block.as_ref() }.remove_weak();
            self.delete_if_unreferenced(block);
        }
    }
    fn delete_if_unreferenced(&mut self, block: NonNull<ReferencerBase>) {
        if !unsafe { block.as_ref() }.has_any_reference() {
            unsafe { ReferencerBase::delete(block) };
            self.block = None;
        }
    }
}

#[cfg(test)]
mod test {
    use core::{cell::Cell, ptr::NonNull};

    use wasm_bindgen_test::wasm_bindgen_test;

    use crate::mem::{local::Local, referencer::CustomReferencer, Manager};

    use super::ReferencerProxy;

    fn new_proxy(local: &'static Local, deleted: &'static Cell<u32>) -> ReferencerProxy {
        let object = local.new_object(String::from("object"));
        let block = CustomReferencer::new_in(local, object, move |p: NonNull<String>| {
            deleted.set(deleted.get() + 1);
            unsafe { <&'static Local as Manager>::delete_object(p) }
        });
        unsafe { ReferencerProxy::new(block) }
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_null() {
        let mut x = ReferencerProxy::null();
        assert!(!x.is_valid());
        x.add_shared();
        x.add_weak();
        x.remove_shared();
        x.remove_weak();
        assert_eq!(x.shared_num(), 0);
        assert_eq!(x.weak_num(), 0);
        assert!(!x.has_object());
        assert_eq!(x, ReferencerProxy::default());
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_shared() {
        let local: &'static Local = Box::leak(Box::default());
        let deleted: &'static Cell<u32> = Box::leak(Box::default());
        let mut x = new_proxy(local, deleted);
        x.add_shared();
        let mut y = x;
        y.add_shared();
        assert_eq!(x.shared_num(), 2);
        y.remove_shared();
        assert!(y.is_valid());
        assert_eq!(deleted.get(), 0);
        x.remove_shared();
        assert!(!x.is_valid());
        assert_eq!(deleted.get(), 1);
        assert_eq!(local.count(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_weak_keeps_block() {
        let local: &'static Local = Box::leak(Box::default());
        let deleted: &'static Cell<u32> = Box::leak(Box::default());
        let mut shared = new_proxy(local, deleted);
        shared.add_shared();
        let mut weak = shared;
        weak.add_weak();
        shared.remove_shared();
        assert!(shared.is_valid());
        assert_eq!(deleted.get(), 1);
        assert_eq!(local.count(), 1);
        assert!(!weak.has_object());
        assert_eq!(weak.weak_num(), 1);
        weak.remove_weak();
        assert!(!weak.is_valid());
        assert_eq!(local.count(), 0);
    }
}
