use core::{cell::Cell, ptr::NonNull};
use std::process::abort;

use log::trace;

use super::{
    counter::{RefCounter, RefCounterUpdate},
    Manager,
};

/// Hooks of a concrete control block.
///
/// Each hook receives a pointer to the `ReferencerBase` header of the block it belongs to.
pub struct ReferencerVtable {
    pub object: unsafe fn(NonNull<ReferencerBase>) -> Option<NonNull<u8>>,
    pub deconstruct_object: unsafe fn(NonNull<ReferencerBase>),
    pub delete: unsafe fn(NonNull<ReferencerBase>),
}

/// The header of a control block: shared and weak counts and the block's hooks.
///
/// Concrete blocks are `#[repr(C)]` with the header as the first field, so a pointer to the
/// header is a pointer to the block.
#[repr(C)]
pub struct ReferencerBase {
    shared: RefCounter,
    weak: RefCounter,
    vtable: &'static ReferencerVtable,
}

impl ReferencerBase {
    #[inline(always)]
    pub fn new(vtable: &'static ReferencerVtable) -> Self {
        Self {
            shared: RefCounter::default(),
            weak: RefCounter::default(),
            vtable,
        }
    }
    #[inline(always)]
    pub fn shared_num(&self) -> u16 {
        self.shared.get()
    }
    #[inline(always)]
    pub fn weak_num(&self) -> u16 {
        self.weak.get()
    }
    #[inline(always)]
    pub fn has_any_reference(&self) -> bool {
        self.shared.get() != 0 || self.weak.get() != 0
    }
    fn add(counter: &RefCounter) {
        // an uncounted handle would free the block under its owner
        if !crate::check!(counter.get() < RefCounter::MAX) {
            abort();
        }
        counter.update(RefCounterUpdate::AddRef);
    }
    pub fn add_shared(&self) {
        Self::add(&self.shared)
    }
    pub fn add_weak(&self) {
        Self::add(&self.weak)
    }
    /// Releases a shared reference. The last one deconstructs the object before the count
    /// drops, so the object's destructor still observes `shared_num() == 1`.
    pub unsafe fn remove_shared(this: NonNull<Self>) {
        let shared = &this.as_ref().shared;
        if !crate::check!(shared.get() > 0) {
            return;
        }
        if shared.get() == 1 {
            Self::deconstruct_object(this);
        }
        shared.update(RefCounterUpdate::Release);
    }
    pub fn remove_weak(&self) {
        if !crate::check!(self.weak.get() > 0) {
            return;
        }
        self.weak.update(RefCounterUpdate::Release);
    }
    #[inline(always)]
    pub unsafe fn object(this: NonNull<Self>) -> Option<NonNull<u8>> {
        (this.as_ref().vtable.object)(this)
    }
    #[inline(always)]
    pub unsafe fn has_object(this: NonNull<Self>) -> bool {
        Self::object(this).is_some()
    }
    #[inline(always)]
    pub unsafe fn deconstruct_object(this: NonNull<Self>) {
        (this.as_ref().vtable.deconstruct_object)(this)
    }
    /// Drops and deallocates the whole block. `this` is dangling afterwards.
    #[inline(always)]
    pub unsafe fn delete(this: NonNull<Self>) {
        (this.as_ref().vtable.delete)(this)
    }
}

/// A control block that owns an object and the deleter that destroys it.
#[repr(C)]
pub struct CustomReferencer<T, D: FnOnce(NonNull<T>)> {
    base: ReferencerBase,
    object: Cell<Option<NonNull<T>>>,
    deleter: Cell<Option<D>>,
    delete: unsafe fn(NonNull<Self>),
}

impl<T, D: FnOnce(NonNull<T>)> CustomReferencer<T, D> {
    const VTABLE: ReferencerVtable = ReferencerVtable {
        object: Self::object_impl,
        deconstruct_object: Self::deconstruct_object_impl,
        delete: Self::delete_impl,
    };
    /// Allocates a block with zero counts through `manager`.
    pub fn new_in<M: Manager>(manager: M, object: NonNull<T>, deleter: D) -> NonNull<ReferencerBase> {
        manager
            .new_object(Self {
                base: ReferencerBase::new(&Self::VTABLE),
                object: Cell::new(Some(object)),
                deleter: Cell::new(Some(deleter)),
                delete: M::delete_object::<Self>,
            })
            .cast()
    }
    unsafe fn object_impl(this: NonNull<ReferencerBase>) -> Option<NonNull<u8>> {
        this.cast::<Self>().as_ref().object.get().map(NonNull::cast)
    }
    unsafe fn deconstruct_object_impl(this: NonNull<ReferencerBase>) {
        let this = this.cast::<Self>().as_ref();
        if let Some(object) = this.object.take() {
            trace!("deconstruct object {:p}", object);
            if let Some(deleter) = this.deleter.take() {
                deleter(object);
            }
        }
    }
    unsafe fn delete_impl(this: NonNull<ReferencerBase>) {
        let this = this.cast::<Self>();
        trace!("delete control block {:p}", this);
        let delete = this.as_ref().delete;
        delete(this);
    }
}
