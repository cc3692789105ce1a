use core::ptr::NonNull;

use crate::mem::{global::GLOBAL, proxy::ReferencerProxy, referencer::CustomReferencer, Manager};

use super::{shared::SharedPtr, shared_class::SharedFromThis};

unsafe fn make_shareable_in<T, D: FnOnce(NonNull<T>), M: Manager>(
    manager: M,
    object: NonNull<T>,
    deleter: D,
) -> SharedPtr<T> {
    let block = CustomReferencer::new_in(manager, object, deleter);
    SharedPtr::from_proxy(ReferencerProxy::new(block), object)
}

fn init_shared_class<T: SharedFromThis>(shared: SharedPtr<T>) -> SharedPtr<T> {
    if let Some(value) = shared.get() {
        value.shared_class().init(&shared);
    }
    shared
}

/// Moves `value` into a new object on the process heap.
pub fn make_shared<T>(value: T) -> SharedPtr<T> {
    make_shared_in(GLOBAL, value)
}

/// Moves `value` into a new object allocated by `manager`. The control block is allocated by
/// the same manager.
pub fn make_shared_in<T, M: Manager>(manager: M, value: T) -> SharedPtr<T> {
    let object = manager.new_object(value);
    let deleter = |object: NonNull<T>| unsafe { M::delete_object(object) };
    unsafe { make_shareable_in(manager, object, deleter) }
}

/// Takes ownership of a boxed object.
pub fn make_shareable<T>(object: Box<T>) -> SharedPtr<T> {
    let object = NonNull::from(Box::leak(object));
    let deleter = |object: NonNull<T>| drop(unsafe { Box::from_raw(object.as_ptr()) });
    unsafe { make_shareable_with(object, deleter) }
}

/// Takes ownership of `object`, which `deleter` destroys when the last shared handle is gone.
///
/// # Safety
///
/// `object` has to be valid until `deleter` is called. `deleter` runs when the last shared handle
/// is dropped, so it and everything it captures have to stay valid until then.
pub unsafe fn make_shareable_with<T, D: FnOnce(NonNull<T>)>(
    object: NonNull<T>,
    deleter: D,
) -> SharedPtr<T> {
    make_shareable_in(GLOBAL, object, deleter)
}

/// [`make_shared`] for objects that can create shared handles to themselves.
pub fn make_shared_class<T: SharedFromThis>(value: T) -> SharedPtr<T> {
    init_shared_class(make_shared(value))
}

pub fn make_shared_class_in<T: SharedFromThis, M: Manager>(manager: M, value: T) -> SharedPtr<T> {
    init_shared_class(make_shared_in(manager, value))
}

pub fn make_shareable_class<T: SharedFromThis>(object: Box<T>) -> SharedPtr<T> {
    init_shared_class(make_shareable(object))
}
