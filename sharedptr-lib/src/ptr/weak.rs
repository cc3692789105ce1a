use core::{
    fmt::{self, Debug},
    mem::take,
    ptr::NonNull,
};

use crate::mem::proxy::ReferencerProxy;

use super::shared::SharedPtr;

/// A non-owning observer of a reference-counted object.
///
/// A `WeakPtr` keeps the control block allocated but not the object. Use [`WeakPtr::pin`] to get
/// a [`SharedPtr`] while the object is alive.
pub struct WeakPtr<T: ?Sized> {
    proxy: ReferencerProxy,
    object: Option<NonNull<T>>,
}

impl<T: ?Sized> WeakPtr<T> {
    pub const fn null() -> Self {
        Self {
            proxy: ReferencerProxy::null(),
            object: None,
        }
    }
    /// `true` while the object is alive and not being destroyed.
    pub fn is_valid(&self) -> bool {
        self.proxy.shared_num() > 0 && self.proxy.has_object()
    }
    /// A new shared handle, or an empty one if the object has expired.
    pub fn pin(&self) -> SharedPtr<T> {
        match self.object {
            Some(object) if self.is_valid() => unsafe { SharedPtr::from_proxy(self.proxy, object) },
            _ => SharedPtr::null(),
        }
    }
    #[inline(always)]
    pub fn shared_num(&self) -> u16 {
        self.proxy.shared_num()
    }
    #[inline(always)]
    pub fn weak_num(&self) -> u16 {
        self.proxy.weak_num()
    }
    pub fn reset(&mut self) {
        self.object = None;
        let mut proxy = take(&mut self.proxy);
        proxy.remove_weak();
    }
    pub fn ptr_eq<U: ?Sized>(&self, other: &WeakPtr<U>) -> bool {
        self.proxy == other.proxy
    }
    /// See [`SharedPtr::upcast`]. An expired handle becomes empty.
    pub fn upcast<U: ?Sized>(mut self, f: impl for<'a> FnOnce(&'a T) -> &'a U) -> WeakPtr<U> {
        let object = match self.object {
            Some(object) if self.is_valid() => NonNull::from(f(unsafe { &*object.as_ptr() })),
            _ => return WeakPtr::null(),
        };
        self.object = None;
        WeakPtr {
            proxy: take(&mut self.proxy),
            object: Some(object),
        }
    }
}

impl<T: ?Sized> From<&SharedPtr<T>> for WeakPtr<T> {
    fn from(shared: &SharedPtr<T>) -> Self {
        shared.proxy.add_weak();
        Self {
            proxy: shared.proxy,
            object: shared.object,
        }
    }
}

impl<T: ?Sized> From<SharedPtr<T>> for WeakPtr<T> {
    /// Turns the shared reference of `shared` into a weak one. The weak reference is added
    /// first, so the block is never left without references.
    fn from(mut shared: SharedPtr<T>) -> Self {
        let object = shared.object.take();
        let mut proxy = take(&mut shared.proxy);
        proxy.add_weak();
        proxy.remove_shared();
        Self { proxy, object }
    }
}

impl<T: ?Sized> Default for WeakPtr<T> {
    #[inline(always)]
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> Clone for WeakPtr<T> {
    fn clone(&self) -> Self {
        self.proxy.add_weak();
        Self {
            proxy: self.proxy,
            object: self.object,
        }
    }
    fn clone_from(&mut self, source: &Self) {
        if self.proxy == source.proxy {
            self.object = source.object;
            return;
        }
        self.proxy.remove_weak();
        source.proxy.add_weak();
        self.proxy = source.proxy;
        self.object = source.object;
    }
}

impl<T: ?Sized> Drop for WeakPtr<T> {
    fn drop(&mut self) {
        self.proxy.remove_weak();
    }
}

impl<T: ?Sized> Debug for WeakPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakPtr")
            .field("shared", &self.shared_num())
            .field("weak", &self.weak_num())
            .finish()
    }
}
