use core::{
    any::Any,
    fmt::{self, Debug},
    marker::PhantomData,
    mem::take,
    ops::Deref,
    ptr::NonNull,
};

use crate::mem::proxy::ReferencerProxy;

use super::{factory::make_shared, weak::WeakPtr};

/// A strong, owning handle to a reference-counted object.
///
/// While a `SharedPtr` is valid, the object stays alive. A handle is either empty or owns one
/// shared reference of its control block.
///
/// Dereferencing an empty handle panics. Use [`SharedPtr::get`] when the handle may be empty.
pub struct SharedPtr<T: ?Sized> {
    pub(crate) proxy: ReferencerProxy,
    pub(crate) object: Option<NonNull<T>>,
    _0: PhantomData<T>,
}

impl<T> SharedPtr<T> {
    /// Same as [`make_shared`].
    pub fn new(value: T) -> Self {
        make_shared(value)
    }
    /// The object pointer, or null if the handle is not valid.
    pub fn as_ptr(&self) -> *const T {
        self.get().map_or(core::ptr::null(), |value| value as *const T)
    }
}

impl<T: ?Sized> SharedPtr<T> {
    pub const fn null() -> Self {
        Self {
            proxy: ReferencerProxy::null(),
            object: None,
            _0: PhantomData,
        }
    }
    /// Adds a shared reference to the block of `proxy`.
    pub(crate) unsafe fn from_proxy(proxy: ReferencerProxy, object: NonNull<T>) -> Self {
        proxy.add_shared();
        Self {
            proxy,
            object: Some(object),
            _0: PhantomData,
        }
    }
    /// Moves the reference into a handle of another type without touching the counts.
    unsafe fn transfer<U: ?Sized>(&mut self, object: Option<NonNull<U>>) -> SharedPtr<U> {
        self.object = None;
        SharedPtr {
            proxy: take(&mut self.proxy),
            object,
            _0: PhantomData,
        }
    }
    /// `true` if the handle refers to a live object.
    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        self.proxy.is_valid() && self.proxy.shared_num() > 0
    }
    #[inline(always)]
    pub fn is_unique(&self) -> bool {
        self.proxy.shared_num() == 1
    }
    #[inline(always)]
    pub fn shared_num(&self) -> u16 {
        self.proxy.shared_num()
    }
    #[inline(always)]
    pub fn weak_num(&self) -> u16 {
        self.proxy.weak_num()
    }
    pub fn get(&self) -> Option<&T> {
        if !self.is_valid() {
            return None;
        }
        self.object.map(|object| unsafe { &*object.as_ptr() })
    }
    /// A mutable reference, if there are no other shared or weak handles.
    ///
    /// Objects created by the `make_*_class` factories always have the weak back-reference of
    /// their [`SharedClass`](super::SharedClass), so this is `None` for them.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if self.proxy.shared_num() != 1 || self.proxy.weak_num() != 0 {
            return None;
        }
        self.object.map(|object| unsafe { &mut *object.as_ptr() })
    }
    pub fn reset(&mut self) {
        self.object = None;
        let mut proxy = take(&mut self.proxy);
        proxy.remove_shared();
    }
    /// Moves the reference out and leaves this handle empty.
    pub fn take(&mut self) -> Self {
        take(self)
    }
    /// `true` if both handles use the same control block.
    pub fn ptr_eq<U: ?Sized>(&self, other: &SharedPtr<U>) -> bool {
        self.proxy == other.proxy
    }
    pub fn downgrade(&self) -> WeakPtr<T> {
        WeakPtr::from(self)
    }
    /// Converts the handle through a projection of the object, e.g. into a trait object.
    ///
    /// ```
    /// use core::fmt::Display;
    /// use sharedptr_lib::ptr::SharedPtr;
    ///
    /// let x = SharedPtr::new(5);
    /// let y: SharedPtr<dyn Display> = x.clone().upcast(|v| v as &dyn Display);
    /// assert_eq!(y.to_string(), "5");
    /// assert!(y.ptr_eq(&x));
    /// ```
    pub fn upcast<U: ?Sized>(mut self, f: impl for<'a> FnOnce(&'a T) -> &'a U) -> SharedPtr<U> {
        match self.get().map(|value| NonNull::from(f(value))) {
            Some(object) => unsafe { self.transfer(Some(object)) },
            None => SharedPtr::null(),
        }
    }
    /// Reinterprets the object as `U`.
    ///
    /// # Safety
    ///
    /// The object has to be a valid `U`.
    pub unsafe fn cast_unchecked<U>(mut self) -> SharedPtr<U> {
        let object = self.object.map(NonNull::cast);
        self.transfer(object)
    }
}

impl SharedPtr<dyn Any> {
    /// Converts to the concrete type of the object, or returns the handle back.
    pub fn downcast<U: Any>(self) -> Result<SharedPtr<U>, Self> {
        if self.get().is_some_and(|value| value.is::<U>()) {
            Ok(unsafe { self.cast_unchecked() })
        } else {
            Err(self)
        }
    }
}

impl<T: ?Sized> Default for SharedPtr<T> {
    #[inline(always)]
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> Clone for SharedPtr<T> {
    fn clone(&self) -> Self {
        self.proxy.add_shared();
        Self {
            proxy: self.proxy,
            object: self.object,
            _0: PhantomData,
        }
    }
    fn clone_from(&mut self, source: &Self) {
        if self.proxy == source.proxy {
            // same block, counts stay, the object may be another projection of it
            self.object = source.object;
            return;
        }
        self.proxy.remove_shared();
        source.proxy.add_shared();
        self.proxy = source.proxy;
        self.object = source.object;
    }
}

impl<T: ?Sized> Drop for SharedPtr<T> {
    fn drop(&mut self) {
        self.proxy.remove_shared();
    }
}

impl<T: ?Sized> Deref for SharedPtr<T> {
    type Target = T;
    /// # Panics
    ///
    /// If the handle is empty.
    fn deref(&self) -> &T {
        match self.get() {
            Some(value) => value,
            None => panic!("dereference of a null SharedPtr"),
        }
    }
}

impl<T: ?Sized + Debug> Debug for SharedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("SharedPtr").field(&value).finish(),
            None => f.write_str("null"),
        }
    }
}
