use core::{cell::OnceCell, fmt};

use super::{shared::SharedPtr, weak::WeakPtr};

/// A weak back-reference that lets an object create shared handles to itself.
///
/// Embed it in a type, implement [`SharedFromThis`] and create objects with one of the
/// `make_*_class` factories. The factory fills the back-reference right after the control block
/// exists; before that, `as_shared` returns an empty handle.
pub struct SharedClass<T> {
    weak_this: OnceCell<WeakPtr<T>>,
}

impl<T> SharedClass<T> {
    pub const fn new() -> Self {
        Self {
            weak_this: OnceCell::new(),
        }
    }
    pub fn is_shared_initialized(&self) -> bool {
        self.weak_this.get().is_some()
    }
    pub fn as_shared(&self) -> SharedPtr<T> {
        self.weak_this
            .get()
            .map_or_else(SharedPtr::null, WeakPtr::pin)
    }
    pub fn as_weak(&self) -> WeakPtr<T> {
        self.weak_this.get().cloned().unwrap_or_default()
    }
    /// Stores a weak reference to `shared`. Only the factories call it, once per object.
    pub(crate) fn init(&self, shared: &SharedPtr<T>) {
        if !crate::check!(!self.is_shared_initialized()) {
            return;
        }
        let _ = self.weak_this.set(WeakPtr::from(shared));
    }
}

impl<T> Default for SharedClass<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SharedClass<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedClass")
            .field("initialized", &self.is_shared_initialized())
            .finish()
    }
}

/// An object that holds a [`SharedClass`] of itself.
pub trait SharedFromThis: Sized {
    // required:
    fn shared_class(&self) -> &SharedClass<Self>;
    // optional:
    fn as_shared(&self) -> SharedPtr<Self> {
        self.shared_class().as_shared()
    }
    fn as_weak(&self) -> WeakPtr<Self> {
        self.shared_class().as_weak()
    }
}

#[cfg(test)]
mod test {
    use core::{cell::Cell, ptr};

    use wasm_bindgen_test::wasm_bindgen_test;

    use crate::{
        check::{with_severity, Severity},
        mem::local::Local,
        ptr::{
            factory::{make_shareable_class, make_shared, make_shared_class, make_shared_class_in},
            shared::SharedPtr,
        },
    };

    use super::{SharedClass, SharedFromThis};

    #[derive(Default)]
    struct Widget {
        value: i32,
        shared: SharedClass<Widget>,
    }

    impl SharedFromThis for Widget {
        fn shared_class(&self) -> &SharedClass<Self> {
            &self.shared
        }
    }

    impl Widget {
        fn new(value: i32) -> Self {
            Self {
                value,
                shared: SharedClass::new(),
            }
        }
        fn me(&self) -> SharedPtr<Self> {
            self.as_shared()
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_round_trip() {
        let p = make_shared_class(Widget::new(42));
        assert_eq!(p.shared_num(), 1);
        assert_eq!(p.weak_num(), 1);
        let q = p.me();
        assert!(ptr::eq(q.get().unwrap(), p.get().unwrap()));
        assert!(q.ptr_eq(&p));
        assert_eq!(p.shared_num(), 2);
        assert_eq!(q.value, 42);
        drop(q);
        assert!(p.is_unique());
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_get_mut() {
        let mut p = make_shared_class(Widget::new(1));
        assert!(p.is_unique());
        assert!(p.get_mut().is_none());
        let mut q = make_shared(Widget::new(2));
        q.get_mut().unwrap().value = 3;
        assert_eq!(q.value, 3);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_not_initialized() {
        let w = Widget::new(1);
        assert!(!w.shared_class().is_shared_initialized());
        assert!(!w.as_shared().is_valid());
        assert!(!w.as_weak().is_valid());
        let p = make_shared(Widget::default());
        assert!(!p.me().is_valid());
        assert_eq!(p.weak_num(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_shareable() {
        let p = make_shareable_class(Box::new(Widget::new(3)));
        assert!(p.shared_class().is_shared_initialized());
        let w = p.as_weak();
        assert_eq!(p.weak_num(), 2);
        drop(p);
        assert!(!w.is_valid());
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_block_freed() {
        let local: &'static Local = Box::leak(Box::default());
        let p = make_shared_class_in(local, Widget::new(5));
        assert_eq!(local.count(), 2);
        let w = p.as_weak();
        drop(p);
        assert_eq!(local.count(), 1);
        assert!(!w.pin().is_valid());
        drop(w);
        assert_eq!(local.count(), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_double_init() {
        let p = make_shared_class(Widget::new(7));
        with_severity(Severity::Log, || p.shared_class().init(&p));
        assert_eq!(p.weak_num(), 1);
        assert!(p.me().ptr_eq(&p));
    }

    #[test]
    #[should_panic(expected = "check failed")]
    #[wasm_bindgen_test]
    fn test_double_init_panics() {
        let p = make_shared_class(Widget::new(7));
        with_severity(Severity::Panic, || p.shared_class().init(&p));
    }

    struct Tracker<'a> {
        shared: SharedClass<Tracker<'a>>,
        pinned_on_drop: &'a Cell<Option<bool>>,
    }

    impl SharedFromThis for Tracker<'_> {
        fn shared_class(&self) -> &SharedClass<Self> {
            &self.shared
        }
    }

    impl Drop for Tracker<'_> {
        fn drop(&mut self) {
            self.pinned_on_drop.set(Some(self.as_shared().is_valid()));
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_pin_during_drop() {
        let pinned_on_drop = Cell::new(None);
        let p = make_shared_class(Tracker {
            shared: SharedClass::new(),
            pinned_on_drop: &pinned_on_drop,
        });
        drop(p);
        assert_eq!(pinned_on_drop.get(), Some(false));
    }
}
