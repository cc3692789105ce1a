mod factory;
mod shared;
mod shared_class;
mod weak;

pub use self::factory::{
    make_shareable, make_shareable_class, make_shareable_with, make_shared, make_shared_class,
    make_shared_class_in, make_shared_in,
};
pub use self::shared::SharedPtr;
pub use self::shared_class::{SharedClass, SharedFromThis};
pub use self::weak::WeakPtr;
