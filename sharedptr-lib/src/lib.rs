//! Reference-counted shared and weak pointers.
//!
//! An object lives in memory given by a [`mem::Manager`] and is owned by a control block that
//! counts [`ptr::SharedPtr`] and [`ptr::WeakPtr`] handles. The object is destroyed when the last
//! shared handle is gone, the control block when the last handle of either kind is gone.
//!
//! The counters are not atomic, the handles are neither `Send` nor `Sync`.
#![allow(clippy::missing_safety_doc)]
pub mod app;
pub mod check;
pub mod mem;
pub mod ptr;
