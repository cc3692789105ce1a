//! Checked invariants.
//!
//! Misuse of the reference counting internals (a count underflow, an overflow, a second
//! self-initialization) is a programmer error. `check!` reports such a failure through the
//! `log` facade and, depending on the thread's [`Severity`], panics.
use core::cell::Cell;

use log::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The failed check is skipped silently.
    Ignore,
    /// The failed check is logged.
    Log,
    /// The failed check is logged, then the thread panics.
    Panic,
}

impl Severity {
    pub const DEFAULT: Severity = if cfg!(debug_assertions) {
        Severity::Panic
    } else {
        Severity::Ignore
    };
}

impl Default for Severity {
    #[inline(always)]
    fn default() -> Self {
        Self::DEFAULT
    }
}

thread_local! {
    static SEVERITY: Cell<Severity> = const { Cell::new(Severity::DEFAULT) };
}

pub fn severity() -> Severity {
    SEVERITY.with(Cell::get)
}

/// Sets the severity for the current thread and returns the previous one.
pub fn set_severity(severity: Severity) -> Severity {
    SEVERITY.with(|s| s.replace(severity))
}

/// Runs `f` with `severity` and restores the previous severity afterwards.
pub fn with_severity<R>(severity: Severity, f: impl FnOnce() -> R) -> R {
    struct Restore(Severity);
    impl Drop for Restore {
        fn drop(&mut self) {
            set_severity(self.0);
        }
    }
    let _restore = Restore(set_severity(severity));
    f()
}

#[cold]
pub fn failed(expr: &str, file: &str, line: u32) {
    match severity() {
        Severity::Ignore => {}
        Severity::Log => error!("check failed: {expr} at {file}:{line}"),
        Severity::Panic => {
            error!("check failed: {expr} at {file}:{line}");
            panic!("check failed: {expr} at {file}:{line}");
        }
    }
}

/// Evaluates a condition, reports it when it doesn't hold and returns it.
///
/// ```
/// use sharedptr_lib::check;
///
/// fn pop(count: &mut u16) {
///     if !check!(*count > 0) {
///         return;
///     }
///     *count -= 1;
/// }
/// let mut count = 1;
/// pop(&mut count);
/// assert_eq!(count, 0);
/// ```
#[macro_export]
macro_rules! check {
    ($cond:expr) => {{
        let ok: bool = $cond;
        if !ok {
            $crate::check::failed(stringify!($cond), file!(), line!());
        }
        ok
    }};
}
