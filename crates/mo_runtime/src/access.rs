//! Process-wide switch deciding whether callers may force visibility on
//! private members.
//!
//! The default is permissive. A thread can temporarily narrow or widen the
//! privilege with [`with_member_access_control`] without affecting others.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

static ALLOW_FORCED_ACCESS: AtomicBool = AtomicBool::new(true);

std::thread_local! {
    static THREAD_OVERRIDE: Cell<Option<bool>> = const { Cell::new(None) };
}

/// Whether the calling context may force visibility on private members.
pub fn can_control_member_accessible() -> bool {
    THREAD_OVERRIDE
        .with(Cell::get)
        .unwrap_or_else(|| ALLOW_FORCED_ACCESS.load(Ordering::Acquire))
}

/// Sets the process-wide default, returning the previous one.
pub fn set_member_access_control(allowed: bool) -> bool {
    ALLOW_FORCED_ACCESS.swap(allowed, Ordering::AcqRel)
}

/// Runs `f` with the privilege overridden for the current thread only.
pub fn with_member_access_control<R>(allowed: bool, f: impl FnOnce() -> R) -> R {
    struct Restore(Option<bool>);

    impl Drop for Restore {
        fn drop(&mut self) {
            THREAD_OVERRIDE.with(|cell| cell.set(self.0));
        }
    }

    let _restore = Restore(THREAD_OVERRIDE.with(|cell| cell.replace(Some(allowed))));
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_is_scoped() {
        let before = can_control_member_accessible();
        let inside = with_member_access_control(!before, can_control_member_accessible);
        assert_eq!(inside, !before);
        assert_eq!(can_control_member_accessible(), before);
    }
}
