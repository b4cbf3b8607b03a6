//! Thread-local reentrancy guard.
//!
//! While a thread is inside the instrumentation, any allocation it makes
//! (symbol resolution, stderr locking, logging, environment lookups) must
//! not be audited: it would recurse into the registry it is already
//! working on. The flag is a const-initialized `Cell` with no destructor,
//! so reading it never allocates and stays valid during thread teardown.

use std::cell::Cell;

thread_local! {
    static INSIDE: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as running instrumentation code.
///
/// Cleared on drop.
pub struct ReentrancyGuard {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl ReentrancyGuard {
    /// Enter the instrumentation.
    ///
    /// Returns `None` if this thread is already inside, or if thread-local
    /// storage is no longer reachable; callers then bypass auditing.
    pub fn enter() -> Option<Self> {
        let entered = INSIDE
            .try_with(|inside| !inside.replace(true))
            .unwrap_or(false);

        if entered {
            Some(Self {
                _not_send: std::marker::PhantomData,
            })
        } else {
            None
        }
    }

    /// Check if the current thread is inside the instrumentation.
    #[cfg(test)]
    pub fn is_inside() -> bool {
        INSIDE.try_with(Cell::get).unwrap_or(true)
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        let _ = INSIDE.try_with(|inside| inside.set(false));
    }
}
