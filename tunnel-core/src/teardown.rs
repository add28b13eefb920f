use std::sync::atomic::{AtomicBool, Ordering};

/// Abstraction over a flag that can be fired exactly once.
pub trait Latch {
    /// Fire the latch. Returns `true` only for the call that fired it.
    fn try_fire(&self) -> bool;
    /// Return `true` once the latch has been fired.
    fn is_fired(&self) -> bool;
}

/// Atomic one-shot latch guarding a teardown path.
#[derive(Debug, Default)]
pub struct TeardownLatch {
    fired: AtomicBool,
}

impl TeardownLatch {
    /// Create an unfired latch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
        }
    }
}

impl Latch for TeardownLatch {
    fn try_fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }

    fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// Run `teardown` if this call is the one that fires `latch`.
///
/// Returns whether `teardown` ran. Concurrent callers race on the latch and exactly one
/// of them wins.
pub fn teardown_once<L, F>(latch: &L, teardown: F) -> bool
where
    L: Latch + ?Sized,
    F: FnOnce(),
{
    if latch.try_fire() {
        teardown();
        true
    } else {
        false
    }
}
