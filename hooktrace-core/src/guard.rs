use std::sync::atomic::{AtomicBool, Ordering};

/// Latch-only reentrancy flag for the emit-log interceptor.
///
/// The emit-log point is re-entered whenever any interceptor logs, because
/// the host's log pipeline is itself an interceptable point. The guard is
/// flag-latched, not lock-protected: two threads may both observe it unset
/// and both emit the one-time marker, which is a benign race in a
/// diagnostic aid. It is never cleared during the process lifetime.
#[derive(Debug, Default)]
pub struct RecursionGuard {
    latched: AtomicBool,
}

impl RecursionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the latch. Returns true only for the first caller; the latch is
    /// never released afterwards.
    pub fn latch(&self) -> bool {
        self.latched
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_latched(&self) -> bool {
        self.latched.load(Ordering::Acquire)
    }
}
