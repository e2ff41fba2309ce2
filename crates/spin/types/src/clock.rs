use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::account::Timestamp;

/// Source of the current time for lock validity and sale windows.
///
/// Implementations must never move backward between two reads.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time in whole UTC seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp().max(0) as Timestamp
    }
}

/// Deterministic clock driven by the caller. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Move time forward by `secs`, returning the new time.
    pub fn advance(&self, secs: u64) -> Timestamp {
        let previous = self.now.fetch_add(secs, Ordering::SeqCst);
        previous.saturating_add(secs)
    }

    /// Move time forward to `at`. Earlier targets leave the clock untouched.
    pub fn advance_to(&self, at: Timestamp) -> Timestamp {
        let previous = self.now.fetch_max(at, Ordering::SeqCst);
        previous.max(at)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_and_is_shared() {
        let clock = ManualClock::new(1_000);
        let handle = clock.clone();
        assert_eq!(clock.advance(20), 1_020);
        assert_eq!(handle.now(), 1_020);
    }

    #[test]
    fn manual_clock_never_goes_backward() {
        let clock = ManualClock::new(5_000);
        assert_eq!(clock.advance_to(4_000), 5_000);
        assert_eq!(clock.now(), 5_000);
        assert_eq!(clock.advance_to(6_000), 6_000);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
