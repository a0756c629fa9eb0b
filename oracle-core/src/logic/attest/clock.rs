//! Monotonic millisecond clock for attestation timestamps.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Issues `max(wall_clock_ms, last_issued)`: never goes backwards, even
/// across a wall-clock step.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicU64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        let wall = Utc::now().timestamp_millis().max(0) as u64;
        self.issue(wall)
    }

    pub(crate) fn issue(&self, wall_ms: u64) -> u64 {
        let previous = self.last.fetch_max(wall_ms, Ordering::SeqCst);
        if wall_ms < previous {
            tracing::error!(
                wall_ms,
                last_issued_ms = previous,
                "wall clock moved backwards; holding attestation timestamp"
            );
            previous
        } else {
            wall_ms
        }
    }

    /// Last timestamp handed out (0 if none)
    pub fn last_issued(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_holds_last_value() {
        let clock = MonotonicClock::new();
        assert_eq!(clock.issue(1_000), 1_000);
        assert_eq!(clock.issue(900), 1_000);
        assert_eq!(clock.issue(1_000), 1_000);
        assert_eq!(clock.issue(1_500), 1_500);
        assert_eq!(clock.last_issued(), 1_500);
    }

    #[test]
    fn test_wall_clock_is_used() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(a > 1_600_000_000_000);
        assert!(b >= a);
    }
}
