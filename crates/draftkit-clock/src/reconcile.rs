//! The pure clock function.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Result of burning elapsed time against a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockReading {
    pub grace_left: Duration,
    pub reserve_left: Duration,
    /// Penalty cycles incurred by *this* burn (not a running total).
    pub penalty_cycles: u32,
}

/// Burns `elapsed` against a clock and returns what is left.
///
/// 1. Grace burns first.
/// 2. Then the reserve.
/// 3. When `elapsed` strictly exceeds `grace_left + reserve_left`, the
///    side is out of time: that instant counts one penalty cycle and
///    opens a fresh grace window. Every further full `grace_window` of
///    overflow counts another cycle. `grace_left` is what remains of the
///    current window.
///
/// The function has no hidden state, so burning `a` then `b` gives the
/// same total as burning `a + b` in one go (penalty cycles summed). That
/// is what lets the writer commit at arbitrary moments while spectators
/// recompute the same clock from the stored values.
///
/// ```rust
/// use std::time::Duration;
/// use draftkit_clock::reconcile;
///
/// let secs = Duration::from_secs;
/// // 30s grace, 10s reserve, 75s elapsed: 35s past exhaustion.
/// let r = reconcile(secs(30), secs(10), secs(75), secs(30));
/// assert_eq!(r.penalty_cycles, 2);
/// assert_eq!(r.reserve_left, Duration::ZERO);
/// assert_eq!(r.grace_left, secs(25));
/// ```
pub fn reconcile(
    grace_left: Duration,
    reserve_left: Duration,
    elapsed: Duration,
    grace_window: Duration,
) -> ClockReading {
    if elapsed <= grace_left {
        return ClockReading {
            grace_left: grace_left - elapsed,
            reserve_left,
            penalty_cycles: 0,
        };
    }

    let past_grace = elapsed - grace_left;
    if past_grace <= reserve_left {
        return ClockReading {
            grace_left: Duration::ZERO,
            reserve_left: reserve_left - past_grace,
            penalty_cycles: 0,
        };
    }

    let overflow = past_grace - reserve_left;
    let window = grace_window.as_nanos();
    if window == 0 {
        // Unvalidated config. Count the exhaustion once and stop there.
        return ClockReading {
            grace_left: Duration::ZERO,
            reserve_left: Duration::ZERO,
            penalty_cycles: 1,
        };
    }

    let overflow = overflow.as_nanos();
    let full_windows = overflow / window;
    let into_window = overflow % window;
    let cycles = u32::try_from(full_windows + 1).unwrap_or(u32::MAX);

    ClockReading {
        grace_left: grace_window - Duration::from_nanos(into_window as u64),
        reserve_left: Duration::ZERO,
        penalty_cycles: cycles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_reconcile_within_grace_burns_grace_only() {
        let r = reconcile(secs(30), secs(100), secs(12), secs(30));
        assert_eq!(r.grace_left, secs(18));
        assert_eq!(r.reserve_left, secs(100));
        assert_eq!(r.penalty_cycles, 0);
    }

    #[test]
    fn test_reconcile_past_grace_burns_reserve() {
        let r = reconcile(secs(30), secs(100), secs(50), secs(30));
        assert_eq!(r.grace_left, Duration::ZERO);
        assert_eq!(r.reserve_left, secs(80));
        assert_eq!(r.penalty_cycles, 0);
    }

    #[test]
    fn test_reconcile_exact_exhaustion_is_not_a_penalty() {
        let r = reconcile(secs(30), secs(100), secs(130), secs(30));
        assert_eq!(r.grace_left, Duration::ZERO);
        assert_eq!(r.reserve_left, Duration::ZERO);
        assert_eq!(r.penalty_cycles, 0);
    }

    #[test]
    fn test_reconcile_just_past_exhaustion_opens_fresh_window() {
        let r = reconcile(secs(30), secs(100), secs(131), secs(30));
        assert_eq!(r.penalty_cycles, 1);
        assert_eq!(r.grace_left, secs(29));
        assert_eq!(r.reserve_left, Duration::ZERO);
    }

    #[test]
    fn test_reconcile_counts_each_full_window() {
        // 95s of overflow with a 30s window: exhaustion + 3 full windows.
        let r = reconcile(secs(0), secs(0), secs(95), secs(30));
        assert_eq!(r.penalty_cycles, 4);
        assert_eq!(r.grace_left, secs(25));
    }

    #[test]
    fn test_reconcile_zero_window_does_not_divide_by_zero() {
        let r = reconcile(secs(0), secs(0), secs(10), Duration::ZERO);
        assert_eq!(r.penalty_cycles, 1);
        assert_eq!(r.grace_left, Duration::ZERO);
    }

    #[test]
    fn test_reconcile_zero_elapsed_is_identity() {
        let r = reconcile(secs(7), secs(9), Duration::ZERO, secs(30));
        assert_eq!(r.grace_left, secs(7));
        assert_eq!(r.reserve_left, secs(9));
        assert_eq!(r.penalty_cycles, 0);
    }
}
