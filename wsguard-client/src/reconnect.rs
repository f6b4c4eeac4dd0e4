//! Backoff computation for reconnection attempts
//!
//! Two flavours, selected by `speed_up`:
//!
//! - **Linear shrink** (`speed_up = true`): the wait is
//!   `reconnect_interval × (max − attempts) / max`, so retries get faster as
//!   the budget nears exhaustion. A near-exhausted budget probes eagerly one
//!   last time before giving up.
//! - **Constant** (`speed_up = false`): every wait equals
//!   `reconnect_interval`.
//!
//! An unlimited budget (`max_reconnection_num = -1`) has nothing to shrink
//! against, so it always waits the constant `reconnect_interval`.
//!
//! Fast-path attempts (send-while-closed, failed initial open) do not go
//! through this computation at all; they use [`FAST_RETRY`], a deliberately
//! tiny "retry almost immediately" delay unrelated to the configured
//! backoff.

use std::time::Duration;

/// Delay before a fast-path reconnection attempt
///
/// Distinct from the computed backoff: fast-path attempts mean "the failure
/// was likely transient, retry now", not a scheduled backoff step.
pub const FAST_RETRY: Duration = Duration::from_millis(16);

/// Compute the wait before the next scheduled reconnection attempt
///
/// `attempts_made` counts attempts since the last successful stabilization,
/// including the one that just failed.
pub fn next_delay(
    reconnect_interval: Duration,
    speed_up: bool,
    max_reconnection_num: i32,
    attempts_made: u32,
) -> Duration {
    if !speed_up || max_reconnection_num < 0 {
        return reconnect_interval;
    }
    let max = max_reconnection_num as u32;
    if max == 0 {
        return Duration::ZERO;
    }
    let remaining = max.saturating_sub(attempts_made);
    Duration::from_secs_f64(reconnect_interval.as_secs_f64() * remaining as f64 / max as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_shrink_scenario() {
        // max 3, base 1000ms: three failures wait 666ms, 333ms, 0ms
        let base = Duration::from_millis(1000);
        let d1 = next_delay(base, true, 3, 1);
        let d2 = next_delay(base, true, 3, 2);
        let d3 = next_delay(base, true, 3, 3);

        assert!((d1.as_millis() as i64 - 666).abs() <= 1);
        assert!((d2.as_millis() as i64 - 333).abs() <= 1);
        assert_eq!(d3, Duration::ZERO);
    }

    #[test]
    fn test_monotonically_non_increasing() {
        let base = Duration::from_millis(2000);
        let max = 10;
        let mut previous = next_delay(base, true, max, 0);
        assert_eq!(previous, base);
        for attempts in 1..=max as u32 {
            let delay = next_delay(base, true, max, attempts);
            assert!(delay <= previous);
            previous = delay;
        }
        // Zero only once the budget is exhausted
        assert_eq!(previous, Duration::ZERO);
        assert!(next_delay(base, true, max, max as u32 - 1) > Duration::ZERO);
    }

    #[test]
    fn test_constant_when_not_speeding_up() {
        let base = Duration::from_millis(750);
        for attempts in 0..20 {
            assert_eq!(next_delay(base, false, 5, attempts), base);
        }
    }

    #[test]
    fn test_unlimited_budget_is_constant() {
        let base = Duration::from_millis(500);
        for attempts in 0..100 {
            assert_eq!(next_delay(base, true, -1, attempts), base);
        }
    }

    #[test]
    fn test_past_budget_saturates_at_zero() {
        let base = Duration::from_millis(1000);
        assert_eq!(next_delay(base, true, 3, 4), Duration::ZERO);
        assert_eq!(next_delay(base, true, 3, 100), Duration::ZERO);
    }

    #[test]
    fn test_fast_retry_is_tiny() {
        assert!(FAST_RETRY < Duration::from_millis(100));
    }
}
