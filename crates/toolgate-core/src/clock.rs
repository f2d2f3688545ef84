//! Overflow-safe instant arithmetic

use std::time::Duration;
use tokio::time::Instant;

/// Thirty years, the same stand-in for "never" that tokio uses internally
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `start + after`, clamped so that huge durations such as `Duration::MAX`
/// mean "effectively never" instead of overflowing `Instant`.
pub(crate) fn deadline_after(start: Instant, after: Duration) -> Instant {
    let after = after.min(FAR_FUTURE);
    // A monotonic clock is never within thirty years of its own limit
    start.checked_add(after).unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_durations_are_exact() {
        let start = Instant::now();
        assert_eq!(
            deadline_after(start, Duration::from_millis(250)),
            start + Duration::from_millis(250)
        );
    }

    #[test]
    fn test_max_duration_clamps_to_far_future() {
        let start = Instant::now();
        let deadline = deadline_after(start, Duration::MAX);
        assert_eq!(deadline.duration_since(start), FAR_FUTURE);
    }
}
