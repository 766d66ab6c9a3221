//! Wall-clock helpers.
//!
//! All persisted timestamps are epoch milliseconds (`i64`); every derived
//! computation (staleness, message status) takes `now` as a parameter so it
//! stays a pure function of its inputs.

use chrono::Utc;

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Whether a timestamped record is too old to count as live.
///
/// Strictly-greater comparison: a record exactly `threshold` old is still
/// considered fresh.
pub fn is_stale(last_active: i64, now: i64, threshold_ms: i64) -> bool {
    now - last_active > threshold_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staleness_boundary() {
        let threshold = 120_000;
        let now = 1_700_000_000_000;
        assert!(is_stale(now - (threshold + 1), now, threshold));
        assert!(!is_stale(now - (threshold - 1), now, threshold));
        assert!(!is_stale(now - threshold, now, threshold));
    }

    #[test]
    fn future_timestamps_are_fresh() {
        // Clock skew between clients can put last_active ahead of now.
        assert!(!is_stale(2_000, 1_000, 500));
    }
}
