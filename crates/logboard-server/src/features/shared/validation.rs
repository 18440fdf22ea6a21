//! Date-range validation
//!
//! Dashboards and searches accept an optional date range that is clamped,
//! never rejected: a missing range defaults to the last `default_hours`
//! hours, end dates in the future clamp to now, and spans wider than
//! `max_days` clamp the start forward.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Raw, unvalidated range as received from the client
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DateRangeQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

/// A validated, closed date range with `start <= end <= now`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Minutes covered by the range, never less than 1 so per-minute rates
    /// cannot divide by zero.
    pub fn elapsed_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes().max(1)
    }
}

/// Clamp a raw range into a valid one.
///
/// Rules, applied in order:
/// 1. missing end defaults to `now`; a future end clamps to `now`
/// 2. missing start defaults to `end - default_hours`
/// 3. start after end resets to `end - default_hours`
/// 4. spans wider than `max_days` clamp the start to `end - max_days`
pub fn validate_range(
    query: DateRangeQuery,
    now: DateTime<Utc>,
    max_days: i64,
    default_hours: i64,
) -> DateRange {
    let end = match query.end_time {
        Some(end) if end <= now => end,
        _ => now,
    };

    let default_start = end - Duration::hours(default_hours);
    let start = match query.start_time {
        Some(start) if start <= end => start,
        _ => default_start,
    };

    let max_span = Duration::days(max_days);
    let start = if end - start > max_span { end - max_span } else { start };

    DateRange { start, end }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_range_defaults_to_last_day() {
        let range = validate_range(DateRangeQuery::default(), now(), 90, 24);
        assert_eq!(range.end, now());
        assert_eq!(range.start, now() - Duration::hours(24));
    }

    #[test]
    fn test_future_end_clamps_to_now() {
        let query = DateRangeQuery {
            start_time: None,
            end_time: Some(now() + Duration::days(3)),
        };
        let range = validate_range(query, now(), 90, 24);
        assert_eq!(range.end, now());
    }

    #[test]
    fn test_start_after_end_resets() {
        let query = DateRangeQuery {
            start_time: Some(now() + Duration::hours(5)),
            end_time: Some(now()),
        };
        let range = validate_range(query, now(), 90, 24);
        assert_eq!(range.start, now() - Duration::hours(24));
        assert_eq!(range.end, now());
    }

    #[test]
    fn test_span_clamped_to_max_days() {
        let query = DateRangeQuery {
            start_time: Some(now() - Duration::days(365)),
            end_time: Some(now()),
        };
        let range = validate_range(query, now(), 90, 24);
        assert_eq!(range.start, now() - Duration::days(90));
    }

    #[test]
    fn test_valid_range_passes_through() {
        let start = now() - Duration::days(7);
        let query = DateRangeQuery {
            start_time: Some(start),
            end_time: Some(now()),
        };
        let range = validate_range(query, now(), 90, 24);
        assert_eq!(range.start, start);
        assert_eq!(range.end, now());
    }

    #[test]
    fn test_elapsed_minutes_minimum() {
        let range = DateRange {
            start: now(),
            end: now(),
        };
        assert_eq!(range.elapsed_minutes(), 1);

        let range = DateRange {
            start: now() - Duration::hours(2),
            end: now(),
        };
        assert_eq!(range.elapsed_minutes(), 120);
    }
}
