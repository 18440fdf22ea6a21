//! Dashboard result cache
//!
//! Expensive dashboard aggregations are cached for a short TTL. Keys are a
//! SHA-256 digest over the dashboard kind and the date range rounded down
//! to the minute, so repeated polls inside the same minute share one
//! computation. There is no invalidation protocol beyond expiry; expired
//! entries are evicted lazily on access and by a periodic sweep.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use dashmap::DashMap;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry {
    inserted_at: Instant,
    payload: JsonValue,
}

/// TTL cache for dashboard payloads
pub struct DashboardCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl DashboardCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Cache key for a dashboard kind and date range.
    ///
    /// Timestamps are rounded down to the minute before hashing so that
    /// "now"-relative ranges produced milliseconds apart hit the same
    /// entry.
    pub fn key(kind: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
        let minute = TimeDelta::minutes(1);
        let start = start.duration_trunc(minute).unwrap_or(start);
        let end = end.duration_trunc(minute).unwrap_or(end);

        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        hasher.update(start.timestamp().to_be_bytes());
        hasher.update(end.timestamp().to_be_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Fetch a fresh entry, evicting it if expired.
    pub fn get(&self, key: &str) -> Option<JsonValue> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.payload.clone());
            },
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: String, payload: JsonValue) {
        self.entries.insert(
            key,
            CacheEntry {
                inserted_at: Instant::now(),
                payload,
            },
        );
    }

    /// Drop expired entries (call from a background task).
    pub fn sweep(&self) {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "Swept expired dashboard cache entries");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_key_rounds_to_minute() {
        let start = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 5).unwrap();
        let start_later = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 55).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 15, 13, 0, 0).unwrap();

        assert_eq!(
            DashboardCache::key("audit", start, end),
            DashboardCache::key("audit", start_later, end)
        );
    }

    #[test]
    fn test_key_differs_by_kind() {
        let start = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 15, 13, 0, 0).unwrap();

        assert_ne!(
            DashboardCache::key("audit", start, end),
            DashboardCache::key("logs", start, end)
        );
    }

    #[test]
    fn test_get_insert_round_trip() {
        let cache = DashboardCache::new(Duration::from_secs(60));
        let key = "k".to_string();

        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), json!({"total": 3}));
        assert_eq!(cache.get(&key), Some(json!({"total": 3})));
    }

    #[test]
    fn test_expired_entry_evicted() {
        let cache = DashboardCache::new(Duration::from_millis(0));
        cache.insert("k".to_string(), json!(1));

        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sweep_drops_expired() {
        let cache = DashboardCache::new(Duration::from_millis(0));
        cache.insert("a".to_string(), json!(1));
        cache.insert("b".to_string(), json!(2));

        cache.sweep();
        assert_eq!(cache.len(), 0);
    }
}
