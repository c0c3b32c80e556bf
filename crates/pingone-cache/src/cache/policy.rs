//! Freshness policy. Pure; no filesystem access.

use super::CacheEntry;

/// Default time-to-live (24 hours).
pub const DEFAULT_TTL_MS: u64 = 24 * 60 * 60 * 1000;

/// An entry written at `t` is fresh for reads strictly before `t + ttl`.
///
/// Missing entries and entries without a timestamp are always expired.
/// A timestamp in the future (clock skew) counts as fresh.
pub fn is_expired(entry: Option<&CacheEntry>, ttl_ms: u64, now_ms: i64) -> bool {
    let Some(written_at) = entry.and_then(|e| e.timestamp) else {
        return true;
    };
    let ttl_ms = i64::try_from(ttl_ms).unwrap_or(i64::MAX);
    now_ms.saturating_sub(written_at) >= ttl_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_at(timestamp: Option<i64>) -> CacheEntry {
        CacheEntry {
            value: serde_json::json!("pop-123"),
            timestamp,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_absent_entry_is_expired() {
        assert!(is_expired(None, DEFAULT_TTL_MS, 0));
    }

    #[test]
    fn test_entry_without_timestamp_is_expired() {
        assert!(is_expired(Some(&entry_at(None)), DEFAULT_TTL_MS, 0));
    }

    #[test]
    fn test_ttl_boundary() {
        let t = 1_700_000_000_000;
        let ttl = 1_000;
        let entry = entry_at(Some(t));
        assert!(!is_expired(Some(&entry), ttl, t));
        assert!(!is_expired(Some(&entry), ttl, t + 999));
        assert!(is_expired(Some(&entry), ttl, t + 1_000));
        assert!(is_expired(Some(&entry), ttl, t + 5_000));
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        let entry = entry_at(Some(10_000));
        assert!(!is_expired(Some(&entry), 100, 5_000));
    }

    #[test]
    fn test_zero_ttl_is_always_expired() {
        let entry = entry_at(Some(5));
        assert!(is_expired(Some(&entry), 0, 5));
    }

    #[test]
    fn test_default_ttl_is_one_day() {
        assert_eq!(DEFAULT_TTL_MS, 86_400_000);
    }
}
