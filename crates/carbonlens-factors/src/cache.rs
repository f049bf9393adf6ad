//! Time-bounded cache of resolved factors
//!
//! Misses are cached too, so a catalog that has nothing for a key is not
//! queried again until the entry expires.

use carbonlens_domain::ResolvedFactor;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Option<ResolvedFactor>,
    expires_at: Instant,
}

/// Thread-safe factor cache with per-entry TTL
#[derive(Debug, Default)]
pub struct FactorCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl FactorCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for a key
    ///
    /// Returns `None` when the key is absent or expired, `Some(None)` for a
    /// cached miss.
    pub fn get(&self, key: &str) -> Option<Option<ResolvedFactor>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value (or a miss) for `ttl`
    ///
    /// Expired entries are pruned first, so keys that are never read again
    /// do not accumulate.
    pub fn insert(&self, key: impl Into<String>, value: Option<ResolvedFactor>, ttl: Duration) {
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            expires_at: now + ttl,
        };
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(key.into(), entry);
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Number of entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbonlens_domain::FactorOrigin;

    fn factor(value: f64) -> ResolvedFactor {
        ResolvedFactor {
            value,
            unit: "kg CO2e/kWh".to_string(),
            uncertainty_pct: 5.0,
            source: "TEST".to_string(),
            origin: FactorOrigin::Default,
            warning: None,
        }
    }

    #[test]
    fn test_hit_and_miss() {
        let cache = FactorCache::new();
        assert_eq!(cache.get("a"), None);

        cache.insert("a", Some(factor(1.0)), Duration::from_secs(60));
        cache.insert("b", None, Duration::from_secs(60));

        assert_eq!(cache.get("a").unwrap().unwrap().value, 1.0);
        assert_eq!(cache.get("b"), Some(None));
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = FactorCache::new();
        cache.insert("a", Some(factor(1.0)), Duration::ZERO);

        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty(), "expired entry is evicted on read");
    }

    #[test]
    fn test_insert_prunes_expired_entries() {
        let cache = FactorCache::new();
        for key in ["fuel:diesel:US", "fuel:petrol:GB", "grid:DE"] {
            cache.insert(key, Some(factor(1.0)), Duration::ZERO);
        }
        cache.insert("grid:FR", Some(factor(0.05)), Duration::from_secs(60));

        assert_eq!(cache.len(), 1, "stale keys are dropped without being read");
        assert_eq!(cache.get("grid:FR").unwrap().unwrap().value, 0.05);
    }

    #[test]
    fn test_clear() {
        let cache = FactorCache::new();
        cache.insert("a", Some(factor(1.0)), Duration::from_secs(60));
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
