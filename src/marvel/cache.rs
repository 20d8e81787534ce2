//! Response cache with TTL-based expiration.
//!
//! The catalog data changes rarely; identical queries within the TTL
//! window are served from memory instead of re-hitting the gateway.

use dashmap::DashMap;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache entry with TTL.
#[derive(Clone)]
struct CacheEntry {
    value: Value,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn new(value: Value, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// Cache of raw catalog API responses keyed by path + query filters.
/// Auth parameters are not part of the key.
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl ResponseCache {
    /// Create a new response cache with the specified TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl: ttl,
        }
    }

    /// Get a cached response body.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                debug!("Cache hit: {}", key);
                return Some(entry.value.clone());
            }
            drop(entry);
            self.entries.remove(key);
        }
        None
    }

    /// Cache a response body.
    pub fn put(&self, key: impl Into<String>, value: Value) {
        self.entries
            .insert(key.into(), CacheEntry::new(value, self.default_ttl));
    }

    /// Clear all cache entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove expired entries.
    pub fn cleanup(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_basic() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.put("characters?name=Hulk", serde_json::json!({"code": 200}));

        let cached = cache.get("characters?name=Hulk");
        assert_eq!(cached.unwrap()["code"], 200);
        assert!(cache.get("characters?name=Thor").is_none());
    }

    #[test]
    fn test_cache_expiry() {
        let cache = ResponseCache::new(Duration::from_millis(1));
        cache.put("comics", serde_json::json!({}));

        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get("comics").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cleanup_drops_expired() {
        let cache = ResponseCache::new(Duration::from_millis(1));
        cache.put("a", serde_json::json!(1));
        cache.put("b", serde_json::json!(2));

        std::thread::sleep(Duration::from_millis(10));
        cache.cleanup();
        assert_eq!(cache.len(), 0);
    }
}
