//! In-process cache store with LRU eviction.
//!
//! Mirrors the Redis backend's observable behavior so the two are
//! interchangeable behind [`CacheStore`]:
//! - TTL expiry is lazy (an expired entry reads as absent),
//! - storing an empty field set clears the entry instead of keeping an
//!   empty hash,
//! - subject keys are tracked per (kind, season) for pattern deletion.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use leaguesync_core::cache::{
    is_subject_key, key_namespace, pattern_matches, CacheStore, RecordSet, Result,
};

#[derive(Debug, Clone)]
struct CacheEntry {
    fields: RecordSet,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(fields: RecordSet, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        Self { fields, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

/// In-memory cache store with LRU eviction and lazy TTL expiry.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
    /// Subject keys by (kind, season), for pattern deletion.
    tracking: Arc<RwLock<HashMap<(String, String), HashSet<String>>>>,
}

impl MemoryCache {
    /// Creates a new in-memory cache.
    ///
    /// # Panics
    ///
    /// Panics if `max_entries` is 0.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).expect("max_entries must be > 0");
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
            tracking: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn untrack(&self, key: &str) {
        if let Some((kind, season)) = key_namespace(key) {
            let mut tracking = self.tracking.write().await;
            if let Some(keys) = tracking.get_mut(&(kind.to_string(), season.to_string())) {
                keys.remove(key);
            }
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get_all(&self, key: &str) -> Result<Option<RecordSet>> {
        let mut store = self.store.write().await;
        match store.get(key) {
            // Lazy expiry: leave the entry for the LRU to evict.
            Some(entry) if entry.is_expired() => Ok(None),
            Some(entry) => Ok(Some(entry.fields.clone())),
            None => Ok(None),
        }
    }

    async fn set_all(
        &self,
        key: &str,
        fields: &RecordSet,
        ttl: Option<Duration>,
    ) -> Result<()> {
        if fields.is_empty() {
            return self.delete(key).await;
        }

        {
            let mut store = self.store.write().await;
            store.put(key.to_string(), CacheEntry::new(fields.clone(), ttl));
        }

        if is_subject_key(key) {
            if let Some((kind, season)) = key_namespace(key) {
                let mut tracking = self.tracking.write().await;
                tracking
                    .entry((kind.to_string(), season.to_string()))
                    .or_default()
                    .insert(key.to_string());
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        {
            let mut store = self.store.write().await;
            store.pop(key);
        }
        if is_subject_key(key) {
            self.untrack(key).await;
        }
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        // Only namespaced subject keys are tracked; other patterns are
        // no-ops, as in the Redis backend.
        let Some((kind, season)) = key_namespace(pattern) else {
            return Ok(());
        };

        let matching: Vec<String> = {
            let tracking = self.tracking.read().await;
            tracking
                .get(&(kind.to_string(), season.to_string()))
                .map(|keys| {
                    keys.iter()
                        .filter(|k| pattern_matches(pattern, k))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        for key in matching {
            self.delete(&key).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> RecordSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[tokio::test]
    async fn test_set_and_get_roundtrip() {
        let cache = MemoryCache::new(16);
        let value = fields(&[("1:10", "{\"points\":61}"), ("2:10", "{\"points\":48}")]);

        cache.set_all("gw_points::2425", &value, None).await.unwrap();

        assert_eq!(cache.get_all("gw_points::2425").await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn test_get_absent_key() {
        let cache = MemoryCache::new(16);
        assert_eq!(cache.get_all("gw_points::2425").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_is_full_overwrite_not_merge() {
        let cache = MemoryCache::new(16);
        cache
            .set_all("gw_points::2425", &fields(&[("1:10", "a"), ("2:10", "b")]), None)
            .await
            .unwrap();
        cache
            .set_all("gw_points::2425", &fields(&[("3:10", "c")]), None)
            .await
            .unwrap();

        let stored = cache.get_all("gw_points::2425").await.unwrap().unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored.contains_key("3:10"));
    }

    #[tokio::test]
    async fn test_empty_set_clears_the_entry() {
        let cache = MemoryCache::new(16);
        cache
            .set_all("gw_points::2425", &fields(&[("1:10", "a")]), None)
            .await
            .unwrap();
        cache
            .set_all("gw_points::2425", &RecordSet::new(), None)
            .await
            .unwrap();

        assert_eq!(cache.get_all("gw_points::2425").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ttl_expiry_reads_as_absent() {
        let cache = MemoryCache::new(16);
        cache
            .set_all(
                "gw_points::2425",
                &fields(&[("1:10", "a")]),
                Some(Duration::from_millis(20)),
            )
            .await
            .unwrap();

        assert!(cache.get_all("gw_points::2425").await.unwrap().is_some());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get_all("gw_points::2425").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new(16);
        cache
            .set_all("gw_points::2425::1042", &fields(&[("1042:10", "a")]), None)
            .await
            .unwrap();
        cache.delete("gw_points::2425::1042").await.unwrap();
        assert_eq!(cache.get_all("gw_points::2425::1042").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_pattern_removes_subject_keys_only() {
        let cache = MemoryCache::new(16);
        cache
            .set_all("gw_points::2425", &fields(&[("1:10", "a")]), None)
            .await
            .unwrap();
        cache
            .set_all("gw_points::2425::1", &fields(&[("1:10", "a")]), None)
            .await
            .unwrap();
        cache
            .set_all("gw_points::2425::2", &fields(&[("2:10", "b")]), None)
            .await
            .unwrap();
        cache
            .set_all("standing::2425::1", &fields(&[("1", "c")]), None)
            .await
            .unwrap();

        cache.delete_pattern("gw_points::2425::*").await.unwrap();

        assert!(cache.get_all("gw_points::2425").await.unwrap().is_some());
        assert_eq!(cache.get_all("gw_points::2425::1").await.unwrap(), None);
        assert_eq!(cache.get_all("gw_points::2425::2").await.unwrap(), None);
        assert!(cache.get_all("standing::2425::1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_pattern_without_namespace_is_noop() {
        let cache = MemoryCache::new(16);
        cache
            .set_all("gw_points::2425::1", &fields(&[("1:10", "a")]), None)
            .await
            .unwrap();
        cache.delete_pattern("*").await.unwrap();
        assert!(cache.get_all("gw_points::2425::1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_lru_eviction_respects_capacity() {
        let cache = MemoryCache::new(2);
        cache.set_all("a::1", &fields(&[("1", "a")]), None).await.unwrap();
        cache.set_all("b::1", &fields(&[("1", "b")]), None).await.unwrap();
        cache.set_all("c::1", &fields(&[("1", "c")]), None).await.unwrap();

        // Oldest entry evicted.
        assert_eq!(cache.get_all("a::1").await.unwrap(), None);
        assert!(cache.get_all("c::1").await.unwrap().is_some());
    }
}
