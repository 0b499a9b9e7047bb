//! Cached repository decorator.
//!
//! Wraps a `Repository` implementation with the cache-aside pattern:
//! - **Reads**: check the cache first; on a miss or an unreadable entry,
//!   fetch from the repository and repopulate the cache.
//! - **Writes**: persist to the repository first, then repopulate the
//!   affected cache keys from the just-persisted repository state, never
//!   from the incoming batch. Under `SkipIfExists` the batch may contain
//!   payloads the repository rejected; only the repository knows what is
//!   authoritative.
//!
//! Cache failures on either path degrade to repository reads; they are
//! logged and swallowed. Repository failures always propagate.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use leaguesync_core::cache::{
    decode_record_set, encode_record_set, record_set_key, subject_keys_pattern, subject_set_key,
    CacheStore, RecordSet,
};
use leaguesync_core::record::{NaturalKey, Season, SubjectId, SyncRecord};
use leaguesync_core::storage::{Repository, Result};

/// Cache-aside decorator over any repository backend.
pub struct CachedRepository<T: SyncRecord> {
    repository: Arc<dyn Repository<T>>,
    cache: Arc<dyn CacheStore>,
    season: Season,
    ttl: Duration,
}

impl<T: SyncRecord> CachedRepository<T> {
    /// Creates a new cached repository.
    ///
    /// `ttl` bounds how long a cached record set is served before the next
    /// read falls through to the repository again.
    pub fn new(
        repository: Arc<dyn Repository<T>>,
        cache: Arc<dyn CacheStore>,
        season: Season,
        ttl: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            season,
            ttl,
        }
    }

    /// Attempts a cache read. Cache errors and undecodable entries are both
    /// treated as misses; an absent key is `None`, never an empty set.
    async fn read_cache(&self, key: &str) -> Option<Vec<T>> {
        let fields = match self.cache.get_all(key).await {
            Ok(Some(fields)) => fields,
            Ok(None) => {
                tracing::trace!(cache_key = %key, "Cache miss");
                return None;
            }
            Err(err) => {
                tracing::warn!(cache_key = %key, error = %err, "Cache read failed");
                return None;
            }
        };

        match decode_record_set(&fields) {
            Ok(records) => {
                tracing::trace!(cache_key = %key, count = records.len(), "Cache hit");
                Some(records)
            }
            Err(err) => {
                tracing::warn!(cache_key = %key, error = %err, "Cache entry undecodable, treating as miss");
                None
            }
        }
    }

    /// Repopulates one cache key from authoritative records.
    async fn populate_cache(&self, key: &str, records: &[T]) {
        let fields: RecordSet = match encode_record_set(records) {
            Ok(fields) => fields,
            Err(err) => {
                tracing::warn!(cache_key = %key, error = %err, "Failed to encode records for cache");
                return;
            }
        };

        if let Err(err) = self.cache.set_all(key, &fields, Some(self.ttl)).await {
            tracing::warn!(cache_key = %key, error = %err, "Failed to populate cache");
        }
    }

    /// Refreshes the full-set key and every touched subject key from the
    /// repository after a write.
    async fn refresh_after_write(&self, subjects: &BTreeSet<SubjectId>) -> Result<()> {
        let all = self.repository.find_all().await?;
        self.populate_cache(&record_set_key(T::KIND, &self.season), &all)
            .await;

        for &subject in subjects {
            let rows = self.repository.find_by_subject(subject).await?;
            self.populate_cache(&subject_set_key(T::KIND, &self.season, subject), &rows)
                .await;
        }

        Ok(())
    }

    async fn invalidate(&self, key: &str) {
        if let Err(err) = self.cache.delete(key).await {
            tracing::warn!(cache_key = %key, error = %err, "Failed to invalidate cache");
        }
    }
}

#[async_trait]
impl<T: SyncRecord> Repository<T> for CachedRepository<T> {
    /// The idempotency guard reads the repository directly. Going through
    /// the cache here would let a stale entry defeat the guard.
    async fn find_existing(&self, key: &NaturalKey) -> Result<Option<T>> {
        self.repository.find_existing(key).await
    }

    async fn find_all(&self) -> Result<Vec<T>> {
        let cache_key = record_set_key(T::KIND, &self.season);

        if let Some(records) = self.read_cache(&cache_key).await {
            return Ok(records);
        }

        let records = self.repository.find_all().await?;
        self.populate_cache(&cache_key, &records).await;

        Ok(records)
    }

    async fn find_by_subject(&self, subject: SubjectId) -> Result<Vec<T>> {
        let cache_key = subject_set_key(T::KIND, &self.season, subject);

        if let Some(records) = self.read_cache(&cache_key).await {
            return Ok(records);
        }

        let records = self.repository.find_by_subject(subject).await?;
        self.populate_cache(&cache_key, &records).await;

        Ok(records)
    }

    async fn batch_upsert(&self, records: &[T]) -> Result<usize> {
        let written = self.repository.batch_upsert(records).await?;

        let subjects: BTreeSet<SubjectId> = records.iter().map(|r| r.subject_id()).collect();
        self.refresh_after_write(&subjects).await?;

        Ok(written)
    }

    async fn delete_all(&self) -> Result<usize> {
        let removed = self.repository.delete_all().await?;

        self.invalidate(&record_set_key(T::KIND, &self.season)).await;
        let pattern = subject_keys_pattern(T::KIND, &self.season);
        if let Err(err) = self.cache.delete_pattern(&pattern).await {
            tracing::warn!(%pattern, error = %err, "Failed to invalidate subject keys");
        }

        Ok(removed)
    }

    async fn delete_by_subject(&self, subject: SubjectId) -> Result<usize> {
        let removed = self.repository.delete_by_subject(subject).await?;

        self.invalidate(&subject_set_key(T::KIND, &self.season, subject))
            .await;
        // The full set contained this subject's rows too.
        self.invalidate(&record_set_key(T::KIND, &self.season)).await;

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::RwLock;

    use serde::{Deserialize, Serialize};

    use leaguesync_core::cache::{pattern_matches, Result as CacheResult};
    use leaguesync_core::record::{SecondaryKey, WritePolicy};
    use leaguesync_core::storage::RepositoryError;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Score {
        entry: SubjectId,
        event: u32,
        points: i32,
    }

    impl SyncRecord for Score {
        const KIND: &'static str = "score";
        const WRITE_POLICY: WritePolicy = WritePolicy::SkipIfExists;

        fn subject_id(&self) -> SubjectId {
            self.entry
        }

        fn secondary_key(&self) -> Option<SecondaryKey> {
            Some(SecondaryKey::from(self.event))
        }
    }

    fn score(entry: i64, event: u32, points: i32) -> Score {
        Score {
            entry: SubjectId(entry),
            event,
            points,
        }
    }

    // Mock repository that tracks calls.
    struct MockRepository {
        rows: RwLock<HashMap<NaturalKey, Score>>,
        find_all_calls: AtomicUsize,
        find_by_subject_calls: AtomicUsize,
        fail_reads: AtomicBool,
    }

    impl MockRepository {
        fn new() -> Self {
            Self {
                rows: RwLock::new(HashMap::new()),
                find_all_calls: AtomicUsize::new(0),
                find_by_subject_calls: AtomicUsize::new(0),
                fail_reads: AtomicBool::new(false),
            }
        }

        async fn insert(&self, record: Score) {
            self.rows.write().await.insert(record.natural_key(), record);
        }
    }

    #[async_trait]
    impl Repository<Score> for MockRepository {
        async fn find_existing(&self, key: &NaturalKey) -> Result<Option<Score>> {
            Ok(self.rows.read().await.get(key).cloned())
        }

        async fn find_all(&self) -> Result<Vec<Score>> {
            self.find_all_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(RepositoryError::QueryFailed("simulated".to_string()));
            }
            let mut rows: Vec<Score> = self.rows.read().await.values().cloned().collect();
            rows.sort_by_key(|r| (r.entry, r.event));
            Ok(rows)
        }

        async fn find_by_subject(&self, subject: SubjectId) -> Result<Vec<Score>> {
            self.find_by_subject_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(RepositoryError::QueryFailed("simulated".to_string()));
            }
            let mut rows: Vec<Score> = self
                .rows
                .read()
                .await
                .values()
                .filter(|r| r.entry == subject)
                .cloned()
                .collect();
            rows.sort_by_key(|r| r.event);
            Ok(rows)
        }

        async fn batch_upsert(&self, records: &[Score]) -> Result<usize> {
            let mut rows = self.rows.write().await;
            let mut written = 0;
            for record in records {
                let key = record.natural_key();
                if !rows.contains_key(&key) {
                    rows.insert(key, record.clone());
                    written += 1;
                }
            }
            Ok(written)
        }

        async fn delete_all(&self) -> Result<usize> {
            let mut rows = self.rows.write().await;
            let removed = rows.len();
            rows.clear();
            Ok(removed)
        }

        async fn delete_by_subject(&self, subject: SubjectId) -> Result<usize> {
            let mut rows = self.rows.write().await;
            let before = rows.len();
            rows.retain(|key, _| key.subject != subject);
            Ok(before - rows.len())
        }
    }

    // Mock cache with direct access to the stored hashes.
    struct MockCache {
        store: RwLock<HashMap<String, RecordSet>>,
        fail_writes: AtomicBool,
    }

    impl MockCache {
        fn new() -> Self {
            Self {
                store: RwLock::new(HashMap::new()),
                fail_writes: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl CacheStore for MockCache {
        async fn get_all(&self, key: &str) -> CacheResult<Option<RecordSet>> {
            Ok(self.store.read().await.get(key).cloned())
        }

        async fn set_all(
            &self,
            key: &str,
            fields: &RecordSet,
            _ttl: Option<Duration>,
        ) -> CacheResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(leaguesync_core::cache::CacheError::OperationFailed(
                    "simulated".to_string(),
                ));
            }
            let mut store = self.store.write().await;
            if fields.is_empty() {
                store.remove(key);
            } else {
                store.insert(key.to_string(), fields.clone());
            }
            Ok(())
        }

        async fn delete(&self, key: &str) -> CacheResult<()> {
            self.store.write().await.remove(key);
            Ok(())
        }

        async fn delete_pattern(&self, pattern: &str) -> CacheResult<()> {
            let mut store = self.store.write().await;
            store.retain(|key, _| !pattern_matches(pattern, key));
            Ok(())
        }
    }

    fn cached(
        repo: &Arc<MockRepository>,
        cache: &Arc<MockCache>,
    ) -> CachedRepository<Score> {
        CachedRepository::new(
            repo.clone(),
            cache.clone(),
            Season::new("2425"),
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn test_find_all_miss_populates_cache() {
        let repo = Arc::new(MockRepository::new());
        repo.insert(score(1, 10, 61)).await;
        repo.insert(score(2, 10, 48)).await;
        let cache = Arc::new(MockCache::new());
        let cached = cached(&repo, &cache);

        let records = cached.find_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(repo.find_all_calls.load(Ordering::SeqCst), 1);

        let stored = cache.store.read().await;
        let fields = stored.get("score::2425").unwrap();
        assert!(fields.contains_key("1:10"));
        assert!(fields.contains_key("2:10"));
    }

    #[tokio::test]
    async fn test_find_all_hit_skips_repository() {
        let repo = Arc::new(MockRepository::new());
        repo.insert(score(1, 10, 61)).await;
        let cache = Arc::new(MockCache::new());
        let cached = cached(&repo, &cache);

        let _ = cached.find_all().await.unwrap();
        assert_eq!(repo.find_all_calls.load(Ordering::SeqCst), 1);

        let records = cached.find_all().await.unwrap();
        assert_eq!(records, vec![score(1, 10, 61)]);
        assert_eq!(repo.find_all_calls.load(Ordering::SeqCst), 1); // Still 1
    }

    #[tokio::test]
    async fn test_undecodable_entry_treated_as_miss() {
        let repo = Arc::new(MockRepository::new());
        repo.insert(score(1, 10, 61)).await;
        let cache = Arc::new(MockCache::new());
        let cached = cached(&repo, &cache);

        // Poison the cache with a field that no longer parses.
        let mut fields = RecordSet::new();
        fields.insert("1:10".to_string(), b"not json".to_vec());
        cache.set_all("score::2425", &fields, None).await.unwrap();

        let records = cached.find_all().await.unwrap();
        assert_eq!(records, vec![score(1, 10, 61)]);
        assert_eq!(repo.find_all_calls.load(Ordering::SeqCst), 1);

        // The poisoned entry was healed from the repository.
        let stored = cache.store.read().await;
        let healed = stored.get("score::2425").unwrap();
        assert!(serde_json::from_slice::<Score>(&healed["1:10"]).is_ok());
    }

    #[tokio::test]
    async fn test_repository_read_errors_propagate() {
        let repo = Arc::new(MockRepository::new());
        repo.fail_reads.store(true, Ordering::SeqCst);
        let cache = Arc::new(MockCache::new());
        let cached = cached(&repo, &cache);

        // An unreadable cache never masks a repository failure as empty.
        let result = cached.find_all().await;
        assert!(matches!(result, Err(RepositoryError::QueryFailed(_))));
    }

    #[tokio::test]
    async fn test_cache_write_failure_degrades_to_repository() {
        let repo = Arc::new(MockRepository::new());
        repo.insert(score(1, 10, 61)).await;
        let cache = Arc::new(MockCache::new());
        cache.fail_writes.store(true, Ordering::SeqCst);
        let cached = cached(&repo, &cache);

        // Reads still succeed, they just hit the repository every time.
        assert_eq!(cached.find_all().await.unwrap().len(), 1);
        assert_eq!(cached.find_all().await.unwrap().len(), 1);
        assert_eq!(repo.find_all_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_batch_upsert_repopulates_from_repository() {
        let repo = Arc::new(MockRepository::new());
        repo.insert(score(1, 10, 61)).await;
        let cache = Arc::new(MockCache::new());
        let cached = cached(&repo, &cache);

        // The batch carries a conflicting payload that the repository's
        // skip-if-exists policy will reject.
        let written = cached
            .batch_upsert(&[score(1, 10, 99), score(2, 10, 48)])
            .await
            .unwrap();
        assert_eq!(written, 1);

        // The cache reflects repository truth, not the incoming batch.
        let stored = cache.store.read().await;
        let fields = stored.get("score::2425").unwrap();
        let kept: Score = serde_json::from_slice(&fields["1:10"]).unwrap();
        assert_eq!(kept.points, 61);

        // Touched subject keys were refreshed too.
        assert!(stored.contains_key("score::2425::1"));
        assert!(stored.contains_key("score::2425::2"));
    }

    #[tokio::test]
    async fn test_find_by_subject_cache_roundtrip() {
        let repo = Arc::new(MockRepository::new());
        repo.insert(score(1, 10, 61)).await;
        repo.insert(score(1, 11, 70)).await;
        repo.insert(score(2, 10, 48)).await;
        let cache = Arc::new(MockCache::new());
        let cached = cached(&repo, &cache);

        let rows = cached.find_by_subject(SubjectId(1)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(repo.find_by_subject_calls.load(Ordering::SeqCst), 1);

        let rows = cached.find_by_subject(SubjectId(1)).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(repo.find_by_subject_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delete_all_invalidates_everything() {
        let repo = Arc::new(MockRepository::new());
        repo.insert(score(1, 10, 61)).await;
        let cache = Arc::new(MockCache::new());
        let cached = cached(&repo, &cache);

        let _ = cached.find_all().await.unwrap();
        let _ = cached.find_by_subject(SubjectId(1)).await.unwrap();
        assert_eq!(cache.store.read().await.len(), 2);

        let removed = cached.delete_all().await.unwrap();
        assert_eq!(removed, 1);
        assert!(cache.store.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_subject_invalidates_subject_and_full_set() {
        let repo = Arc::new(MockRepository::new());
        repo.insert(score(1, 10, 61)).await;
        repo.insert(score(2, 10, 48)).await;
        let cache = Arc::new(MockCache::new());
        let cached = cached(&repo, &cache);

        let _ = cached.find_all().await.unwrap();
        let _ = cached.find_by_subject(SubjectId(1)).await.unwrap();
        let _ = cached.find_by_subject(SubjectId(2)).await.unwrap();

        cached.delete_by_subject(SubjectId(1)).await.unwrap();

        let stored = cache.store.read().await;
        assert!(!stored.contains_key("score::2425::1"));
        assert!(!stored.contains_key("score::2425"));
        // The other subject's cache entry is untouched.
        assert!(stored.contains_key("score::2425::2"));
    }

    #[tokio::test]
    async fn test_ttl_expiry_falls_back_and_repopulates() {
        // Composed over the real in-process cache so expiry actually bites.
        let repo = Arc::new(MockRepository::new());
        repo.insert(score(1, 10, 61)).await;
        let cache = Arc::new(crate::cache::MemoryCache::new(16));
        let cached = CachedRepository::new(
            repo.clone() as Arc<dyn Repository<Score>>,
            cache.clone(),
            Season::new("2425"),
            Duration::from_millis(20),
        );

        let _ = cached.find_all().await.unwrap();
        assert_eq!(repo.find_all_calls.load(Ordering::SeqCst), 1);

        // Within the TTL the cache serves the read.
        let _ = cached.find_all().await.unwrap();
        assert_eq!(repo.find_all_calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(40)).await;

        // Expired: the read falls back and the cache holds fresh data again.
        let records = cached.find_all().await.unwrap();
        assert_eq!(records, vec![score(1, 10, 61)]);
        assert_eq!(repo.find_all_calls.load(Ordering::SeqCst), 2);
        let repopulated = cache.get_all("score::2425").await.unwrap().unwrap();
        assert!(serde_json::from_slice::<Score>(&repopulated["1:10"]).is_ok());
    }

    #[tokio::test]
    async fn test_find_existing_bypasses_cache() {
        let repo = Arc::new(MockRepository::new());
        repo.insert(score(1, 10, 61)).await;
        let cache = Arc::new(MockCache::new());
        let cached = cached(&repo, &cache);

        // Poison the cache; the idempotency guard must not consult it.
        let mut fields = RecordSet::new();
        fields.insert("1:10".to_string(), b"not json".to_vec());
        cache.set_all("score::2425", &fields, None).await.unwrap();

        let key = NaturalKey::new(SubjectId(1), Some(SecondaryKey::from(10)));
        let found = cached.find_existing(&key).await.unwrap();
        assert_eq!(found, Some(score(1, 10, 61)));
    }
}
