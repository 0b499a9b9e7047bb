//! Redis cache store implementation.
//!
//! Uses set-based key tracking for pattern deletion without SCAN: every
//! subject key is added to its namespace's tracking set on write and
//! removed on delete.
//!
//! Operations here are pipelined but span multiple commands; a crash can
//! leave a stale reference in a tracking set. That is harmless: SREM of an
//! absent member and DEL of an absent key are both no-ops, so subsequent
//! deletes finish the cleanup. The worst case is temporary inconsistency,
//! never a wrong cached value.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use leaguesync_core::cache::{
    is_subject_key, key_namespace, pattern_matches, tracking_key, CacheStore, RecordSet,
    Result,
};
use leaguesync_core::record::Season;

use super::error::map_redis_error;

/// Redis cache backend using a connection manager for pooling.
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
}

impl RedisCache {
    /// Creates a new Redis cache connection.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the connection cannot be
    /// established.
    pub async fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        Ok(Self { conn })
    }

    fn tracking_key_for(key: &str) -> Option<String> {
        key_namespace(key).map(|(kind, season)| tracking_key(kind, &Season::new(season)))
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get_all(&self, key: &str) -> Result<Option<RecordSet>> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, Vec<u8>> =
            conn.hgetall(key).await.map_err(map_redis_error)?;
        // Redis cannot hold an empty hash; an empty reply means absent.
        if fields.is_empty() {
            return Ok(None);
        }
        Ok(Some(fields))
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

        let mut conn = self.conn.clone();
        let items: Vec<(&String, &Vec<u8>)> = fields.iter().collect();

        // DEL before HSET makes the write a full overwrite, not a merge.
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.del(key).ignore();
        pipe.hset_multiple(key, &items).ignore();
        if let Some(duration) = ttl {
            let seconds = duration.as_secs().max(1) as i64;
            pipe.expire(key, seconds).ignore();
        }
        if is_subject_key(key) {
            if let Some(tracking) = Self::tracking_key_for(key) {
                pipe.sadd(tracking, key).ignore();
            }
        }
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(map_redis_error)?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();

        if is_subject_key(key) {
            if let Some(tracking) = Self::tracking_key_for(key) {
                conn.srem::<_, _, ()>(&tracking, key)
                    .await
                    .map_err(map_redis_error)?;
            }
        }

        conn.del::<_, ()>(key).await.map_err(map_redis_error)?;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        // Only namespaced subject keys are tracked; anything else is a
        // no-op.
        let Some(tracking) = Self::tracking_key_for(pattern) else {
            return Ok(());
        };

        let mut conn = self.conn.clone();
        let tracked: Vec<String> = conn
            .smembers(&tracking)
            .await
            .map_err(map_redis_error)?;

        let matching: Vec<&String> = tracked
            .iter()
            .filter(|k| pattern_matches(pattern, k))
            .collect();

        if !matching.is_empty() {
            conn.del::<_, ()>(&matching).await.map_err(map_redis_error)?;
            conn.srem::<_, _, ()>(&tracking, &matching)
                .await
                .map_err(map_redis_error)?;
        }

        Ok(())
    }
}
