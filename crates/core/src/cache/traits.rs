use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use super::Result;

/// The value shape of one cached entry: a hash of natural-key renderings to
/// serialized record bytes.
pub type RecordSet = HashMap<String, Vec<u8>>;

/// Key-value hash store with TTL.
///
/// The store is never the source of truth: every entry must be exactly
/// reconstructable from the repository, and TTL expiry is the only implicit
/// invalidation. Whether a present entry actually decodes into well-formed
/// records is the reader's concern, not the store's.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Gets the full hash stored under `key`, or `None` when absent.
    async fn get_all(&self, key: &str) -> Result<Option<RecordSet>>;

    /// Stores `fields` under `key` with an optional TTL.
    ///
    /// This is a full overwrite, never a merge: fields previously stored
    /// under the key and not present in `fields` are gone afterwards.
    async fn set_all(&self, key: &str, fields: &RecordSet, ttl: Option<Duration>)
        -> Result<()>;

    /// Deletes the entry stored under `key`.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Deletes all entries whose key matches a glob pattern
    /// (e.g. `"gw_points::2425::*"`).
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;
}
