//! Process-lifetime memoization of upstream fetches.
//!
//! The memo is an explicit field on an explicit wrapper with a normal
//! construction lifecycle, not a hidden module-level global: whoever builds
//! the client decides whether fetches are memoized, and dropping the client
//! drops the memo.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use leaguesync_core::record::{SecondaryKey, SubjectId};
use leaguesync_core::upstream::{FetchError, RawRecord, UpstreamClient};

type MemoKey = (SubjectId, Option<SecondaryKey>);

/// Wraps an [`UpstreamClient`] and caches the first successful fetch per
/// (subject, secondary) pair for the lifetime of the wrapper.
///
/// Failed fetches are never memoized; the next call hits the inner client
/// again.
pub struct MemoizedUpstream {
    inner: Arc<dyn UpstreamClient>,
    memo: RwLock<HashMap<MemoKey, Vec<RawRecord>>>,
}

impl MemoizedUpstream {
    pub fn new(inner: Arc<dyn UpstreamClient>) -> Self {
        Self {
            inner,
            memo: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl UpstreamClient for MemoizedUpstream {
    async fn fetch(
        &self,
        subject: SubjectId,
        secondary: Option<&SecondaryKey>,
    ) -> Result<Vec<RawRecord>, FetchError> {
        let key: MemoKey = (subject, secondary.cloned());

        if let Some(memoized) = self.memo.read().await.get(&key) {
            return Ok(memoized.clone());
        }

        let records = self.inner.fetch(subject, secondary).await?;
        self.memo.write().await.insert(key, records.clone());
        Ok(records)
    }
}
