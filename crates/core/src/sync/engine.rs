//! Fan-out synchronization engine.
//!
//! One lightweight task per subject, dispatched unordered via a
//! [`JoinSet`]; the run suspends until the whole set completes. Subjects
//! are fully independent: no transaction or lock spans more than one
//! subject's unit of work, so partial completion of a batch is a normal
//! outcome, not a failure state.
//!
//! There is no concurrency cap on the fan-out. That is a known
//! resource-pressure risk at subject counts in the thousands, carried over
//! from the modeled behavior rather than silently patched.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::record::{NaturalKey, SecondaryKey, SubjectId, SyncRecord, WritePolicy};
use crate::storage::{Repository, SubjectDirectory};
use crate::upstream::{Mapper, UpstreamClient};

use super::{SubjectOutcome, SyncError, SyncReport, SyncStageError};

/// Orchestrates one entity kind's synchronization across the subject
/// population.
pub struct SyncEngine<T: SyncRecord> {
    upstream: Arc<dyn UpstreamClient>,
    mapper: Arc<dyn Mapper<T>>,
    repository: Arc<dyn Repository<T>>,
    directory: Arc<dyn SubjectDirectory>,
}

impl<T: SyncRecord> SyncEngine<T> {
    pub fn new(
        upstream: Arc<dyn UpstreamClient>,
        mapper: Arc<dyn Mapper<T>>,
        repository: Arc<dyn Repository<T>>,
        directory: Arc<dyn SubjectDirectory>,
    ) -> Self {
        Self {
            upstream,
            mapper,
            repository,
            directory,
        }
    }

    /// Runs one batch sync across `subjects` (or the whole tracked
    /// population when `None`), scoped to an optional secondary key such as
    /// a gameweek number.
    ///
    /// The only fatal error is failing to enumerate the subjects; every
    /// per-subject failure is logged, folded into the report and otherwise
    /// swallowed. Re-running with unchanged upstream data is a no-op for
    /// already-synced subject/key pairs.
    pub async fn sync(
        &self,
        subjects: Option<Vec<SubjectId>>,
        scope: Option<SecondaryKey>,
    ) -> Result<SyncReport, SyncError> {
        let subjects = match subjects {
            Some(list) => list,
            None => self
                .directory
                .list_subjects()
                .await
                .map_err(SyncError::Enumeration)?,
        };

        info!(kind = T::KIND, subjects = subjects.len(), "Starting sync run");

        let mut tasks = JoinSet::new();
        for subject in subjects {
            let upstream = Arc::clone(&self.upstream);
            let mapper = Arc::clone(&self.mapper);
            let repository = Arc::clone(&self.repository);
            let scope = scope.clone();
            tasks.spawn(async move {
                sync_subject(upstream, mapper, repository, subject, scope).await
            });
        }

        let mut report = SyncReport::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(&outcome),
                Err(error) => {
                    warn!(kind = T::KIND, error = %error, "Subject task panicked");
                    report.attempted += 1;
                    report.failed += 1;
                }
            }
        }

        info!(kind = T::KIND, report = %report, "Sync run finished");
        Ok(report)
    }

    /// Explicit full-refresh flow: clears every persisted record of this
    /// kind, then re-syncs from the upstream.
    ///
    /// With a cache-aside repository in the stack this is the
    /// delete-then-repopulate invalidation path.
    pub async fn full_refresh(
        &self,
        subjects: Option<Vec<SubjectId>>,
        scope: Option<SecondaryKey>,
    ) -> Result<SyncReport, SyncError> {
        let removed = self
            .repository
            .delete_all()
            .await
            .map_err(SyncError::Refresh)?;
        info!(kind = T::KIND, removed, "Cleared records for full refresh");
        self.sync(subjects, scope).await
    }
}

/// One subject's pipeline: fetch, existence check, map, upsert — strictly
/// in that order, never reordered.
async fn sync_subject<T: SyncRecord>(
    upstream: Arc<dyn UpstreamClient>,
    mapper: Arc<dyn Mapper<T>>,
    repository: Arc<dyn Repository<T>>,
    subject: SubjectId,
    scope: Option<SecondaryKey>,
) -> SubjectOutcome {
    let raws = match upstream.fetch(subject, scope.as_ref()).await {
        Ok(raws) => raws,
        Err(error) => {
            warn!(kind = T::KIND, subject = %subject, error = %error, "Fetch failed");
            return SubjectOutcome::Failed(SyncStageError::Fetch(error));
        }
    };

    if raws.is_empty() {
        debug!(kind = T::KIND, subject = %subject, "Upstream returned no records");
        return SubjectOutcome::Empty;
    }

    // Append-only kinds never overwrite an already-synced subject/key pair;
    // snapshot kinds skip the guard and let the upsert replace the payload.
    if T::WRITE_POLICY == WritePolicy::SkipIfExists {
        let key = NaturalKey::new(subject, scope.clone());
        match repository.find_existing(&key).await {
            Ok(Some(_)) => {
                debug!(kind = T::KIND, subject = %subject, "Record exists, skipping");
                return SubjectOutcome::SkippedExisting;
            }
            Ok(None) => {}
            Err(error) => {
                warn!(
                    kind = T::KIND,
                    subject = %subject,
                    error = %error,
                    "Existence check failed"
                );
                return SubjectOutcome::Failed(SyncStageError::ExistenceCheck(error));
            }
        }
    }

    let mut mapped = Vec::with_capacity(raws.len());
    let mut mapping_failures = 0;
    for raw in &raws {
        match mapper.map(raw) {
            Ok(record) => mapped.push(record),
            Err(error) => {
                warn!(
                    kind = T::KIND,
                    subject = %subject,
                    error = %error,
                    "Mapping failed for one record"
                );
                mapping_failures += 1;
            }
        }
    }

    if mapped.is_empty() {
        return SubjectOutcome::Failed(SyncStageError::Mapping {
            failed: mapping_failures,
        });
    }

    match repository.batch_upsert(&mapped).await {
        Ok(written) => SubjectOutcome::Synced {
            written,
            mapping_failures,
        },
        Err(error) => {
            warn!(kind = T::KIND, subject = %subject, error = %error, "Upsert failed");
            SubjectOutcome::Failed(SyncStageError::Upsert(error))
        }
    }
}
