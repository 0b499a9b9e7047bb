use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::SyncStageError;

/// Outcome of one subject's pipeline within a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectOutcome {
    /// New records were persisted for this subject.
    Synced {
        written: usize,
        /// Raw records dropped by fail-closed mapping while their siblings
        /// went through.
        mapping_failures: usize,
    },
    /// A record already existed under the natural key; zero writes.
    SkippedExisting,
    /// The upstream returned zero records; nothing to do this run.
    Empty,
    /// The pipeline failed at some stage; isolated to this subject.
    Failed(SyncStageError),
}

/// Aggregate result of one orchestrator run.
///
/// A run "succeeds" whenever the subject list could be read, even if every
/// individual subject failed; operators watch the `failed` count and the
/// logs, not the `Result`.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub attempted: usize,
    pub synced: usize,
    pub skipped_existing: usize,
    pub empty: usize,
    pub failed: usize,
    pub records_written: usize,
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            attempted: 0,
            synced: 0,
            skipped_existing: 0,
            empty: 0,
            failed: 0,
            records_written: 0,
        }
    }

    /// Folds one subject outcome into the aggregate counts.
    pub fn record(&mut self, outcome: &SubjectOutcome) {
        self.attempted += 1;
        match outcome {
            SubjectOutcome::Synced { written, .. } => {
                self.synced += 1;
                self.records_written += written;
            }
            SubjectOutcome::SkippedExisting => self.skipped_existing += 1,
            SubjectOutcome::Empty => self.empty += 1,
            SubjectOutcome::Failed(_) => self.failed += 1,
        }
    }
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {}: {} attempted, {} synced ({} records), {} skipped, {} empty, {} failed",
            self.run_id,
            self.attempted,
            self.synced,
            self.records_written,
            self.skipped_existing,
            self.empty,
            self.failed
        )
    }
}
