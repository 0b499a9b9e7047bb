use thiserror::Error;

use crate::storage::RepositoryError;
use crate::upstream::FetchError;

/// Per-subject pipeline failure, tagged by the stage that produced it.
///
/// Every variant is caught at the subject boundary, logged with subject
/// context, and folded into the batch report as a no-op outcome; none of
/// them fails the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncStageError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Existence check failed: {0}")]
    ExistenceCheck(RepositoryError),
    #[error("All {failed} fetched records failed mapping")]
    Mapping { failed: usize },
    #[error("Upsert failed: {0}")]
    Upsert(RepositoryError),
}

/// Fatal errors of a whole sync run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The subject population could not be read; nothing was dispatched.
    #[error("Cannot enumerate subjects: {0}")]
    Enumeration(#[source] RepositoryError),
    /// A full refresh could not clear the store before re-syncing.
    #[error("Full refresh could not clear existing records: {0}")]
    Refresh(#[source] RepositoryError),
}
