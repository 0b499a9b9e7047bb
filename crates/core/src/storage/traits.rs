use async_trait::async_trait;

use crate::record::{NaturalKey, SubjectId, SyncRecord};

use super::Result;

/// Relational CRUD for one entity kind, scoped to the season the backend
/// was constructed for.
///
/// The backend enforces natural-key uniqueness server-side; `batch_upsert`
/// relies on that constraint for its idempotency guarantee.
#[async_trait]
pub trait Repository<T: SyncRecord>: Send + Sync {
    /// Looks up the record persisted under a natural key, if any.
    ///
    /// Used by the sync engine purely as an idempotency guard before
    /// writing; it is not part of the read path.
    async fn find_existing(&self, key: &NaturalKey) -> Result<Option<T>>;

    /// Returns every persisted record of this kind.
    async fn find_all(&self) -> Result<Vec<T>>;

    /// Returns every persisted record of one subject.
    async fn find_by_subject(&self, subject: SubjectId) -> Result<Vec<T>>;

    /// Persists a batch of records, returning the number of rows written.
    ///
    /// Safe to call repeatedly with overlapping input: a natural-key
    /// conflict never errors and never duplicates. Under
    /// [`WritePolicy::SkipIfExists`] the existing row is silently kept;
    /// under [`WritePolicy::Overwrite`] its payload is replaced.
    ///
    /// [`WritePolicy::SkipIfExists`]: crate::record::WritePolicy::SkipIfExists
    /// [`WritePolicy::Overwrite`]: crate::record::WritePolicy::Overwrite
    async fn batch_upsert(&self, records: &[T]) -> Result<usize>;

    /// Deletes every record of this kind. Full-refresh flows only.
    async fn delete_all(&self) -> Result<usize>;

    /// Deletes every record of one subject. Full-refresh flows only.
    async fn delete_by_subject(&self, subject: SubjectId) -> Result<usize>;
}

/// The population of subjects the sync engine fans out over.
#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    /// Lists every tracked subject.
    async fn list_subjects(&self) -> Result<Vec<SubjectId>>;

    /// Adds a subject to the tracked population.
    async fn register_subject(&self, subject: SubjectId, label: Option<&str>) -> Result<()>;

    /// Removes a subject from the tracked population.
    async fn deregister_subject(&self, subject: SubjectId) -> Result<()>;
}
