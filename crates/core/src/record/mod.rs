mod types;

pub use types::{NaturalKey, ParseNaturalKeyError, Season, SecondaryKey, SubjectId, WritePolicy};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A canonical domain record produced by mapping an upstream payload.
///
/// One generic sync pipeline handles every entity kind through this trait:
/// the kind names the cache/table namespace, the write policy selects the
/// conflict behavior of `batch_upsert`, and the key accessors form the
/// natural key the repository enforces uniqueness on.
pub trait SyncRecord:
    Clone + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Namespace for this entity kind, used as the cache key prefix and the
    /// relational discriminator (e.g. `"gw_points"`).
    const KIND: &'static str;

    /// Conflict behavior when a record with the same natural key is already
    /// persisted.
    const WRITE_POLICY: WritePolicy;

    /// The subject this record belongs to.
    fn subject_id(&self) -> SubjectId;

    /// Optional second key component (e.g. a gameweek number).
    fn secondary_key(&self) -> Option<SecondaryKey>;

    /// The composite business key identifying this record.
    fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(self.subject_id(), self.secondary_key())
    }
}
