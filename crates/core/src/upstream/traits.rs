use async_trait::async_trait;

use crate::record::{SecondaryKey, SubjectId, SyncRecord};

use super::{FetchError, MappingError, RawRecord};

/// Fetches raw payloads for one subject from the third-party API.
///
/// Any timeout belongs to the implementation's transport layer; the sync
/// engine imposes none of its own.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn fetch(
        &self,
        subject: SubjectId,
        secondary: Option<&SecondaryKey>,
    ) -> Result<Vec<RawRecord>, FetchError>;
}

/// Pure transform from a raw payload to a canonical record.
///
/// No side effects; fails closed per input (siblings in a batch still
/// succeed when one payload is malformed).
pub trait Mapper<T: SyncRecord>: Send + Sync {
    fn map(&self, raw: &RawRecord) -> Result<T, MappingError>;
}
