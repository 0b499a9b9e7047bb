//! Serializing record sets to and from cache hashes.
//!
//! Records are stored as JSON bytes keyed by their natural-key rendering.
//! Decoding fails closed: a single undecodable field makes the whole entry
//! unreadable, so the reader treats it as a cache miss instead of silently
//! returning a partial set.

use thiserror::Error;

use super::traits::RecordSet;
use crate::record::SyncRecord;

/// Errors that can occur while encoding or decoding cached record sets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("Failed to serialize: {0}")]
    SerializeFailed(String),
    #[error("Failed to deserialize: {0}")]
    DeserializeFailed(String),
}

/// Result type for cache serialization operations.
pub type Result<T> = std::result::Result<T, SerializationError>;

/// Serializes one record to JSON bytes.
pub fn serialize_record<T: SyncRecord>(record: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserializes JSON bytes to one record.
pub fn deserialize_record<T: SyncRecord>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

/// Encodes a record slice into the hash shape the cache stores.
pub fn encode_record_set<T: SyncRecord>(records: &[T]) -> Result<RecordSet> {
    records
        .iter()
        .map(|record| Ok((record.natural_key().to_string(), serialize_record(record)?)))
        .collect()
}

/// Decodes a cached hash back into records.
pub fn decode_record_set<T: SyncRecord>(fields: &RecordSet) -> Result<Vec<T>> {
    fields
        .values()
        .map(|bytes| deserialize_record(bytes))
        .collect()
}
