mod error;
mod keys;
mod patterns;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{
    is_subject_key, key_namespace, record_set_key, subject_keys_pattern, subject_set_key,
    tracking_key,
};
pub use patterns::pattern_matches;
pub use serialization::{
    decode_record_set, deserialize_record, encode_record_set, serialize_record,
    SerializationError,
};
pub use traits::{CacheStore, RecordSet};
