use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw upstream payload, pre-validation.
///
/// Ephemeral: created per fetch, discarded once mapped into a canonical
/// record (or once its mapping fails).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub Value);

impl RawRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Reads a field off the payload, when the payload is a JSON object.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.as_object().and_then(|obj| obj.get(name))
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
