use thiserror::Error;

/// Errors that can occur while fetching raw records from the upstream API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Upstream unreachable: {0}")]
    Transport(String),
    #[error("Upstream returned status {status}")]
    Status { status: u16 },
    #[error("Upstream response was not valid JSON: {0}")]
    Decode(String),
}

/// Errors that can occur while mapping a raw payload into a canonical
/// record.
///
/// Mapping fails closed: a missing or invalid key component fails the one
/// input it belongs to, it is never silently defaulted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Missing field '{field}'")]
    MissingField { field: &'static str },
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
