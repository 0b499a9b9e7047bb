use thiserror::Error;

/// Errors that can occur during cache store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for cache store operations.
pub type Result<T> = std::result::Result<T, CacheError>;
