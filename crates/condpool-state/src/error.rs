//! Storage error types

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backing store could not serve the read
    #[error("state backend error: {0}")]
    Backend(String),

    /// Invalid data format
    #[error("invalid data format: {0}")]
    InvalidFormat(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
