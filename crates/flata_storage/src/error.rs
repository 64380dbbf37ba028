//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stored content is not valid JSON, or could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored JSON is valid but is not a top-level object.
    #[error("invalid storage layout: {0}")]
    InvalidLayout(String),

    /// The storage is closed.
    #[error("storage is closed")]
    Closed,
}
