//! Error types for Flata core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Flata core operations.
///
/// "Not found" is never an error: lookups return `Option`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage error, propagated unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] flata_storage::StorageError),

    /// An argument was rejected before any state changed.
    #[error("validation error: {message}")]
    Validation {
        /// Description of what was rejected.
        message: String,
    },

    /// A value could not be represented as JSON.
    #[error("type error: {message}")]
    Type {
        /// Description of the unrepresentable value.
        message: String,
    },

    /// Persisted data for a table is corrupted.
    #[error("data error in table '{table}': {message}")]
    Data {
        /// The table whose data is corrupted.
        table: String,
        /// Description of the corruption.
        message: String,
    },

    /// Database is closed.
    #[error("database is closed")]
    DatabaseClosed,
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a type error.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type {
            message: message.into(),
        }
    }

    /// Creates a data error for `table`.
    pub fn data(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Data {
            table: table.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::type_error(err.to_string())
    }
}
