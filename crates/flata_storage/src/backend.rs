//! Storage trait definition.

use crate::error::StorageResult;
use std::sync::Arc;

/// The raw content of a whole database.
///
/// Each key is a table name; each value is the table's persisted form, a
/// JSON array of documents.
pub type RawDatabase = serde_json::Map<String, serde_json::Value>;

/// A whole-database storage for Flata.
///
/// Storages are **opaque JSON holders**. They return whatever was last
/// written and never look inside tables or documents.
///
/// # Invariants
///
/// - `read` returns `None` for a storage that has never been written
/// - `write` fully replaces prior content
/// - after `write` returns, the content is as durable as the medium allows
///   (or, for buffering wrappers, once `flush`/`close` returns)
/// - Storages must be `Send + Sync` for shared access
///
/// # Implementors
///
/// - [`super::MemoryStorage`] - For testing
/// - [`super::JsonStorage`] - For persistent storage
/// - [`super::CachingMiddleware`] - Write-buffering wrapper
pub trait Storage: Send + Sync {
    /// Reads the whole database.
    ///
    /// Returns `None` when the storage holds no data yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read or its content is not
    /// a JSON object.
    fn read(&self) -> StorageResult<Option<RawDatabase>>;

    /// Replaces the whole database with `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be written.
    fn write(&self, data: &RawDatabase) -> StorageResult<()>;

    /// Pushes any buffered writes to the underlying medium.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }

    /// Releases the resources held by the storage.
    ///
    /// Callers must not close a storage more than once; implementations are
    /// not required to be idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered data cannot be written or the medium
    /// cannot be released.
    fn close(&self) -> StorageResult<()>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn read(&self) -> StorageResult<Option<RawDatabase>> {
        (**self).read()
    }

    fn write(&self, data: &RawDatabase) -> StorageResult<()> {
        (**self).write(data)
    }

    fn flush(&self) -> StorageResult<()> {
        (**self).flush()
    }

    fn close(&self) -> StorageResult<()> {
        (**self).close()
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn read(&self) -> StorageResult<Option<RawDatabase>> {
        (**self).read()
    }

    fn write(&self, data: &RawDatabase) -> StorageResult<()> {
        (**self).write(data)
    }

    fn flush(&self) -> StorageResult<()> {
        (**self).flush()
    }

    fn close(&self) -> StorageResult<()> {
        (**self).close()
    }
}
