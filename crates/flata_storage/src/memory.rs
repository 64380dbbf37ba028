//! In-memory storage for testing.

use crate::backend::{RawDatabase, Storage};
use crate::error::StorageResult;
use parking_lot::RwLock;

/// An in-memory storage.
///
/// This storage keeps the database in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// A fresh storage reads as `None` until the first write.
///
/// # Thread Safety
///
/// This storage is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use flata_storage::{MemoryStorage, RawDatabase, Storage};
///
/// let storage = MemoryStorage::new();
/// storage.write(&RawDatabase::new()).unwrap();
/// assert_eq!(storage.read().unwrap(), Some(RawDatabase::new()));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    memory: RwLock<Option<RawDatabase>>,
}

impl MemoryStorage {
    /// Creates a new empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory storage with pre-existing data.
    ///
    /// Useful for testing reopen scenarios.
    #[must_use]
    pub fn with_data(data: RawDatabase) -> Self {
        Self {
            memory: RwLock::new(Some(data)),
        }
    }

    /// Returns a copy of the stored database, if any was written.
    #[must_use]
    pub fn data(&self) -> Option<RawDatabase> {
        self.memory.read().clone()
    }
}

impl Storage for MemoryStorage {
    fn read(&self) -> StorageResult<Option<RawDatabase>> {
        Ok(self.memory.read().clone())
    }

    fn write(&self, data: &RawDatabase) -> StorageResult<()> {
        *self.memory.write() = Some(data.clone());
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        // Nothing to release
        Ok(())
    }
}
