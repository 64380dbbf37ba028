//! Write-buffering wrapper around another storage.

use crate::backend::{RawDatabase, Storage};
use crate::error::StorageResult;
use parking_lot::Mutex;

/// Number of writes buffered before [`CachingMiddleware`] flushes.
pub const DEFAULT_WRITE_CACHE_SIZE: usize = 1000;

#[derive(Debug, Default)]
struct CacheState {
    /// Last known content of the database.
    cache: Option<RawDatabase>,
    /// Writes accepted since the last flush.
    pending_writes: usize,
}

/// A storage wrapper that keeps the database in memory and defers writes.
///
/// Reads are served from the in-memory copy (loaded from the wrapped storage
/// on first use). Writes replace the in-memory copy and are pushed to the
/// wrapped storage once `write_cache_size` writes have accumulated, or on
/// [`Storage::flush`] / [`Storage::close`].
///
/// Sharing one middleware (e.g. through an `Arc`) between database handles
/// makes every handle see the others' writes before they are flushed.
///
/// # Example
///
/// ```rust
/// use flata_storage::{CachingMiddleware, MemoryStorage, RawDatabase, Storage};
///
/// let storage = CachingMiddleware::new(MemoryStorage::new());
/// storage.write(&RawDatabase::new()).unwrap();
/// assert!(storage.inner().data().is_none()); // still buffered
///
/// storage.flush().unwrap();
/// assert!(storage.inner().data().is_some());
/// ```
#[derive(Debug)]
pub struct CachingMiddleware<S> {
    storage: S,
    write_cache_size: usize,
    state: Mutex<CacheState>,
}

impl<S: Storage> CachingMiddleware<S> {
    /// Wraps `storage` with the default write cache size.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self::with_write_cache_size(storage, DEFAULT_WRITE_CACHE_SIZE)
    }

    /// Wraps `storage`, flushing after every `size` writes.
    ///
    /// A size of zero is treated as one (write-through).
    #[must_use]
    pub fn with_write_cache_size(storage: S, size: usize) -> Self {
        Self {
            storage,
            write_cache_size: size.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns the wrapped storage.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.storage
    }

    /// Returns the number of writes not yet pushed to the wrapped storage.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.state.lock().pending_writes
    }

    fn flush_locked(&self, state: &mut CacheState) -> StorageResult<()> {
        if state.pending_writes == 0 {
            return Ok(());
        }
        if let Some(data) = &state.cache {
            self.storage.write(data)?;
        }
        tracing::trace!(writes = state.pending_writes, "flushed write cache");
        state.pending_writes = 0;
        Ok(())
    }
}

impl<S: Storage> Storage for CachingMiddleware<S> {
    fn read(&self) -> StorageResult<Option<RawDatabase>> {
        let mut state = self.state.lock();
        if state.cache.is_none() {
            state.cache = self.storage.read()?;
        }
        Ok(state.cache.clone())
    }

    fn write(&self, data: &RawDatabase) -> StorageResult<()> {
        let mut state = self.state.lock();
        state.cache = Some(data.clone());
        state.pending_writes += 1;

        if state.pending_writes >= self.write_cache_size {
            self.flush_locked(&mut state)?;
        }
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        let mut state = self.state.lock();
        self.flush_locked(&mut state)?;
        self.storage.flush()
    }

    fn close(&self) -> StorageResult<()> {
        {
            let mut state = self.state.lock();
            self.flush_locked(&mut state)?;
        }
        self.storage.close()
    }
}
