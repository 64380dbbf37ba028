//! Database handle.

use crate::config::TableOptions;
use crate::error::{CoreError, CoreResult};
use crate::proxy::StorageProxy;
use crate::table::Table;
use flata_storage::{JsonStorage, JsonStorageConfig, MemoryStorage, RawDatabase, Storage};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds a [`Table`] for a storage proxy.
///
/// The default factory is [`Table::open`]. A custom factory can wrap it, for
/// instance to pre-populate or instrument tables.
pub type TableFactory = Arc<dyn Fn(StorageProxy, &TableOptions) -> CoreResult<Table> + Send + Sync>;

/// The main database handle.
///
/// `Database` owns its storage and hands out [`Table`]s by name. Tables are
/// created on first access and then shared: every call with the same name
/// returns the same `Arc<Table>`.
///
/// Closing is idempotent and closes the storage exactly once. Dropping an open
/// database closes it.
///
/// # Example
///
/// ```rust
/// use flata_core::{query::field, Database};
/// use serde_json::json;
///
/// let db = Database::open_in_memory();
/// let users = db.table("users").unwrap();
///
/// users.insert(&json!({"name": "John", "age": 22})).unwrap();
/// assert_eq!(users.count(&field("age").ge(18)).unwrap(), 1);
///
/// db.close().unwrap();
/// ```
pub struct Database {
    storage: Arc<dyn Storage>,
    /// Serializes read-modify-write cycles of every table.
    cycle: Arc<Mutex<()>>,
    tables: RwLock<HashMap<String, Arc<Table>>>,
    factory: TableFactory,
    default_options: TableOptions,
    is_open: RwLock<bool>,
}

impl Database {
    /// Opens (or creates) a database stored in the JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        Self::open_with_config(path, JsonStorageConfig::default())
    }

    /// Opens a JSON file database with explicit file settings.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file cannot be opened.
    pub fn open_with_config(path: impl AsRef<Path>, config: JsonStorageConfig) -> CoreResult<Self> {
        let storage = JsonStorage::open_with_config(path.as_ref(), config)?;
        debug!(path = %path.as_ref().display(), "opened database file");
        Ok(Self::with_storage(storage))
    }

    /// Creates an empty database held in memory.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self::with_storage(MemoryStorage::new())
    }

    /// Creates a database over `storage`.
    #[must_use]
    pub fn with_storage(storage: impl Storage + 'static) -> Self {
        Self::builder().storage(storage).build()
    }

    /// Creates a database over a storage that other handles may share.
    ///
    /// Closing this database still closes the storage.
    #[must_use]
    pub fn with_shared_storage(storage: Arc<dyn Storage>) -> Self {
        Self::builder().shared_storage(storage).build()
    }

    /// Returns a builder for a customized database.
    #[must_use]
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    /// Returns the table `name` with the default options.
    ///
    /// # Errors
    ///
    /// See [`Database::table_with`].
    pub fn table(&self, name: &str) -> CoreResult<Arc<Table>> {
        self.table_with(name, self.default_options.clone())
    }

    /// Returns the table `name`, creating it with `options` on first access.
    ///
    /// Options are ignored when the table is already open.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatabaseClosed`] after [`Database::close`], a
    /// validation error for an empty name or invalid options, and storage or
    /// data errors from the table's first read.
    pub fn table_with(&self, name: &str, options: TableOptions) -> CoreResult<Arc<Table>> {
        self.ensure_open()?;
        if name.is_empty() {
            return Err(CoreError::validation("table name must not be empty"));
        }

        if let Some(table) = self.tables.read().get(name) {
            return Ok(Arc::clone(table));
        }

        let mut tables = self.tables.write();
        if let Some(table) = tables.get(name) {
            return Ok(Arc::clone(table));
        }

        let proxy = StorageProxy::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.cycle),
            name,
            options.id_field.clone(),
        );
        let table = Arc::new((self.factory)(proxy, &options)?);
        tables.insert(name.to_string(), Arc::clone(&table));
        Ok(table)
    }

    /// Returns the table `name` only if this handle has already opened it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.read().get(name).cloned()
    }

    /// Returns the names of all tables present in the storage.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatabaseClosed`] or a storage error.
    pub fn tables(&self) -> CoreResult<BTreeSet<String>> {
        self.ensure_open()?;
        let raw = self.storage.read()?;
        Ok(raw.map(|db| db.keys().cloned().collect()).unwrap_or_default())
    }

    /// Returns the raw content of the storage.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatabaseClosed`] or a storage error.
    pub fn all(&self) -> CoreResult<RawDatabase> {
        self.ensure_open()?;
        Ok(self.storage.read()?.unwrap_or_default())
    }

    /// Removes every table from the storage and forgets all open tables.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatabaseClosed`] or a storage error.
    pub fn purge_tables(&self) -> CoreResult<()> {
        self.ensure_open()?;
        let mut tables = self.tables.write();
        {
            let _cycle = self.cycle.lock();
            self.storage.write(&RawDatabase::new())?;
        }
        for (_, table) in tables.drain() {
            table.forget();
        }
        debug!("purged all tables");
        Ok(())
    }

    /// Removes the table `name` from the storage and forgets its handle.
    ///
    /// Purging a table that does not exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatabaseClosed`] or a storage error.
    pub fn purge_table(&self, name: &str) -> CoreResult<()> {
        self.ensure_open()?;
        let mut tables = self.tables.write();
        let forgotten = tables.remove(name);

        let proxy = StorageProxy::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.cycle),
            name,
            self.default_options.id_field.clone(),
        );
        proxy.begin().purge()?;
        if let Some(table) = forgotten {
            table.forget();
        }
        debug!(table = name, "purged table");
        Ok(())
    }

    /// Flushes buffered writes of the storage.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatabaseClosed`] or a storage error.
    pub fn flush(&self) -> CoreResult<()> {
        self.ensure_open()?;
        self.storage.flush()?;
        Ok(())
    }

    /// Closes the database and its storage.
    ///
    /// Calling `close` again is a no-op. Afterwards, every database
    /// operation fails with [`CoreError::DatabaseClosed`].
    ///
    /// # Errors
    ///
    /// Returns the storage's close error. The database counts as closed
    /// even then, and the storage is not closed a second time.
    pub fn close(&self) -> CoreResult<()> {
        let mut is_open = self.is_open.write();
        if !*is_open {
            return Ok(());
        }
        *is_open = false;

        debug!("closing database");
        self.storage.close()?;
        Ok(())
    }

    /// Checks if the database is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.is_open.read()
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if *self.is_open.read() {
            Ok(())
        } else {
            Err(CoreError::DatabaseClosed)
        }
    }

    /// Returns the options used by [`Database::table`].
    #[must_use]
    pub fn default_options(&self) -> &TableOptions {
        &self.default_options
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut open_tables: Vec<String> = self.tables.read().keys().cloned().collect();
        open_tables.sort();
        f.debug_struct("Database")
            .field("is_open", &self.is_open())
            .field("open_tables", &open_tables)
            .finish_non_exhaustive()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close storage");
        }
    }
}

/// Builder for [`Database`].
///
/// ```rust
/// use flata_core::{Database, TableOptions};
/// use flata_storage::{CachingMiddleware, MemoryStorage};
///
/// let db = Database::builder()
///     .storage(CachingMiddleware::new(MemoryStorage::new()))
///     .default_options(TableOptions::new().cache_size(64))
///     .build();
/// assert_eq!(db.table("t").unwrap().cache_size(), 64);
/// ```
#[derive(Default)]
pub struct DatabaseBuilder {
    storage: Option<Arc<dyn Storage>>,
    factory: Option<TableFactory>,
    default_options: TableOptions,
}

impl DatabaseBuilder {
    /// Uses `storage`. Defaults to a fresh [`MemoryStorage`].
    #[must_use]
    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Uses a storage that other handles may share.
    #[must_use]
    pub fn shared_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Uses `factory` to build tables. Defaults to [`Table::open`].
    #[must_use]
    pub fn table_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(StorageProxy, &TableOptions) -> CoreResult<Table> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Sets the options used by [`Database::table`].
    #[must_use]
    pub fn default_options(mut self, options: TableOptions) -> Self {
        self.default_options = options;
        self
    }

    /// Builds the database.
    #[must_use]
    pub fn build(self) -> Database {
        let storage: Arc<dyn Storage> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(MemoryStorage::new()),
        };
        let factory: TableFactory = match self.factory {
            Some(factory) => factory,
            None => Arc::new(Table::open),
        };

        Database {
            storage,
            cycle: Arc::new(Mutex::new(())),
            tables: RwLock::new(HashMap::new()),
            factory,
            default_options: self.default_options,
            is_open: RwLock::new(true),
        }
    }
}

impl std::fmt::Debug for DatabaseBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseBuilder")
            .field("custom_storage", &self.storage.is_some())
            .field("custom_factory", &self.factory.is_some())
            .field("default_options", &self.default_options)
            .finish()
    }
}
