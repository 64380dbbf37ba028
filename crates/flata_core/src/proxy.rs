//! Per-table view of the shared storage.
//!
//! Every table sees the whole database through a [`StorageProxy`] that only
//! exposes its own entry. All proxies of one database share a cycle lock: a
//! read-modify-write cycle holds it from the read to the write, so
//! concurrent table operations can never overwrite each other's entries.

use crate::document::{DocId, Document};
use crate::error::{CoreError, CoreResult};
use flata_storage::{RawDatabase, Storage};
use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;
use std::sync::Arc;

/// Documents of one table keyed by identity, in persisted order.
pub(crate) type TableData = IndexMap<DocId, Document>;

/// Scoped view of the storage restricted to one table's entry.
#[derive(Clone)]
pub struct StorageProxy {
    storage: Arc<dyn Storage>,
    cycle: Arc<Mutex<()>>,
    table: String,
    id_field: String,
}

impl std::fmt::Debug for StorageProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageProxy")
            .field("table", &self.table)
            .field("id_field", &self.id_field)
            .finish_non_exhaustive()
    }
}

impl StorageProxy {
    pub(crate) fn new(
        storage: Arc<dyn Storage>,
        cycle: Arc<Mutex<()>>,
        table: impl Into<String>,
        id_field: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            cycle,
            table: table.into(),
            id_field: id_field.into(),
        }
    }

    /// Returns the name of the table this proxy serves.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Returns the identity field of the table's documents.
    #[must_use]
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Starts a read-modify-write cycle.
    ///
    /// Blocks until no other cycle on the same database is running.
    pub(crate) fn begin(&self) -> Cycle<'_> {
        Cycle {
            proxy: self,
            _guard: self.cycle.lock(),
        }
    }
}

/// Exclusive access to the storage for the duration of one table operation.
pub(crate) struct Cycle<'a> {
    proxy: &'a StorageProxy,
    _guard: MutexGuard<'a, ()>,
}

impl Cycle<'_> {
    /// Reads the table's documents.
    ///
    /// A table that has no entry yet gets an empty one written, so it shows
    /// up in the database's table list from its first use.
    pub(crate) fn read(&self) -> CoreResult<TableData> {
        let proxy = self.proxy;
        let raw = proxy.storage.read()?;

        let Some(entry) = raw.and_then(|mut db| db.remove(&proxy.table)) else {
            tracing::debug!(table = %proxy.table, "creating table entry");
            self.write_entry(Value::Array(Vec::new()))?;
            return Ok(TableData::new());
        };

        let Value::Array(items) = entry else {
            return Err(CoreError::data(&proxy.table, "table entry is not a list"));
        };

        let mut docs = TableData::with_capacity(items.len());
        for (position, item) in items.into_iter().enumerate() {
            let doc = Document::from_persisted(&proxy.table, &proxy.id_field, position, item)?;
            let id = doc.id();
            if docs.insert(id, doc).is_some() {
                return Err(CoreError::data(
                    &proxy.table,
                    format!("duplicate document identity {id}"),
                ));
            }
        }
        Ok(docs)
    }

    /// Replaces the table's entry with `docs`, leaving other tables as read.
    pub(crate) fn write(&self, docs: &TableData) -> CoreResult<()> {
        let entry = docs.values().map(Document::to_value).collect();
        self.write_entry(Value::Array(entry))
    }

    /// Removes the table's entry from the storage, if present.
    pub(crate) fn purge(&self) -> CoreResult<()> {
        let proxy = self.proxy;
        let Some(mut raw) = proxy.storage.read()? else {
            return Ok(());
        };
        if raw.shift_remove(&proxy.table).is_some() {
            proxy.storage.write(&raw)?;
        }
        Ok(())
    }

    fn write_entry(&self, entry: Value) -> CoreResult<()> {
        let proxy = self.proxy;
        let mut raw: RawDatabase = proxy.storage.read()?.unwrap_or_default();
        raw.insert(proxy.table.clone(), entry);
        proxy.storage.write(&raw)?;
        Ok(())
    }
}
