//! Tables: named collections of documents.

use crate::cache::QueryCache;
use crate::config::TableOptions;
use crate::document::{to_fields, DocId, Document, Fields};
use crate::error::{CoreError, CoreResult};
use crate::proxy::{Cycle, StorageProxy, TableData};
use crate::query::Predicate;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Which documents an update or removal applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every document matching the predicate.
    Cond(Predicate),
    /// The listed identities. Identities not in the table are skipped.
    Ids(Vec<DocId>),
}

impl Selector {
    /// Selects documents by identity.
    pub fn ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DocId>,
    {
        Self::Ids(ids.into_iter().map(Into::into).collect())
    }
}

impl From<Predicate> for Selector {
    fn from(cond: Predicate) -> Self {
        Self::Cond(cond)
    }
}

impl From<&Predicate> for Selector {
    fn from(cond: &Predicate) -> Self {
        Self::Cond(cond.clone())
    }
}

impl From<DocId> for Selector {
    fn from(id: DocId) -> Self {
        Self::Ids(vec![id])
    }
}

/// A change applied to each selected document.
pub enum Update<'a> {
    /// Sets each listed field, keeping the others.
    Merge(Fields),
    /// Mutates the document in place.
    ///
    /// Removing the identity field deletes the document; changing it is
    /// undone.
    Transform(Box<dyn FnMut(&mut Fields) + 'a>),
}

impl<'a> Update<'a> {
    /// Builds a merge from anything that serializes to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `fields` is not an object, or a type
    /// error if it cannot be represented as JSON.
    pub fn merge<T: Serialize + ?Sized>(fields: &T) -> CoreResult<Self> {
        Ok(Self::Merge(to_fields(fields)?))
    }

    /// Builds an in-place transform.
    ///
    /// The closure runs while the database's storage cycle and the table's
    /// state are locked. Neither lock is reentrant: calling back into any
    /// table of the same database from the closure deadlocks.
    pub fn transform(f: impl FnMut(&mut Fields) + 'a) -> Self {
        Self::Transform(Box::new(f))
    }

    fn apply(&mut self, fields: &mut Fields) {
        match self {
            Self::Merge(changes) => {
                for (key, value) in changes.iter() {
                    fields.insert(key.clone(), value.clone());
                }
            }
            Self::Transform(f) => f(fields),
        }
    }
}

impl std::fmt::Debug for Update<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merge(fields) => f.debug_tuple("Merge").field(fields).finish(),
            Self::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// Result of an update or removal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Affected {
    /// Identities of every selected document, in processing order.
    pub ids: Vec<DocId>,
    /// Selected documents still present afterwards, as they now are.
    pub documents: Vec<Document>,
}

#[derive(Debug)]
struct TableState {
    last_id: u64,
    cache: QueryCache,
}

/// A named collection of documents with a result cache.
///
/// Every operation runs as one read-modify-write cycle against the storage
/// and takes `&self`; tables are shared between threads through `Arc`.
#[derive(Debug)]
pub struct Table {
    proxy: StorageProxy,
    state: Mutex<TableState>,
}

impl Table {
    /// Opens a table over `proxy`.
    ///
    /// Reads the table once, creating its entry if needed, and resumes the
    /// identity counter after the highest identity present.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero cache size or an empty identity
    /// field, and a data error if the persisted entry is corrupted.
    pub fn open(proxy: StorageProxy, options: &TableOptions) -> CoreResult<Self> {
        if options.cache_size == 0 {
            return Err(CoreError::validation("cache size must be positive"));
        }
        if proxy.id_field().is_empty() {
            return Err(CoreError::validation("identity field must not be empty"));
        }

        let last_id = {
            let cycle = proxy.begin();
            max_id(&cycle.read()?)
        };
        debug!(table = proxy.table_name(), last_id, "opened table");

        Ok(Self {
            state: Mutex::new(TableState {
                last_id,
                cache: QueryCache::new(options.cache_size),
            }),
            proxy,
        })
    }

    /// Returns the table's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.proxy.table_name()
    }

    /// Returns the name of the identity field.
    #[must_use]
    pub fn id_field(&self) -> &str {
        self.proxy.id_field()
    }

    /// Returns the last identity handed out by this table.
    #[must_use]
    pub fn last_id(&self) -> DocId {
        DocId(self.state.lock().last_id)
    }

    /// Inserts a document and returns it with its new identity.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `doc` is not a JSON object; no identity
    /// is consumed in that case.
    pub fn insert<T: Serialize + ?Sized>(&self, doc: &T) -> CoreResult<Document> {
        let fields = to_fields(doc)?;
        let mut inserted = self.insert_fields(vec![fields])?;
        inserted
            .pop()
            .ok_or_else(|| CoreError::data(self.name(), "insert produced no document"))
    }

    /// Inserts several documents in one write, in iteration order.
    ///
    /// # Errors
    ///
    /// Every document is validated before any identity is assigned: one
    /// invalid document rejects the whole batch.
    pub fn insert_multiple<I, T>(&self, docs: I) -> CoreResult<Vec<Document>>
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        let fields = docs
            .into_iter()
            .map(|doc| to_fields(&doc))
            .collect::<CoreResult<Vec<_>>>()?;
        self.insert_fields(fields)
    }

    fn insert_fields(&self, batch: Vec<Fields>) -> CoreResult<Vec<Document>> {
        let cycle = self.proxy.begin();
        let mut state = self.state.lock();
        let mut docs = cycle.read()?;

        // Another handle on the same storage may have inserted meanwhile.
        state.last_id = state.last_id.max(max_id(&docs));

        let mut inserted = Vec::with_capacity(batch.len());
        for mut fields in batch {
            state.last_id += 1;
            let id = DocId(state.last_id);
            fields.insert(self.id_field().to_string(), Value::from(id.as_u64()));
            let doc = Document::new(id, fields);
            docs.insert(id, doc.clone());
            inserted.push(doc);
        }

        trace!(table = self.name(), count = inserted.len(), "inserting documents");
        self.commit(&cycle, &mut state, &docs)?;
        Ok(inserted)
    }

    /// Returns every document, in storage order.
    ///
    /// # Errors
    ///
    /// Returns storage and data errors.
    pub fn all(&self) -> CoreResult<Vec<Document>> {
        let docs = self.proxy.begin().read()?;
        Ok(docs.into_values().collect())
    }

    /// Returns the number of documents.
    ///
    /// # Errors
    ///
    /// Returns storage and data errors.
    pub fn len(&self) -> CoreResult<usize> {
        Ok(self.proxy.begin().read()?.len())
    }

    /// Returns whether the table holds no documents.
    ///
    /// # Errors
    ///
    /// Returns storage and data errors.
    pub fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns the documents matching `cond`, in storage order.
    ///
    /// Results are cached per predicate until the next write through this
    /// table. The caller gets its own copy and cannot alter the cache.
    ///
    /// # Errors
    ///
    /// Returns storage and data errors.
    pub fn search(&self, cond: &Predicate) -> CoreResult<Vec<Document>> {
        let cycle = self.proxy.begin();
        let mut state = self.state.lock();

        if let Some(hit) = state.cache.lookup(cond) {
            trace!(table = self.name(), %cond, "query cache hit");
            return Ok(hit);
        }

        let found: Vec<Document> = cycle
            .read()?
            .into_values()
            .filter(|doc| cond.evaluate(doc.fields()))
            .collect();
        trace!(table = self.name(), %cond, matched = found.len(), "query evaluated");

        state.cache.store(cond.clone(), found.clone());
        Ok(found)
    }

    /// Returns the first document matching `cond`.
    ///
    /// # Errors
    ///
    /// Returns storage and data errors.
    pub fn get(&self, cond: &Predicate) -> CoreResult<Option<Document>> {
        let docs = self.proxy.begin().read()?;
        Ok(docs.into_values().find(|doc| cond.evaluate(doc.fields())))
    }

    /// Returns the document with identity `id`.
    ///
    /// # Errors
    ///
    /// Returns storage and data errors.
    pub fn get_by_id(&self, id: impl Into<DocId>) -> CoreResult<Option<Document>> {
        let mut docs = self.proxy.begin().read()?;
        Ok(docs.shift_remove(&id.into()))
    }

    /// Returns whether any document matches `cond`.
    ///
    /// # Errors
    ///
    /// Returns storage and data errors.
    pub fn contains(&self, cond: &Predicate) -> CoreResult<bool> {
        Ok(self.get(cond)?.is_some())
    }

    /// Returns whether any of `ids` is present.
    ///
    /// # Errors
    ///
    /// Returns storage and data errors.
    pub fn contains_ids<I, T>(&self, ids: I) -> CoreResult<bool>
    where
        I: IntoIterator<Item = T>,
        T: Into<DocId>,
    {
        let docs = self.proxy.begin().read()?;
        Ok(ids.into_iter().any(|id| docs.contains_key(&id.into())))
    }

    /// Returns the number of documents matching `cond`.
    ///
    /// # Errors
    ///
    /// Returns storage and data errors.
    pub fn count(&self, cond: &Predicate) -> CoreResult<usize> {
        Ok(self.search(cond)?.len())
    }

    /// Applies `update` to the selected documents.
    ///
    /// # Errors
    ///
    /// Returns storage and data errors. Nothing is written on error.
    pub fn update<'a>(
        &self,
        mut update: Update<'a>,
        selector: impl Into<Selector>,
    ) -> CoreResult<Affected> {
        let id_field = self.id_field().to_string();
        self.process_elements(&selector.into(), |docs, id| {
            let Some(doc) = docs.get_mut(&id) else {
                return;
            };
            update.apply(doc.fields_mut());

            let id_intact = doc
                .get(&id_field)
                .map(|value| value.as_u64() == Some(id.as_u64()));
            match id_intact {
                None => {
                    docs.shift_remove(&id);
                }
                Some(true) => {}
                Some(false) => {
                    doc.fields_mut()
                        .insert(id_field.clone(), Value::from(id.as_u64()));
                }
            }
        })
    }

    /// Removes the selected documents.
    ///
    /// # Errors
    ///
    /// Returns storage and data errors.
    pub fn remove(&self, selector: impl Into<Selector>) -> CoreResult<Affected> {
        self.process_elements(&selector.into(), |docs, id| {
            docs.shift_remove(&id);
        })
    }

    /// Removes every document and restarts identities at 1.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub fn purge(&self) -> CoreResult<()> {
        let cycle = self.proxy.begin();
        let mut state = self.state.lock();
        self.commit(&cycle, &mut state, &TableData::new())?;
        state.last_id = 0;
        debug!(table = self.name(), "purged table");
        Ok(())
    }

    /// Empties the query cache.
    pub fn clear_cache(&self) {
        self.state.lock().cache.clear();
    }

    /// Returns the number of cached query results.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.state.lock().cache.len()
    }

    /// Returns the query cache capacity.
    #[must_use]
    pub fn cache_size(&self) -> usize {
        self.state.lock().cache.capacity()
    }

    /// Drops cached results and the identity counter after the table's
    /// storage entry was removed by the database.
    pub(crate) fn forget(&self) {
        let mut state = self.state.lock();
        state.cache.clear();
        state.last_id = 0;
    }

    /// Runs `mutate` once per selected identity within one cycle.
    ///
    /// A predicate selects against the documents as they were before any
    /// mutation. The cache is emptied and the result written exactly once.
    fn process_elements<F>(&self, selector: &Selector, mut mutate: F) -> CoreResult<Affected>
    where
        F: FnMut(&mut TableData, DocId),
    {
        let cycle = self.proxy.begin();
        let mut state = self.state.lock();
        let mut docs = cycle.read()?;

        let ids: Vec<DocId> = match selector {
            Selector::Ids(ids) => {
                let mut seen = HashSet::new();
                ids.iter()
                    .copied()
                    .filter(|id| docs.contains_key(id) && seen.insert(*id))
                    .collect()
            }
            Selector::Cond(cond) => docs
                .values()
                .filter(|doc| cond.evaluate(doc.fields()))
                .map(Document::id)
                .collect(),
        };

        let mut affected = Affected::default();
        for &id in &ids {
            mutate(&mut docs, id);
            if let Some(doc) = docs.get(&id) {
                affected.documents.push(doc.clone());
            }
        }
        affected.ids = ids;

        trace!(table = self.name(), selected = affected.ids.len(), "processed documents");
        self.commit(&cycle, &mut state, &docs)?;
        Ok(affected)
    }

    fn commit(
        &self,
        cycle: &Cycle<'_>,
        state: &mut TableState,
        docs: &TableData,
    ) -> CoreResult<()> {
        state.cache.clear();
        cycle.write(docs)
    }
}

fn max_id(docs: &TableData) -> u64 {
    docs.keys().map(|id| id.as_u64()).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::field;
    use flata_storage::{MemoryStorage, Storage};
    use serde_json::json;
    use std::sync::Arc;

    fn open(storage: Arc<MemoryStorage>, options: &TableOptions) -> CoreResult<Table> {
        let shared: Arc<dyn Storage> = storage;
        let proxy = StorageProxy::new(
            shared,
            Arc::new(Mutex::new(())),
            "t",
            options.id_field.clone(),
        );
        Table::open(proxy, options)
    }

    fn table() -> (Arc<MemoryStorage>, Table) {
        let storage = Arc::new(MemoryStorage::new());
        let table = open(storage.clone(), &TableOptions::default()).unwrap();
        (storage, table)
    }

    fn seeded() -> Table {
        let (_, table) = table();
        table
            .insert_multiple([
                json!({"char": "a", "int": 1}),
                json!({"char": "b", "int": 1}),
                json!({"char": "c", "int": 1}),
            ])
            .unwrap();
        table
    }

    #[test]
    fn zero_cache_size_is_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let result = open(storage, &TableOptions::new().cache_size(0));
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[test]
    fn open_materializes_entry() {
        let (storage, _) = table();
        assert_eq!(storage.data().unwrap()["t"], json!([]));
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let (storage, table) = table();
        let a = table.insert(&json!({"int": 1})).unwrap();
        let b = table.insert(&json!({"int": 1})).unwrap();
        assert_eq!(a.id(), DocId(1));
        assert_eq!(b.id(), DocId(2));
        assert_eq!(
            storage.data().unwrap()["t"],
            json!([{"int": 1, "id": 1}, {"int": 1, "id": 2}])
        );
    }

    #[test]
    fn insert_rejects_non_objects_without_consuming_ids() {
        let (_, table) = table();
        assert!(matches!(
            table.insert(&json!([1, 2])),
            Err(CoreError::Validation { .. })
        ));
        assert!(table
            .insert_multiple([json!({"a": 1}), json!("nope")])
            .is_err());
        assert_eq!(table.len().unwrap(), 0);
        assert_eq!(table.insert(&json!({"a": 1})).unwrap().id(), DocId(1));
    }

    #[test]
    fn insert_reports_unrepresentable_values_without_consuming_ids() {
        let (_, table) = table();
        table.insert(&json!({"a": 1})).unwrap();

        let mut doc = std::collections::HashMap::new();
        doc.insert((1, 2), "tuple keys cannot be JSON object keys");
        assert!(matches!(table.insert(&doc), Err(CoreError::Type { .. })));

        assert_eq!(table.len().unwrap(), 1);
        assert_eq!(table.last_id(), DocId(1));
        assert_eq!(table.insert(&json!({"a": 2})).unwrap().id(), DocId(2));
    }

    #[test]
    fn insert_multiple_assigns_consecutive_ids() {
        let (_, table) = table();
        let docs = table.insert_multiple((0..3).map(|i| json!({"n": i}))).unwrap();
        let ids: Vec<DocId> = docs.iter().map(Document::id).collect();
        assert_eq!(ids, vec![DocId(1), DocId(2), DocId(3)]);
    }

    #[test]
    fn counter_resumes_after_highest_id() {
        let mut data = flata_storage::RawDatabase::new();
        data.insert("t".into(), json!([{"id": 1}, {"id": 7}, {"id": 3}]));
        let storage = Arc::new(MemoryStorage::with_data(data));

        let table = open(storage, &TableOptions::default()).unwrap();
        assert_eq!(table.last_id(), DocId(7));
        assert_eq!(table.insert(&json!({})).unwrap().id(), DocId(8));
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let table = seeded();
        table.remove(Selector::ids([3u64])).unwrap();
        assert_eq!(table.insert(&json!({})).unwrap().id(), DocId(4));
    }

    #[test]
    fn custom_id_field() {
        let storage = Arc::new(MemoryStorage::new());
        let table = open(storage.clone(), &TableOptions::new().id_field("_not_default_id")).unwrap();
        let doc = table.insert(&json!({"int": 1})).unwrap();
        assert_eq!(doc["_not_default_id"], 1);
        assert_eq!(
            storage.data().unwrap()["t"],
            json!([{"int": 1, "_not_default_id": 1}])
        );
    }

    #[test]
    fn search_and_cache() {
        let table = seeded();
        let q = field("int").eq(1);

        assert_eq!(table.search(&q).unwrap().len(), 3);
        assert_eq!(table.cache_len(), 1);

        // Same predicate built again hits the same entry.
        assert_eq!(table.search(&field("int").eq(1)).unwrap().len(), 3);
        assert_eq!(table.cache_len(), 1);

        table.insert(&json!({"int": 1})).unwrap();
        assert_eq!(table.cache_len(), 0);
        assert_eq!(table.search(&q).unwrap().len(), 4);
    }

    #[test]
    fn search_results_are_copies() {
        let table = seeded();
        let q = field("int").eq(1);
        let mut first = table.search(&q).unwrap();
        first.clear();
        assert_eq!(table.search(&q).unwrap().len(), 3);
    }

    #[test]
    fn cache_respects_capacity() {
        let storage = Arc::new(MemoryStorage::new());
        let table = open(storage, &TableOptions::new().cache_size(2)).unwrap();
        for n in 0..5 {
            table.search(&field("n").eq(n)).unwrap();
        }
        assert_eq!(table.cache_len(), 2);
        assert_eq!(table.cache_size(), 2);
    }

    #[test]
    fn get_and_contains() {
        let table = seeded();
        let b = table.get(&field("char").eq("b")).unwrap().unwrap();
        assert_eq!(b.id(), DocId(2));
        assert!(table.get(&field("char").eq("z")).unwrap().is_none());

        assert_eq!(table.get_by_id(2u64).unwrap(), Some(b));
        assert!(table.get_by_id(99u64).unwrap().is_none());

        assert!(table.contains(&field("char").eq("a")).unwrap());
        assert!(!table.contains(&field("char").eq("z")).unwrap());
        assert!(table.contains_ids([99u64, 1]).unwrap());
        assert!(!table.contains_ids([99u64]).unwrap());
    }

    #[test]
    fn count() {
        let table = seeded();
        assert_eq!(table.count(&field("int").eq(1)).unwrap(), 3);
        assert_eq!(table.count(&field("char").eq("a")).unwrap(), 1);
    }

    #[test]
    fn update_merge_by_condition() {
        let table = seeded();
        let affected = table
            .update(Update::merge(&json!({"int": 2})).unwrap(), field("char").eq("a"))
            .unwrap();
        assert_eq!(affected.ids, vec![DocId(1)]);
        assert_eq!(affected.documents[0]["int"], 2);
        assert_eq!(table.count(&field("int").eq(1)).unwrap(), 2);
    }

    #[test]
    fn update_condition_sees_pre_mutation_state() {
        let table = seeded();
        let affected = table
            .update(Update::merge(&json!({"int": 2})).unwrap(), field("int").eq(1))
            .unwrap();
        assert_eq!(affected.ids.len(), 3);
        assert_eq!(table.count(&field("int").eq(2)).unwrap(), 3);
    }

    #[test]
    fn update_by_ids_skips_missing() {
        let table = seeded();
        let affected = table
            .update(Update::merge(&json!({"int": 2})).unwrap(), Selector::ids([1u64, 99, 3, 1]))
            .unwrap();
        assert_eq!(affected.ids, vec![DocId(1), DocId(3)]);
        assert_eq!(table.get_by_id(2u64).unwrap().unwrap()["int"], 1);
    }

    #[test]
    fn update_transform() {
        let table = seeded();
        table
            .update(
                Update::transform(|doc| {
                    doc.insert("char".into(), json!("z"));
                }),
                field("char").eq("a"),
            )
            .unwrap();
        assert!(table.contains(&field("char").eq("z")).unwrap());
    }

    #[test]
    fn transform_removing_identity_deletes_document() {
        let table = seeded();
        let affected = table
            .update(
                Update::transform(|doc| {
                    doc.remove("id");
                }),
                Selector::ids([2u64]),
            )
            .unwrap();
        assert_eq!(affected.ids, vec![DocId(2)]);
        assert!(affected.documents.is_empty());
        assert_eq!(table.len().unwrap(), 2);
        assert!(table.get_by_id(2u64).unwrap().is_none());
    }

    #[test]
    fn identity_cannot_be_rewritten() {
        let table = seeded();
        table
            .update(Update::merge(&json!({"id": 50})).unwrap(), Selector::ids([1u64]))
            .unwrap();
        let doc = table.get_by_id(1u64).unwrap().unwrap();
        assert_eq!(doc["id"], 1);
        assert!(table.get_by_id(50u64).unwrap().is_none());
    }

    #[test]
    fn remove_by_condition() {
        let table = seeded();
        let affected = table.remove(field("char").eq("b")).unwrap();
        assert_eq!(affected.ids, vec![DocId(2)]);
        assert!(affected.documents.is_empty());
        assert_eq!(table.len().unwrap(), 2);
    }

    #[test]
    fn remove_of_nothing_still_clears_cache() {
        let table = seeded();
        table.search(&field("int").eq(1)).unwrap();
        let affected = table.remove(field("char").eq("z")).unwrap();
        assert!(affected.ids.is_empty());
        assert_eq!(table.cache_len(), 0);
    }

    #[test]
    fn purge_resets_counter() {
        let table = seeded();
        table.purge().unwrap();
        assert!(table.is_empty().unwrap());
        assert_eq!(table.insert(&json!({})).unwrap().id(), DocId(1));
    }

    #[test]
    fn all_preserves_insertion_order() {
        let table = seeded();
        let chars: Vec<String> = table
            .all()
            .unwrap()
            .iter()
            .map(|doc| doc["char"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(chars, vec!["a", "b", "c"]);
    }
}
