//! Least-recently-used cache of query results.

use crate::document::Document;
use crate::query::Predicate;
use indexmap::IndexMap;

/// Bounded map from predicates to the documents they matched.
///
/// Entries are kept in recency order: index 0 is the least recently used.
/// Both lookups and stores refresh an entry; storing past capacity evicts
/// from the front.
#[derive(Debug)]
pub(crate) struct QueryCache {
    capacity: usize,
    entries: IndexMap<Predicate, Vec<Document>>,
}

impl QueryCache {
    /// Creates a cache holding at most `capacity` results (at least one).
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: IndexMap::new(),
        }
    }

    /// Returns a copy of the result cached for `predicate`.
    pub(crate) fn lookup(&mut self, predicate: &Predicate) -> Option<Vec<Document>> {
        let index = self.entries.get_index_of(predicate)?;
        let last = self.entries.len() - 1;
        self.entries.move_index(index, last);
        self.entries.get_index(last).map(|(_, docs)| docs.clone())
    }

    /// Caches `docs` as the result of `predicate`.
    pub(crate) fn store(&mut self, predicate: Predicate, docs: Vec<Document>) {
        self.entries.shift_remove(&predicate);
        self.entries.insert(predicate, docs);
        while self.entries.len() > self.capacity {
            self.entries.shift_remove_index(0);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}
