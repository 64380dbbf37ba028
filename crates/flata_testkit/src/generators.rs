//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random documents, predicates and
//! table operation sequences.

use flata_core::query::{field, Predicate};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Field names used by generated documents.
///
/// A small fixed set keeps generated predicates likely to match something.
pub const FIELD_NAMES: &[&str] = &["char", "int", "flag", "tags"];

/// Strategy for generating valid table names.
pub fn table_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z_][a-zA-Z0-9_]{0,31}").expect("Invalid regex")
}

/// Strategy for generating one of [`FIELD_NAMES`].
pub fn field_name_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(FIELD_NAMES)
}

/// Strategy for generating JSON scalars.
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i64..5).prop_map(Value::from),
        prop::string::string_regex("[a-c]{1,2}")
            .expect("Invalid regex")
            .prop_map(Value::String),
    ]
}

/// Strategy for generating documents without an identity field.
pub fn document_strategy() -> impl Strategy<Value = Value> {
    prop::collection::vec(
        (
            field_name_strategy(),
            prop_oneof![
                4 => scalar_strategy(),
                1 => prop::collection::vec(scalar_strategy(), 0..3).prop_map(Value::Array),
            ],
        ),
        0..4,
    )
    .prop_map(|pairs| {
        let mut doc = Map::new();
        for (name, value) in pairs {
            doc.insert(name.to_string(), value);
        }
        Value::Object(doc)
    })
}

/// Strategy for generating predicates over generated documents.
pub fn predicate_strategy() -> impl Strategy<Value = Predicate> {
    let leaf = prop_oneof![
        (field_name_strategy(), scalar_strategy()).prop_map(|(f, v)| field(f).eq(v)),
        (field_name_strategy(), scalar_strategy()).prop_map(|(f, v)| field(f).ne(v)),
        (field_name_strategy(), -5i64..5).prop_map(|(f, v)| field(f).lt(v)),
        (field_name_strategy(), -5i64..5).prop_map(|(f, v)| field(f).ge(v)),
        field_name_strategy().prop_map(|f| field(f).exists()),
        (field_name_strategy(), prop::collection::vec(scalar_strategy(), 0..3))
            .prop_map(|(f, vs)| field(f).any(vs)),
    ];

    leaf.prop_recursive(3, 12, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a & b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a | b),
            inner.prop_map(|p| !p),
        ]
    })
}

/// An operation on a table, for sequence-based property tests.
#[derive(Debug, Clone)]
pub enum TableOperation {
    /// Insert one document.
    Insert {
        /// Document to insert.
        doc: Value,
    },
    /// Insert several documents at once.
    InsertMultiple {
        /// Documents to insert.
        docs: Vec<Value>,
    },
    /// Merge fields into the documents matching a predicate.
    Update {
        /// Fields to merge.
        fields: Value,
        /// Selected documents.
        cond: Predicate,
    },
    /// Remove the documents matching a predicate.
    Remove {
        /// Selected documents.
        cond: Predicate,
    },
    /// Remove a document by identity (which may not exist).
    RemoveId {
        /// Identity to remove.
        id: u64,
    },
    /// Search, populating the cache.
    Search {
        /// Query to run.
        cond: Predicate,
    },
}

/// Strategy for generating table operations.
pub fn table_operation_strategy() -> impl Strategy<Value = TableOperation> {
    prop_oneof![
        4 => document_strategy().prop_map(|doc| TableOperation::Insert { doc }),
        1 => prop::collection::vec(document_strategy(), 0..4)
            .prop_map(|docs| TableOperation::InsertMultiple { docs }),
        2 => (document_strategy(), predicate_strategy())
            .prop_map(|(fields, cond)| TableOperation::Update { fields, cond }),
        1 => predicate_strategy().prop_map(|cond| TableOperation::Remove { cond }),
        1 => (1u64..20).prop_map(|id| TableOperation::RemoveId { id }),
        3 => predicate_strategy().prop_map(|cond| TableOperation::Search { cond }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<TableOperation>> {
    prop::collection::vec(table_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
