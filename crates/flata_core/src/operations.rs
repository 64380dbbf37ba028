//! Ready-made transforms for [`Table::update`](crate::Table::update).
//!
//! ```rust
//! use flata_core::{operations, query::field, Database};
//! use serde_json::json;
//!
//! let db = Database::open_in_memory();
//! let table = db.table("counters").unwrap();
//! table.insert(&json!({"name": "visits", "count": 1})).unwrap();
//!
//! table.update(operations::increment("count"), field("name").eq("visits")).unwrap();
//! let doc = table.get(&field("name").eq("visits")).unwrap().unwrap();
//! assert_eq!(doc["count"], 2);
//! ```

use crate::table::Update;
use serde_json::{Number, Value};

/// Removes `field` from each document.
pub fn delete(field: impl Into<String>) -> Update<'static> {
    let field = field.into();
    Update::transform(move |doc| {
        doc.shift_remove(&field);
    })
}

/// Adds one to the numeric `field`. Missing or non-numeric values are left
/// untouched.
pub fn increment(field: impl Into<String>) -> Update<'static> {
    add(field, 1)
}

/// Subtracts one from the numeric `field`. Missing or non-numeric values are
/// left untouched.
pub fn decrement(field: impl Into<String>) -> Update<'static> {
    add(field, -1)
}

fn add(field: impl Into<String>, delta: i64) -> Update<'static> {
    let field = field.into();
    Update::transform(move |doc| {
        if let Some(Value::Number(n)) = doc.get_mut(&field) {
            if let Some(sum) = add_number(n, delta) {
                *n = sum;
            }
        }
    })
}

fn add_number(n: &Number, delta: i64) -> Option<Number> {
    if let Some(i) = n.as_i64() {
        if let Some(sum) = i.checked_add(delta) {
            return Some(sum.into());
        }
    }
    if let Some(u) = n.as_u64() {
        if let Some(sum) = u.checked_add_signed(delta) {
            return Some(sum.into());
        }
    }
    n.as_f64().and_then(|f| Number::from_f64(f + delta as f64))
}
