//! Benchmark utilities.

use flata_core::{Database, Table};
use rand::Rng;
use serde_json::{json, Value};
use std::sync::Arc;

/// Generate a random document with a few scalar fields and a short list.
pub fn random_document() -> Value {
    let mut rng = rand::thread_rng();
    let name: String = (0..8)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect();
    json!({
        "name": name,
        "age": rng.gen_range(0..100),
        "score": rng.gen::<f64>(),
        "active": rng.gen_bool(0.5),
        "tags": (0..rng.gen_range(0..4)).map(|i| format!("tag{i}")).collect::<Vec<_>>(),
    })
}

/// Generate `count` random documents.
pub fn random_documents(count: usize) -> Vec<Value> {
    (0..count).map(|_| random_document()).collect()
}

/// Open an in-memory database whose table `bench` holds `count` documents.
pub fn populated_table(count: usize) -> (Database, Arc<Table>) {
    let db = Database::open_in_memory();
    let table = db.table("bench").expect("Failed to open table");
    table
        .insert_multiple(random_documents(count))
        .expect("Failed to insert documents");
    (db, table)
}
