//! # Flata Core
//!
//! Embedded document store engine for Flata.
//!
//! This crate provides:
//! - [`Database`]: the handle that owns a storage and hands out tables
//! - [`Table`]: documents with auto-assigned identities, predicate search,
//!   updates and removal
//! - [`query`]: composable, hashable predicates
//! - A per-table LRU cache of query results, emptied on every write
//!
//! Storages live in `flata_storage`: the whole database is one JSON object
//! mapping table names to arrays of documents.
//!
//! ## Example
//!
//! ```rust
//! use flata_core::{query::field, Database, Selector, Update};
//! use serde_json::json;
//!
//! let db = Database::open_in_memory();
//! let fruits = db.table("fruits").unwrap();
//!
//! fruits
//!     .insert_multiple([
//!         json!({"name": "apple", "stock": 3}),
//!         json!({"name": "pear", "stock": 0}),
//!     ])
//!     .unwrap();
//!
//! let empty = field("stock").eq(0);
//! assert_eq!(fruits.count(&empty).unwrap(), 1);
//!
//! fruits
//!     .update(Update::merge(&json!({"stock": 10})).unwrap(), empty.clone())
//!     .unwrap();
//! assert_eq!(fruits.count(&empty).unwrap(), 0);
//!
//! fruits.remove(Selector::ids([1u64])).unwrap();
//! assert_eq!(fruits.len().unwrap(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod database;
mod document;
mod error;
pub mod operations;
mod proxy;
pub mod query;
mod table;

pub use config::{TableOptions, DEFAULT_CACHE_SIZE, DEFAULT_ID_FIELD};
pub use database::{Database, DatabaseBuilder, TableFactory};
pub use document::{DocId, Document, Fields};
pub use error::{CoreError, CoreResult};
pub use proxy::StorageProxy;
pub use table::{Affected, Selector, Table, Update};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
