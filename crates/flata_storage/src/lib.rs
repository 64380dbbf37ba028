//! # Flata Storage
//!
//! Storage trait and implementations for Flata.
//!
//! A storage holds the **whole database** as one JSON object: every top-level
//! key is a table name and every value is that table's array of documents.
//! Storages do not interpret tables or documents; the table engine in
//! `flata_core` owns that.
//!
//! ## Design Principles
//!
//! - Storages read and write the entire database at once
//! - `write` fully replaces prior content
//! - Must be `Send + Sync` so one storage can back several tables
//! - `close` is called at most once by its owner
//!
//! ## Available Storages
//!
//! - [`MemoryStorage`] - For testing and ephemeral databases
//! - [`JsonStorage`] - A single JSON file on disk
//! - [`CachingMiddleware`] - Wrapper that buffers writes to another storage
//!
//! ## Example
//!
//! ```rust
//! use flata_storage::{MemoryStorage, RawDatabase, Storage};
//! use serde_json::json;
//!
//! let storage = MemoryStorage::new();
//! assert!(storage.read().unwrap().is_none());
//!
//! let mut data = RawDatabase::new();
//! data.insert("users".into(), json!([{"name": "alice", "id": 1}]));
//! storage.write(&data).unwrap();
//! assert_eq!(storage.read().unwrap(), Some(data));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod json;
mod memory;
mod middleware;

pub use backend::{RawDatabase, Storage};
pub use error::{StorageError, StorageResult};
pub use json::{JsonStorage, JsonStorageConfig};
pub use memory::MemoryStorage;
pub use middleware::{CachingMiddleware, DEFAULT_WRITE_CACHE_SIZE};
