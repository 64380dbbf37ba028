//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use flata_core::Database;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test database with automatic cleanup.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestDatabase {
    /// Creates a new in-memory test database.
    pub fn memory() -> Self {
        Self {
            db: Database::open_in_memory(),
            temp_dir: None,
        }
    }

    /// Creates a new database backed by a JSON file in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open(temp_dir.path().join("db.json"))
            .expect("Failed to open file database");

        Self {
            db,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the database file if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join("db.json"))
    }

    /// Closes the database and opens the same file again.
    ///
    /// # Panics
    ///
    /// Panics for in-memory databases, which do not survive closing.
    #[must_use]
    pub fn reopen(self) -> Self {
        let path = self.path().expect("Only file databases can be reopened");
        let Self { db, temp_dir } = self;
        db.close().expect("Failed to close database");
        drop(db);

        Self {
            db: Database::open(path).expect("Failed to reopen file database"),
            temp_dir,
        }
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary in-memory database.
///
/// # Example
///
/// ```rust
/// use flata_testkit::with_temp_db;
///
/// with_temp_db(|db| {
///     let table = db.table("test").unwrap();
///     table.insert(&serde_json::json!({"a": 1})).unwrap();
/// });
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::memory();
    f(&test_db.db)
}

/// Runs a test with a temporary file-based database.
pub fn with_file_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database, &Path) -> R,
{
    let test_db = TestDatabase::file();
    let path = test_db.path().expect("File database should have a path");
    f(&test_db.db, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use serde_json::json;

    /// Creates a database whose default table holds three documents
    /// `{"char": "a"|"b"|"c", "int": 1}` with identities 1 to 3.
    pub fn chars_database() -> TestDatabase {
        let test_db = TestDatabase::memory();
        populate_chars(&test_db.db);
        test_db
    }

    /// Like [`chars_database`], backed by a temporary file.
    pub fn chars_file_database() -> TestDatabase {
        let test_db = TestDatabase::file();
        populate_chars(&test_db.db);
        test_db
    }

    /// Creates a database with `count` documents `{"index": i}` in table `test`.
    pub fn populated_database(count: usize) -> TestDatabase {
        let test_db = TestDatabase::memory();
        let table = test_db.db.table("test").expect("Failed to open table");
        table
            .insert_multiple((0..count).map(|i| json!({"index": i})))
            .expect("Failed to insert documents");
        test_db
    }

    /// Creates a database with `table_count` tables holding one document each.
    pub fn multi_table_database(table_count: usize) -> (TestDatabase, Vec<String>) {
        let test_db = TestDatabase::memory();
        let mut names = Vec::with_capacity(table_count);

        for i in 0..table_count {
            let name = format!("table_{i}");
            test_db
                .db
                .table(&name)
                .expect("Failed to open table")
                .insert(&json!({"table": i}))
                .expect("Failed to insert document");
            names.push(name);
        }

        (test_db, names)
    }

    fn populate_chars(db: &Database) {
        db.table("_default")
            .expect("Failed to open table")
            .insert_multiple([
                json!({"char": "a", "int": 1}),
                json!({"char": "b", "int": 1}),
                json!({"char": "c", "int": 1}),
            ])
            .expect("Failed to insert documents");
    }
}
