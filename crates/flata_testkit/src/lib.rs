//! # Flata Testkit
//!
//! Test utilities for Flata.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - Property-based test generators using proptest
//!
//! Behavior tests spanning the storage and core crates live in this crate's
//! `tests/` directory.
//!
//! ## Usage
//!
//! ```rust
//! use flata_testkit::prelude::*;
//!
//! with_temp_db(|db| {
//!     let table = db.table("test").unwrap();
//!     assert!(table.is_empty().unwrap());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
