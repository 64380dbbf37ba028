//! Dump command implementation.

use super::{existing_table, open_existing, print_documents};
use std::path::Path;

/// Runs the dump command.
pub fn run(path: &Path, table: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_existing(path)?;
    let docs = existing_table(&db, table)?.all()?;
    print_documents(&docs, format)?;
    db.close()?;
    Ok(())
}
