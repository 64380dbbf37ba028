//! Count and find command implementations.

use super::{existing_table, open_existing, print_documents};
use flata_core::query::{Predicate, Query};
use serde_json::Value;
use std::path::Path;

/// Runs the count command.
pub fn count(path: &Path, table: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_existing(path)?;
    println!("{}", existing_table(&db, table)?.len()?);
    db.close()?;
    Ok(())
}

/// Runs the find command.
pub fn run(
    path: &Path,
    table: &str,
    field: &str,
    value: &str,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_existing(path)?;
    let cond = equality(field, value);
    tracing::debug!(%cond, "searching");

    let mut docs = existing_table(&db, table)?.search(&cond)?;
    if let Some(limit) = limit {
        docs.truncate(limit);
    }
    print_documents(&docs, format)?;

    db.close()?;
    Ok(())
}

/// Builds `field == value`, where `field` may be a dotted path.
fn equality(field: &str, value: &str) -> Predicate {
    Query::path(field.split('.')).eq(parse_value(value))
}

/// Parses a command-line value as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
