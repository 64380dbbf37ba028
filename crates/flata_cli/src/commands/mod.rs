//! CLI command implementations.

pub mod dump;
pub mod find;
pub mod tables;

use flata_core::{Database, Document, Table};
use std::path::Path;
use std::sync::Arc;

/// Opens an existing database file.
///
/// Refuses to create a missing file.
pub(crate) fn open_existing(path: &Path) -> Result<Database, Box<dyn std::error::Error>> {
    if !path.is_file() {
        return Err(format!("No database found at {}", path.display()).into());
    }
    Ok(Database::open(path)?)
}

/// Returns a table that already exists in the file.
///
/// Opening an unknown name would materialize it, so that is checked first.
pub(crate) fn existing_table(
    db: &Database,
    name: &str,
) -> Result<Arc<Table>, Box<dyn std::error::Error>> {
    if !db.tables()?.contains(name) {
        return Err(format!("No table named '{name}'").into());
    }
    Ok(db.table(name)?)
}

/// Renders documents one per line, prefixed by their identity.
pub(crate) fn render_documents(docs: &[Document]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for doc in docs {
        out.push_str(&format!("{:>6}  {}\n", doc.id(), serde_json::to_string(doc)?));
    }
    Ok(out)
}

/// Prints documents in the requested format.
pub(crate) fn print_documents(
    docs: &[Document],
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(docs)?),
        _ => print!("{}", render_documents(docs)?),
    }
    Ok(())
}
