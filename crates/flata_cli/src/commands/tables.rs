//! Tables command implementation.

use super::open_existing;
use serde::Serialize;
use std::path::Path;

/// Summary of one table.
#[derive(Debug, Serialize)]
pub struct TableSummary {
    /// Table name.
    pub name: String,
    /// Number of documents.
    pub documents: usize,
    /// Highest identity in use.
    pub last_id: u64,
}

/// Runs the tables command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_existing(path)?;

    let mut summaries = Vec::new();
    for name in db.tables()? {
        let table = db.table(&name)?;
        summaries.push(TableSummary {
            documents: table.len()?,
            last_id: table.last_id().as_u64(),
            name,
        });
    }
    tracing::debug!(tables = summaries.len(), "listed tables");

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summaries)?),
        _ => print!("{}", render_text(&summaries)),
    }

    db.close()?;
    Ok(())
}

fn render_text(summaries: &[TableSummary]) -> String {
    if summaries.is_empty() {
        return "No tables\n".to_string();
    }

    let width = summaries.iter().map(|s| s.name.len()).max().unwrap_or(0).max(5);
    let mut out = format!("{:<width$}  {:>9}  {:>7}\n", "TABLE", "DOCUMENTS", "LAST ID");
    for summary in summaries {
        out.push_str(&format!(
            "{:<width$}  {:>9}  {:>7}\n",
            summary.name, summary.documents, summary.last_id
        ));
    }
    out
}
