//! Flata CLI
//!
//! Command-line tools for inspecting Flata JSON database files.
//!
//! # Commands
//!
//! - `tables` - List the tables stored in the file
//! - `dump` - Print every document of a table
//! - `count` - Count the documents of a table
//! - `find` - Print the documents whose field equals a value

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Flata command-line database tools.
#[derive(Parser)]
#[command(name = "flata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables stored in the database
    Tables {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print every document of a table
    Dump {
        /// Table name
        table: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Count the documents of a table
    Count {
        /// Table name
        table: String,
    },

    /// Print the documents whose field equals a value
    Find {
        /// Table name
        table: String,

        /// Field to test; nested fields are separated by dots
        field: String,

        /// Expected value as JSON (bare words are read as strings)
        value: String,

        /// Maximum number of documents to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Tables { format } => {
            let path = cli.path.ok_or("Database path required for tables")?;
            commands::tables::run(&path, &format)?;
        }
        Commands::Dump { table, format } => {
            let path = cli.path.ok_or("Database path required for dump")?;
            commands::dump::run(&path, &table, &format)?;
        }
        Commands::Count { table } => {
            let path = cli.path.ok_or("Database path required for count")?;
            commands::find::count(&path, &table)?;
        }
        Commands::Find {
            table,
            field,
            value,
            limit,
            format,
        } => {
            let path = cli.path.ok_or("Database path required for find")?;
            commands::find::run(&path, &table, &field, &value, limit, &format)?;
        }
        Commands::Version => {
            println!("Flata CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Flata Core v{}", flata_core::VERSION);
        }
    }

    Ok(())
}
