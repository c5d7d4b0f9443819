//! `sqlite-reader`: inspect a SQLite database file from the command line.
//!
//! Structured output (schemas, rows, dumps) is printed as JSON on stdout;
//! diagnostics go to stderr through `tracing` (filtered by `RUST_LOG`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_sqlite_reader::{ReaderConfig, SqliteReader};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Inspect the tables and rows of a SQLite database.
#[derive(Parser)]
#[command(name = "sqlite-reader", version, about)]
struct Cli {
    /// Path to the SQLite database file.
    db: PathBuf,

    /// Open the file read-write instead of read-only.
    #[arg(long)]
    read_write: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List user tables with their row counts.
    Tables,

    /// Show the structure of a table as JSON.
    Schema { table: String },

    /// List the column names of a table.
    Columns { table: String },

    /// Count the rows of a table.
    Count { table: String },

    /// Print the rows of a table as JSON.
    Rows {
        table: String,

        /// Comma-separated subset of columns to select.
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Run a query and print its rows as JSON.
    Query { sql: String },

    /// Count the rows a query returns.
    CountQuery { sql: String },

    /// Print every table and its rows as JSON.
    Dump,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing("warn");
    let cli = Cli::parse();

    let config = ReaderConfig::new(&cli.db).with_read_only(!cli.read_write);
    let reader = SqliteReader::with_config(config)
        .with_context(|| format!("invalid database path {}", cli.db.display()))?;

    match cli.command {
        Commands::Tables => cmd_tables(&reader)?,
        Commands::Schema { table } => print_json(&reader.table_info(&table)?)?,
        Commands::Columns { table } => {
            for column in reader.columns_for_table(&table)? {
                println!("{}", column);
            }
        }
        Commands::Count { table } => println!("{}", reader.number_of_rows_in_table(&table, None)?),
        Commands::Rows { table, columns } => {
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            print_json(&reader.fetch_rows_from_table(&table, &columns, None)?)?
        }
        Commands::Query { sql } => print_json(&reader.fetch_rows_with_query(&sql)?)?,
        Commands::CountQuery { sql } => println!("{}", reader.number_of_rows_for_query(&sql)?),
        Commands::Dump => print_json(&reader.fetch_all_tables()?)?,
    }

    reader.close().context("failed to close database")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: tables
// ---------------------------------------------------------------------------

fn cmd_tables(reader: &SqliteReader) -> Result<()> {
    for table in reader.tables()? {
        let rows = reader
            .number_of_rows_in_table(&table, None)
            .with_context(|| format!("failed to count rows of {}", table))?;
        println!("{}\t{}", table, rows);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Initialize the tracing subscriber with the given default log level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
