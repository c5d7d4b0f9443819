//! Read access to SQLite database files.
//!
//! # Intention
//!
//! - List tables, describe their columns, count rows and fetch rows as
//!   ordered column-name-to-value records.
//! - Filter rows with structured [`Predicate`]s that render to safely quoted
//!   SQL instead of hand-built strings.
//! - Surface every SQLite failure as a [`ReaderError`]; never panic on a bad
//!   query or a missing table.
//!
//! # Architectural Boundaries
//!
//! - SQLite itself (parsing, planning, storage, locking) is `rusqlite`'s job.
//! - One statement per call, autocommit, no caching and no transactions.
//!
//! # Example
//!
//! ```no_run
//! use rust_sqlite_reader::{Predicate, SqliteReader};
//!
//! # fn main() -> rust_sqlite_reader::Result<()> {
//! let reader = SqliteReader::new("people.sqlite")?;
//! for table in reader.tables()? {
//!     println!("{}: {} rows", table, reader.number_of_rows_in_table(&table, None)?);
//! }
//! let adults = reader.fetch_rows_from_table(
//!     "people",
//!     &["first_name", "birth_year"],
//!     Some(&Predicate::le("birth_year", 2006)),
//! )?;
//! # let _ = adults;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod predicate;
pub mod reader;
pub mod schema;
pub mod value;

pub use config::ReaderConfig;
pub use error::{ReaderError, Result};
pub use predicate::{Predicate, QueryOperator};
pub use reader::SqliteReader;
pub use schema::{ColumnInfo, TableInfo};
pub use value::{Database, Record, Value};
