//! The [`SqliteReader`]: one database file, one lazily opened connection,
//! one SQL statement per call.

use std::cell::OnceCell;
use std::path::Path;

use rusqlite::config::DbConfig;
use rusqlite::{Batch, Connection, Statement};
use tracing::{debug, warn};

use crate::config::ReaderConfig;
use crate::error::{ReaderError, Result};
use crate::predicate::Predicate;
use crate::schema::{quote_identifier, ColumnInfo, TableInfo};
use crate::value::{Database, Record, Value};

const LIST_TABLES_SQL: &str = r"SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'";

/// Read access to a single SQLite database file.
///
/// The connection is opened on the first call that needs it and reused
/// until the reader is dropped or [`close`](SqliteReader::close)d. A reader
/// can be moved between threads but not shared; statements run in SQLite's
/// autocommit mode and block until they complete.
#[derive(Debug)]
pub struct SqliteReader {
    config: ReaderConfig,
    connection: OnceCell<Connection>,
}

impl SqliteReader {
    /// Create a read-only reader for the database at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(ReaderConfig::new(path.as_ref()))
    }

    /// Create a reader from a full configuration.
    pub fn with_config(config: ReaderConfig) -> Result<Self> {
        if config.db_path.as_os_str().is_empty() {
            return Err(ReaderError::EmptyPath);
        }
        Ok(Self {
            config,
            connection: OnceCell::new(),
        })
    }

    /// Path of the bound database file.
    pub fn path(&self) -> &Path {
        &self.config.db_path
    }

    /// Configuration the reader was created with.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Close the connection, if one was opened, reporting any error SQLite
    /// raises while doing so.
    pub fn close(mut self) -> Result<()> {
        match self.connection.take() {
            Some(conn) => conn.close().map_err(|(_, err)| ReaderError::from(err)),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Database structure
    // ------------------------------------------------------------------

    /// Names of all user tables, in catalog order.
    pub fn tables(&self) -> Result<Vec<String>> {
        self.query_rows(LIST_TABLES_SQL, |row| row.get(0))
    }

    /// Columns of `table_name` as reported by `PRAGMA table_info`.
    pub fn structure_of_table(&self, table_name: &str) -> Result<Vec<ColumnInfo>> {
        check_table_name(table_name)?;
        let sql = format!("PRAGMA table_info({})", quote_identifier(table_name));
        let columns = self.query_rows(&sql, ColumnInfo::from_row)?;
        if columns.is_empty() {
            return Err(ReaderError::TableNotFound(table_name.to_string()));
        }
        Ok(columns)
    }

    /// Name and columns of `table_name` as a single descriptor.
    pub fn table_info(&self, table_name: &str) -> Result<TableInfo> {
        let columns = self.structure_of_table(table_name)?;
        Ok(TableInfo::new(table_name, columns))
    }

    /// Column names of `table_name`, in declaration order.
    pub fn columns_for_table(&self, table_name: &str) -> Result<Vec<String>> {
        Ok(self
            .structure_of_table(table_name)?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    // ------------------------------------------------------------------
    // Number of rows
    // ------------------------------------------------------------------

    /// Number of rows in `table`, optionally restricted by `predicate`.
    pub fn number_of_rows_in_table(
        &self,
        table: &str,
        predicate: Option<&Predicate>,
    ) -> Result<i64> {
        check_table_name(table)?;
        let mut sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
        push_where(&mut sql, predicate)?;
        self.query_count(&sql)
    }

    /// Number of rows `query` returns.
    ///
    /// Queries that can be nested are counted with `SELECT COUNT(*)`; the
    /// rest (`PRAGMA`s, for instance) are stepped through and counted.
    pub fn number_of_rows_for_query(&self, query: &str) -> Result<i64> {
        let conn = self.connection()?;
        let mut stmt = self.prepare_single(conn, query)?;
        // The newline keeps a trailing `--` comment from swallowing the paren.
        let wrapped = format!("SELECT COUNT(*) FROM (\n{}\n)", trim_statement(query));
        debug!(sql = %wrapped, "executing count");
        match conn.prepare(&wrapped) {
            Ok(mut count_stmt) => count_stmt
                .query_row([], |row| row.get(0))
                .map_err(|e| surface(self.path(), &wrapped, e)),
            Err(err) => {
                debug!(error = %err, "query cannot be nested, stepping through its rows");
                count_rows(&mut stmt).map_err(|e| surface(self.path(), query, e))
            }
        }
    }

    // ------------------------------------------------------------------
    // Fetching rows
    // ------------------------------------------------------------------

    /// Run an arbitrary query and return every row it produces.
    ///
    /// `query` must hold exactly one statement; trailing whitespace,
    /// semicolons and comments are allowed.
    pub fn fetch_rows_with_query(&self, query: &str) -> Result<Vec<Record>> {
        self.fetch_records(query)
    }

    /// Fetch rows from `table_name`. An empty `columns` slice selects every
    /// column.
    pub fn fetch_rows_from_table(
        &self,
        table_name: &str,
        columns: &[&str],
        predicate: Option<&Predicate>,
    ) -> Result<Vec<Record>> {
        check_table_name(table_name)?;
        let projection = if columns.is_empty() {
            "*".to_string()
        } else {
            columns
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut sql = format!(
            "SELECT {} FROM {}",
            projection,
            quote_identifier(table_name)
        );
        push_where(&mut sql, predicate)?;
        self.fetch_records(&sql)
    }

    /// Load every user table into memory.
    ///
    /// There is no size guard; only use this on databases that comfortably
    /// fit in memory.
    pub fn fetch_all_tables(&self) -> Result<Database> {
        let mut database = Database::new();
        for table in self.tables()? {
            let rows = self.fetch_rows_from_table(&table, &[], None)?;
            database.insert(table, rows);
        }
        Ok(database)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn connection(&self) -> Result<&Connection> {
        if let Some(conn) = self.connection.get() {
            return Ok(conn);
        }
        debug!(
            path = %self.config.db_path.display(),
            read_only = self.config.read_only,
            "opening sqlite database"
        );
        let conn = Connection::open_with_flags(&self.config.db_path, self.config.open_flags())
            .and_then(|conn| {
                // Double-quoted identifiers must never fall back to string literals.
                conn.set_db_config(DbConfig::SQLITE_DBCONFIG_DQS_DML, false)?;
                conn.set_db_config(DbConfig::SQLITE_DBCONFIG_DQS_DDL, false)?;
                Ok(conn)
            })
            .map_err(|e| surface(&self.config.db_path, "<open>", e))?;
        Ok(self.connection.get_or_init(|| conn))
    }

    /// Prepares the one statement in `sql`, rejecting empty input and
    /// anything after the first statement.
    fn prepare_single<'c>(&self, conn: &'c Connection, sql: &str) -> Result<Statement<'c>> {
        let mut batch = Batch::new(conn, sql);
        let stmt = match batch.next() {
            Ok(Some(stmt)) => stmt,
            Ok(None) => return Err(ReaderError::EmptyQuery),
            Err(e) => return Err(surface(self.path(), sql, e)),
        };
        match batch.next() {
            Ok(None) => Ok(stmt),
            _ => Err(ReaderError::MultipleStatements),
        }
    }

    fn query_rows<T, F>(&self, sql: &str, map: F) -> Result<Vec<T>>
    where
        F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.connection()?;
        debug!(sql = %sql, "executing query");
        let run = || -> rusqlite::Result<Vec<T>> {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map([], map)?;
            rows.collect()
        };
        run().map_err(|e| surface(&self.config.db_path, sql, e))
    }

    fn query_count(&self, sql: &str) -> Result<i64> {
        let conn = self.connection()?;
        debug!(sql = %sql, "executing count");
        conn.query_row(sql, [], |row| row.get(0))
            .map_err(|e| surface(&self.config.db_path, sql, e))
    }

    fn fetch_records(&self, sql: &str) -> Result<Vec<Record>> {
        let conn = self.connection()?;
        debug!(sql = %sql, "fetching rows");
        let mut stmt = self.prepare_single(conn, sql)?;
        read_records(&mut stmt).map_err(|e| surface(&self.config.db_path, sql, e))
    }
}

/// Reads every row; a repeated column name keeps its first position and
/// the later value.
fn read_records(stmt: &mut Statement<'_>) -> rusqlite::Result<Vec<Record>> {
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Record::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            record.insert(name.clone(), Value::from(row.get_ref(i)?));
        }
        records.push(record);
    }
    Ok(records)
}

fn count_rows(stmt: &mut Statement<'_>) -> rusqlite::Result<i64> {
    let mut rows = stmt.query([])?;
    let mut count = 0;
    while rows.next()?.is_some() {
        count += 1;
    }
    Ok(count)
}

fn check_table_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ReaderError::EmptyTableName);
    }
    Ok(())
}

fn push_where(sql: &mut String, predicate: Option<&Predicate>) -> Result<()> {
    if let Some(predicate) = predicate {
        sql.push_str(" WHERE ");
        sql.push_str(&predicate.to_sql()?);
    }
    Ok(())
}

/// Strips trailing whitespace and semicolons so the query can be nested.
fn trim_statement(query: &str) -> &str {
    query.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

fn surface(path: &Path, sql: &str, err: rusqlite::Error) -> ReaderError {
    warn!(path = %path.display(), sql = %sql, error = %err, "sqlite error");
    ReaderError::Sqlite(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_rejected() {
        assert!(matches!(SqliteReader::new(""), Err(ReaderError::EmptyPath)));
    }

    #[test]
    fn test_trim_statement() {
        assert_eq!(trim_statement("SELECT 1;"), "SELECT 1");
        assert_eq!(trim_statement("SELECT 1 ; \n"), "SELECT 1");
        assert_eq!(trim_statement("SELECT ';'"), "SELECT ';'");
    }

    #[test]
    fn test_push_where() {
        let mut sql = "SELECT * FROM \"t\"".to_string();
        push_where(&mut sql, None).unwrap();
        assert_eq!(sql, "SELECT * FROM \"t\"");

        push_where(&mut sql, Some(&Predicate::eq("id", 1))).unwrap();
        assert_eq!(sql, "SELECT * FROM \"t\" WHERE \"id\" = 1");
    }

    #[test]
    fn test_empty_table_name_rejected_before_opening() {
        // The path does not exist; the name check must fire first.
        let reader = SqliteReader::new("/nonexistent/dir/db.sqlite").unwrap();
        assert!(matches!(
            reader.structure_of_table(""),
            Err(ReaderError::EmptyTableName)
        ));
        assert!(matches!(
            reader.number_of_rows_in_table("", None),
            Err(ReaderError::EmptyTableName)
        ));
        assert!(matches!(
            reader.fetch_rows_from_table("", &[], None),
            Err(ReaderError::EmptyTableName)
        ));
    }

    #[test]
    fn test_open_failure_is_an_error() {
        let reader = SqliteReader::new("/nonexistent/dir/db.sqlite").unwrap();
        let err = reader.tables().unwrap_err();
        assert_eq!(err.error_code(), "SQLITE_CANTOPEN");
    }
}
