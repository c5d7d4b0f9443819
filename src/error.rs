use rusqlite::ErrorCode;

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors surfaced by [`SqliteReader`](crate::SqliteReader).
///
/// Engine failures are carried verbatim in [`ReaderError::Sqlite`]; the
/// other variants cover input the reader rejects before reaching SQLite.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// The database path was empty.
    #[error("database path must not be empty")]
    EmptyPath,

    /// A table name was empty.
    #[error("table name must not be empty")]
    EmptyTableName,

    /// `PRAGMA table_info` reported no columns for the table.
    #[error("no such table: {0}")]
    TableNotFound(String),

    /// A raw query contained no statement.
    #[error("query contains no SQL statement")]
    EmptyQuery,

    /// A raw query contained more than one statement.
    #[error("query contains more than one SQL statement")]
    MultipleStatements,

    /// A predicate could not be rendered as SQL.
    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),

    /// Error reported by SQLite, including I/O and open failures.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl ReaderError {
    /// Stable, machine-readable code for the error.
    pub fn error_code(&self) -> String {
        match self {
            ReaderError::EmptyPath => "EMPTY_PATH".to_string(),
            ReaderError::EmptyTableName => "EMPTY_TABLE_NAME".to_string(),
            ReaderError::TableNotFound(_) => "TABLE_NOT_FOUND".to_string(),
            ReaderError::EmptyQuery => "EMPTY_QUERY".to_string(),
            ReaderError::MultipleStatements => "MULTIPLE_STATEMENTS".to_string(),
            ReaderError::InvalidPredicate(_) => "INVALID_PREDICATE".to_string(),
            ReaderError::Sqlite(_) => match self.engine_error() {
                Some(err) => sqlite_code_name(err.code).to_string(),
                None => "SQLITE_CLIENT_ERROR".to_string(),
            },
        }
    }

    /// SQLite extended result code, when the engine produced one.
    pub fn sqlite_extended_code(&self) -> Option<i32> {
        self.engine_error().map(|err| err.extended_code)
    }

    // Syntax errors arrive as `SqlInputError`, everything else the engine
    // reports as `SqliteFailure`.
    fn engine_error(&self) -> Option<&rusqlite::ffi::Error> {
        match self {
            ReaderError::Sqlite(rusqlite::Error::SqliteFailure(err, _))
            | ReaderError::Sqlite(rusqlite::Error::SqlInputError { error: err, .. }) => Some(err),
            _ => None,
        }
    }
}

fn sqlite_code_name(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::InternalMalfunction => "SQLITE_INTERNAL",
        ErrorCode::PermissionDenied => "SQLITE_PERM",
        ErrorCode::OperationAborted => "SQLITE_ABORT",
        ErrorCode::DatabaseBusy => "SQLITE_BUSY",
        ErrorCode::DatabaseLocked => "SQLITE_LOCKED",
        ErrorCode::OutOfMemory => "SQLITE_NOMEM",
        ErrorCode::ReadOnly => "SQLITE_READONLY",
        ErrorCode::OperationInterrupted => "SQLITE_INTERRUPT",
        ErrorCode::SystemIoFailure => "SQLITE_IOERR",
        ErrorCode::DatabaseCorrupt => "SQLITE_CORRUPT",
        ErrorCode::NotFound => "SQLITE_NOTFOUND",
        ErrorCode::DiskFull => "SQLITE_FULL",
        ErrorCode::CannotOpen => "SQLITE_CANTOPEN",
        ErrorCode::FileLockingProtocolFailed => "SQLITE_PROTOCOL",
        ErrorCode::SchemaChanged => "SQLITE_SCHEMA",
        ErrorCode::TooBig => "SQLITE_TOOBIG",
        ErrorCode::ConstraintViolation => "SQLITE_CONSTRAINT",
        ErrorCode::TypeMismatch => "SQLITE_MISMATCH",
        ErrorCode::ApiMisuse => "SQLITE_MISUSE",
        ErrorCode::NoLargeFileSupport => "SQLITE_NOLFS",
        ErrorCode::AuthorizationForStatementDenied => "SQLITE_AUTH",
        ErrorCode::ParameterOutOfRange => "SQLITE_RANGE",
        ErrorCode::NotADatabase => "SQLITE_NOTADB",
        _ => "SQLITE_ERROR",
    }
}
