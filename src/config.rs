use std::path::PathBuf;

use rusqlite::OpenFlags;
use serde::{Deserialize, Serialize};

/// SQLite reader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Path to the SQLite database file
    pub db_path: PathBuf,
    /// Open the file read-only. When false the file is opened read-write,
    /// but it is never created.
    #[serde(default = "default_read_only")]
    pub read_only: bool,
}

fn default_read_only() -> bool {
    true
}

impl ReaderConfig {
    /// Create a read-only config for the given path
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            read_only: default_read_only(),
        }
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub(crate) fn open_flags(&self) -> OpenFlags {
        let mode = if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
        };
        mode | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX
    }
}
