use rusqlite::Row;
use serde::Serialize;

/// One column of a table, as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Ordinal position of the column, starting at 0.
    pub cid: i64,
    pub name: String,
    /// Declared type exactly as written in `CREATE TABLE`; empty when the
    /// column was declared without one.
    pub declared_type: String,
    pub not_null: bool,
    /// Default value expression as SQL text, e.g. `'n/a'` or `CURRENT_TIMESTAMP`.
    pub default_value: Option<String>,
    /// 0 when the column is not part of the primary key, otherwise its
    /// 1-based position within the key.
    pub primary_key: i64,
}

impl ColumnInfo {
    pub fn is_nullable(&self) -> bool {
        !self.not_null
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key > 0
    }

    /// Maps a row of `PRAGMA table_info` (cid, name, type, notnull, dflt_value, pk).
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            cid: row.get("cid")?,
            name: row.get("name")?,
            declared_type: row.get::<_, Option<String>>("type")?.unwrap_or_default(),
            not_null: row.get::<_, i64>("notnull")? != 0,
            default_value: row.get("dflt_value")?,
            primary_key: row.get("pk")?,
        })
    }
}

/// A table and its columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary key columns ordered by their position within the key.
    pub fn primary_key(&self) -> Vec<&ColumnInfo> {
        let mut pk: Vec<&ColumnInfo> = self.columns.iter().filter(|c| c.is_primary_key()).collect();
        pk.sort_by_key(|c| c.primary_key);
        pk
    }
}

/// Quotes a SQLite identifier, doubling any embedded double quotes.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(cid: i64, name: &str, pk: i64) -> ColumnInfo {
        ColumnInfo {
            cid,
            name: name.to_string(),
            declared_type: "TEXT".to_string(),
            not_null: false,
            default_value: None,
            primary_key: pk,
        }
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("my table"), "\"my table\"");
        assert_eq!(quote_identifier("foo\"bar"), "\"foo\"\"bar\"");
    }

    #[test]
    fn test_composite_primary_key_order() {
        let table = TableInfo::new(
            "memberships",
            vec![column(0, "group_id", 2), column(1, "note", 0), column(2, "user_id", 1)],
        );
        let pk: Vec<&str> = table.primary_key().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(pk, vec!["user_id", "group_id"]);
        assert_eq!(table.column_names(), vec!["group_id", "note", "user_id"]);
        assert!(table.column("note").is_some_and(|c| c.is_nullable()));
        assert!(table.column("missing").is_none());
    }
}
