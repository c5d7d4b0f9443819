use base64::Engine as _;
use indexmap::IndexMap;
use rusqlite::types::ValueRef;
use serde::{Serialize, Serializer};

/// Core value types for SQLite operations
///
/// One variant per SQLite storage class. Booleans have no storage class of
/// their own; `From<bool>` produces `Integer(0)` or `Integer(1)` the same way
/// SQLite stores them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// One fetched row: column name to value, in result-set order.
pub type Record = IndexMap<String, Value>;

/// Every user table of a database, keyed by table name in catalog order.
pub type Database = IndexMap<String, Vec<Record>>;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to `f64` so callers need not care which storage
    /// class SQLite picked for a numeric column.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Name of the storage class, as `typeof()` reports it.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            // SQLite does not validate UTF-8 on insert; keep what we can.
            ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// JSON has no byte strings, so blobs go out as base64 text.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Blob(b) => {
                serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(b))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value_ref() {
        assert_eq!(Value::from(ValueRef::Null), Value::Null);
        assert_eq!(Value::from(ValueRef::Integer(7)), Value::Integer(7));
        assert_eq!(Value::from(ValueRef::Real(1.5)), Value::Real(1.5));
        assert_eq!(
            Value::from(ValueRef::Text(b"Ann")),
            Value::Text("Ann".to_string())
        );
        assert_eq!(
            Value::from(ValueRef::Blob(&[1, 2, 3])),
            Value::Blob(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(true), Value::Integer(1));
        assert_eq!(Value::from(false), Value::Integer(0));
        assert_eq!(Value::from(3_i32), Value::Integer(3));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Integer(2).as_f64(), Some(2.0));
        assert_eq!(Value::Real(2.5).as_i64(), None);
        assert_eq!(Value::Text("a".into()).as_str(), Some("a"));
        assert_eq!(Value::Blob(vec![9]).as_blob(), Some(&[9_u8][..]));
        assert!(Value::Null.is_null());
        assert_eq!(Value::Real(0.0).type_name(), "real");
    }

    #[test]
    fn test_serialize_json() {
        let mut record = Record::new();
        record.insert("id".to_string(), Value::Integer(1));
        record.insert("name".to_string(), Value::Text("Ann".to_string()));
        record.insert("score".to_string(), Value::Real(2.5));
        record.insert("note".to_string(), Value::Null);
        record.insert("data".to_string(), Value::Blob(b"Hello".to_vec()));

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"name":"Ann","score":2.5,"note":null,"data":"SGVsbG8="}"#
        );
    }
}
