//! Structured filters rendered into SQL `WHERE` fragments.
//!
//! Literals are inlined, never concatenated raw: text is single-quoted with
//! embedded quotes doubled, blobs become `X'..'` hex literals, and field
//! names are double-quoted identifiers. Anything that cannot be expressed
//! safely (non-finite reals, NUL bytes, empty field names) is rejected with
//! [`ReaderError::InvalidPredicate`].

use crate::error::{ReaderError, Result};
use crate::schema::quote_identifier;
use crate::value::Value;

/// Query operators for building filter conditions
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Equal(Value),
    NotEqual(Value),
    GreaterThan(Value),
    GreaterThanOrEqual(Value),
    LessThan(Value),
    LessThanOrEqual(Value),
    /// SQL `LIKE` pattern (`%` and `_` wildcards, ASCII case-insensitive).
    Like(String),
    In(Vec<Value>),
    /// Inclusive range.
    Between(Value, Value),
}

/// Filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Condition { field: String, op: QueryOperator },
    IsNull(String),
    IsNotNull(String),
    /// Every child must hold; an empty list is always true.
    And(Vec<Predicate>),
    /// At least one child must hold; an empty list is always false.
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn condition(field: impl Into<String>, op: QueryOperator) -> Self {
        Predicate::Condition {
            field: field.into(),
            op,
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::Equal(value.into()))
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::NotEqual(value.into()))
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::GreaterThan(value.into()))
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::GreaterThanOrEqual(value.into()))
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::LessThan(value.into()))
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::LessThanOrEqual(value.into()))
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::condition(field, QueryOperator::Like(pattern.into()))
    }

    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::condition(
            field,
            QueryOperator::In(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn between(
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::condition(field, QueryOperator::Between(low.into(), high.into()))
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Predicate::IsNull(field.into())
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Predicate::IsNotNull(field.into())
    }

    /// Conjunction; nested `And` groups are flattened.
    pub fn and(self, other: Predicate) -> Self {
        let mut children = match self {
            Predicate::And(children) => children,
            p => vec![p],
        };
        match other {
            Predicate::And(more) => children.extend(more),
            p => children.push(p),
        }
        Predicate::And(children)
    }

    /// Disjunction; nested `Or` groups are flattened.
    pub fn or(self, other: Predicate) -> Self {
        let mut children = match self {
            Predicate::Or(children) => children,
            p => vec![p],
        };
        match other {
            Predicate::Or(more) => children.extend(more),
            p => children.push(p),
        }
        Predicate::Or(children)
    }

    pub fn negate(self) -> Self {
        match self {
            Predicate::Not(inner) => *inner,
            p => Predicate::Not(Box::new(p)),
        }
    }

    /// Renders the predicate as a `WHERE` clause fragment (without the
    /// `WHERE` keyword).
    pub fn to_sql(&self) -> Result<String> {
        match self {
            Predicate::Condition { field, op } => render_condition(field, op),
            Predicate::IsNull(field) => Ok(format!("{} IS NULL", render_field(field)?)),
            Predicate::IsNotNull(field) => Ok(format!("{} IS NOT NULL", render_field(field)?)),
            Predicate::And(children) => render_group(children, "AND", "1"),
            Predicate::Or(children) => render_group(children, "OR", "0"),
            Predicate::Not(inner) => Ok(format!("NOT ({})", inner.to_sql()?)),
        }
    }
}

fn render_group(children: &[Predicate], joiner: &str, empty: &str) -> Result<String> {
    match children {
        [] => Ok(empty.to_string()),
        [only] => only.to_sql(),
        _ => {
            let parts = children
                .iter()
                .map(|child| child.to_sql().map(|sql| format!("({})", sql)))
                .collect::<Result<Vec<_>>>()?;
            Ok(parts.join(&format!(" {} ", joiner)))
        }
    }
}

fn render_condition(field: &str, op: &QueryOperator) -> Result<String> {
    let field = render_field(field)?;
    let sql = match op {
        QueryOperator::Equal(Value::Null) => format!("{} IS NULL", field),
        QueryOperator::NotEqual(Value::Null) => format!("{} IS NOT NULL", field),
        QueryOperator::Equal(v) => format!("{} = {}", field, render_literal(v)?),
        QueryOperator::NotEqual(v) => format!("{} <> {}", field, render_literal(v)?),
        QueryOperator::GreaterThan(v) => format!("{} > {}", field, render_literal(v)?),
        QueryOperator::GreaterThanOrEqual(v) => format!("{} >= {}", field, render_literal(v)?),
        QueryOperator::LessThan(v) => format!("{} < {}", field, render_literal(v)?),
        QueryOperator::LessThanOrEqual(v) => format!("{} <= {}", field, render_literal(v)?),
        QueryOperator::Like(pattern) => format!("{} LIKE {}", field, render_text(pattern)?),
        // `x IN ()` is legal in SQLite but not elsewhere; spell the constant out.
        QueryOperator::In(values) if values.is_empty() => "0".to_string(),
        QueryOperator::In(values) => {
            let list = values
                .iter()
                .map(render_literal)
                .collect::<Result<Vec<_>>>()?;
            format!("{} IN ({})", field, list.join(", "))
        }
        QueryOperator::Between(low, high) => format!(
            "{} BETWEEN {} AND {}",
            field,
            render_literal(low)?,
            render_literal(high)?
        ),
    };
    Ok(sql)
}

fn render_field(field: &str) -> Result<String> {
    if field.is_empty() {
        return Err(ReaderError::InvalidPredicate(
            "field name must not be empty".to_string(),
        ));
    }
    if field.contains('\0') {
        return Err(ReaderError::InvalidPredicate(format!(
            "field name contains a NUL byte: {:?}",
            field
        )));
    }
    Ok(quote_identifier(field))
}

fn render_text(text: &str) -> Result<String> {
    if text.contains('\0') {
        return Err(ReaderError::InvalidPredicate(format!(
            "text literal contains a NUL byte: {:?}",
            text
        )));
    }
    Ok(format!("'{}'", text.replace('\'', "''")))
}

fn render_literal(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Real(f) if !f.is_finite() => Err(ReaderError::InvalidPredicate(format!(
            "real literal must be finite, got {}",
            f
        ))),
        // Debug keeps the fractional part (`1.0`), so SQLite reads it as REAL.
        Value::Real(f) => Ok(format!("{:?}", f)),
        Value::Text(s) => render_text(s),
        Value::Blob(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
            Ok(format!("X'{}'", hex))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparisons() {
        assert_eq!(Predicate::eq("id", 1).to_sql().unwrap(), r#""id" = 1"#);
        assert_eq!(Predicate::ne("id", 1).to_sql().unwrap(), r#""id" <> 1"#);
        assert_eq!(Predicate::gt("age", 30).to_sql().unwrap(), r#""age" > 30"#);
        assert_eq!(Predicate::ge("age", 30).to_sql().unwrap(), r#""age" >= 30"#);
        assert_eq!(Predicate::lt("score", 1.5).to_sql().unwrap(), r#""score" < 1.5"#);
        assert_eq!(Predicate::le("score", -2).to_sql().unwrap(), r#""score" <= -2"#);
    }

    #[test]
    fn test_real_literal_keeps_fraction() {
        assert_eq!(Predicate::eq("x", 1.0).to_sql().unwrap(), r#""x" = 1.0"#);
    }

    #[test]
    fn test_text_literal_is_escaped() {
        assert_eq!(
            Predicate::eq("name", "O'Brien").to_sql().unwrap(),
            r#""name" = 'O''Brien'"#
        );
        assert_eq!(
            Predicate::eq("name", "'; DROP TABLE users; --").to_sql().unwrap(),
            r#""name" = '''; DROP TABLE users; --'"#
        );
    }

    #[test]
    fn test_field_is_quoted() {
        assert_eq!(
            Predicate::eq("first name", 1).to_sql().unwrap(),
            r#""first name" = 1"#
        );
        assert_eq!(
            Predicate::eq("we\"ird", 1).to_sql().unwrap(),
            r#""we""ird" = 1"#
        );
    }

    #[test]
    fn test_blob_literal() {
        assert_eq!(
            Predicate::eq("data", vec![0x48_u8, 0x0a, 0xff]).to_sql().unwrap(),
            r#""data" = X'480AFF'"#
        );
    }

    #[test]
    fn test_null_comparisons() {
        assert_eq!(
            Predicate::eq("email", Value::Null).to_sql().unwrap(),
            r#""email" IS NULL"#
        );
        assert_eq!(
            Predicate::ne("email", Value::Null).to_sql().unwrap(),
            r#""email" IS NOT NULL"#
        );
        assert_eq!(Predicate::is_null("a").to_sql().unwrap(), r#""a" IS NULL"#);
        assert_eq!(
            Predicate::is_not_null("a").to_sql().unwrap(),
            r#""a" IS NOT NULL"#
        );
    }

    #[test]
    fn test_like_in_between() {
        assert_eq!(
            Predicate::like("name", "A%").to_sql().unwrap(),
            r#""name" LIKE 'A%'"#
        );
        assert_eq!(
            Predicate::is_in("id", [1, 2, 3]).to_sql().unwrap(),
            r#""id" IN (1, 2, 3)"#
        );
        assert_eq!(
            Predicate::is_in("id", Vec::<i64>::new()).to_sql().unwrap(),
            "0"
        );
        assert_eq!(
            Predicate::between("age", 18, 65).to_sql().unwrap(),
            r#""age" BETWEEN 18 AND 65"#
        );
    }

    #[test]
    fn test_groups() {
        let p = Predicate::eq("a", 1)
            .and(Predicate::eq("b", 2))
            .and(Predicate::eq("c", 3));
        assert_eq!(
            p.to_sql().unwrap(),
            r#"("a" = 1) AND ("b" = 2) AND ("c" = 3)"#
        );
        assert!(matches!(p, Predicate::And(ref children) if children.len() == 3));

        let p = Predicate::eq("a", 1).or(Predicate::eq("b", 2).and(Predicate::eq("c", 3)));
        assert_eq!(
            p.to_sql().unwrap(),
            r#"("a" = 1) OR (("b" = 2) AND ("c" = 3))"#
        );

        assert_eq!(Predicate::And(vec![]).to_sql().unwrap(), "1");
        assert_eq!(Predicate::Or(vec![]).to_sql().unwrap(), "0");
        assert_eq!(
            Predicate::And(vec![Predicate::eq("a", 1)]).to_sql().unwrap(),
            r#""a" = 1"#
        );
    }

    #[test]
    fn test_negate() {
        let p = Predicate::eq("a", 1).negate();
        assert_eq!(p.to_sql().unwrap(), r#"NOT ("a" = 1)"#);
        assert_eq!(p.negate(), Predicate::eq("a", 1));
    }

    #[test]
    fn test_rejects_unrenderable_input() {
        assert!(matches!(
            Predicate::eq("x", f64::NAN).to_sql(),
            Err(ReaderError::InvalidPredicate(_))
        ));
        assert!(matches!(
            Predicate::eq("x", f64::INFINITY).to_sql(),
            Err(ReaderError::InvalidPredicate(_))
        ));
        assert!(matches!(
            Predicate::eq("", 1).to_sql(),
            Err(ReaderError::InvalidPredicate(_))
        ));
        assert!(matches!(
            Predicate::eq("x", "a\0b").to_sql(),
            Err(ReaderError::InvalidPredicate(_))
        ));
        // An invalid leaf poisons the whole group.
        assert!(Predicate::eq("a", 1)
            .and(Predicate::eq("b", f64::NAN))
            .to_sql()
            .is_err());
    }
}
