//! Dynamic attribute values and how they bind into sqlx queries.

use sqlx::Sqlite;
use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::SqliteArguments;
use std::fmt;

/// Storage kind of a mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
}

/// A non-key column declared by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }

    /// Parse console input for this column. `nil` and `null` mean NULL.
    pub fn parse(&self, raw: &str) -> Option<Value> {
        if raw.eq_ignore_ascii_case("nil") || raw.eq_ignore_ascii_case("null") {
            return Some(Value::Null);
        }
        match self.kind {
            ColumnKind::Integer => raw.parse().ok().map(Value::Integer),
            ColumnKind::Text => Some(Value::Text(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("nil"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// Ordered attribute/value pairs, as typed by the caller.
pub type Attributes = Vec<(String, Value)>;

pub(crate) fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Integer(i) => query.bind(*i),
        Value::Text(s) => query.bind(s.clone()),
    }
}

pub(crate) fn bind_value_as<'q, O>(
    query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    value: &Value,
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Integer(i) => query.bind(*i),
        Value::Text(s) => query.bind(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_column_keeps_digits_as_text() {
        let col = Column::new("name", ColumnKind::Text);
        assert_eq!(col.parse("42"), Some(Value::Text("42".into())));
        assert_eq!(col.parse("NIL"), Some(Value::Null));
    }

    #[test]
    fn integer_column_rejects_words() {
        let col = Column::new("age", ColumnKind::Integer);
        assert_eq!(col.parse("7"), Some(Value::Integer(7)));
        assert_eq!(col.parse("seven"), None);
        assert_eq!(col.parse("null"), Some(Value::Null));
    }

    #[test]
    fn display_quotes_text() {
        assert_eq!(Value::from("Ada").to_string(), "\"Ada\"");
        assert_eq!(Value::from(None::<String>).to_string(), "nil");
        assert_eq!(Value::from(3_i64).to_string(), "3");
    }
}
