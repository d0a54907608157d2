use serde::Serialize;
use std::fmt;

/// A single cell as returned by the database driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact value already in display form, shown without quotes: decimals,
    /// out-of-range integers, lists and structs.
    Literal(String),
    Text(String),
}

impl SqlValue {
    /// Interprets a text-protocol cell. Postgres' simple query protocol only
    /// ever hands back text. A cell becomes a number only when the number
    /// prints back to the exact same text, so `007`, `1.10` and oversized
    /// integers stay as they were sent.
    pub fn from_text(raw: Option<&str>) -> Self {
        let Some(s) = raw else {
            return SqlValue::Null;
        };
        if let Ok(i) = s.parse::<i64>() {
            if i.to_string() == s {
                return SqlValue::Int(i);
            }
        }
        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() && format!("{:?}", f) == s {
                return SqlValue::Float(f);
            }
        }
        SqlValue::Text(s.to_string())
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::Float(x) => write!(f, "{:?}", x),
            SqlValue::Literal(s) => f.write_str(s),
            SqlValue::Text(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
        }
    }
}

/// Raw result of one executed statement. No coercion, no pagination.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Renders as a list of row tuples, e.g. `[(5,)]` or `[('Ann', 31), ('Bo', NULL)]`.
impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str("(")?;
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", value)?;
            }
            if row.len() == 1 {
                f.write_str(",")?;
            }
            f.write_str(")")?;
        }
        f.write_str("]")
    }
}
