use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use std::sync::{Arc, Mutex};

use crate::db::{DbError, QueryResult, SqlDatabase, SqlValue};

pub type DuckPool = Arc<Mutex<Connection>>;

pub struct DuckDbDatabase {
    conn: DuckPool,
}

impl DuckDbDatabase {
    pub fn open(path: &str) -> Result<Self, DbError> {
        let conn = Connection::open(path).map_err(|e| DbError::Connection(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory().map_err(|e| DbError::Connection(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs several statements at once. Used for fixtures, never by the pipeline.
    pub fn execute_batch(&self, sql: &str) -> Result<(), DbError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Connection("connection lock poisoned".to_string()))?;
        conn.execute_batch(sql).map_err(|e| DbError::Query(e.to_string()))
    }

    fn run_blocking(&self, sql: &str) -> Result<QueryResult, DbError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::Connection("connection lock poisoned".to_string()))?;
        let query_err = |e: duckdb::Error| DbError::Query(e.to_string());

        let mut stmt = conn.prepare(sql).map_err(query_err)?;
        let mut rows = stmt.query([]).map_err(query_err)?;
        let columns = rows
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(query_err)? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                let value: Value = row.get(idx).map_err(query_err)?;
                values.push(to_sql_value(value));
            }
            out.push(values);
        }

        Ok(QueryResult::new(columns, out))
    }
}

fn to_sql_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::Bool(b),
        Value::TinyInt(i) => SqlValue::Int(i.into()),
        Value::SmallInt(i) => SqlValue::Int(i.into()),
        Value::Int(i) => SqlValue::Int(i.into()),
        Value::BigInt(i) => SqlValue::Int(i),
        Value::HugeInt(i) => i64::try_from(i)
            .map(SqlValue::Int)
            .unwrap_or_else(|_| SqlValue::Literal(i.to_string())),
        Value::UTinyInt(i) => SqlValue::Int(i.into()),
        Value::USmallInt(i) => SqlValue::Int(i.into()),
        Value::UInt(i) => SqlValue::Int(i.into()),
        Value::UBigInt(i) => i64::try_from(i)
            .map(SqlValue::Int)
            .unwrap_or_else(|_| SqlValue::Literal(i.to_string())),
        Value::Float(f) => SqlValue::Float(f.into()),
        Value::Double(f) => SqlValue::Float(f),
        Value::Decimal(d) => SqlValue::Literal(d.to_string()),
        Value::Text(s) | Value::Enum(s) => SqlValue::Text(s),
        Value::Date32(days) => SqlValue::Text(date_text(days)),
        Value::Timestamp(unit, v) => SqlValue::Text(timestamp_text(to_micros(unit, v))),
        Value::Time64(unit, v) => SqlValue::Text(time_text(to_micros(unit, v))),
        Value::Interval { months, days, nanos } => {
            SqlValue::Text(format!("{} months {} days {} nanoseconds", months, days, nanos))
        }
        Value::Blob(bytes) => SqlValue::Text(blob_text(&bytes)),
        Value::List(items) | Value::Array(items) => SqlValue::Literal(list_text(items)),
        Value::Struct(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(name, value)| format!("'{}': {}", name, to_sql_value(value.clone())))
                .collect();
            SqlValue::Literal(format!("{{{}}}", fields.join(", ")))
        }
        Value::Map(entries) => {
            let entries: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", to_sql_value(k.clone()), to_sql_value(v.clone())))
                .collect();
            SqlValue::Literal(format!("{{{}}}", entries.join(", ")))
        }
        Value::Union(inner) => to_sql_value(*inner),
    }
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

/// ISO `YYYY-MM-DD` from days since the Unix epoch.
fn date_text(days: i32) -> String {
    DateTime::<Utc>::from_timestamp(i64::from(days) * 86_400, 0)
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_else(|| days.to_string())
}

fn timestamp_text(micros: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(micros)
        .map(|dt| dt.naive_utc().to_string())
        .unwrap_or_else(|| micros.to_string())
}

fn time_text(micros: i64) -> String {
    let secs = micros.div_euclid(1_000_000);
    let nanos = micros.rem_euclid(1_000_000) * 1_000;
    u32::try_from(secs)
        .ok()
        .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos as u32))
        .map(|t| t.to_string())
        .unwrap_or_else(|| micros.to_string())
}

fn blob_text(bytes: &[u8]) -> String {
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("\\x{}", hex)
}

fn list_text(items: Vec<Value>) -> String {
    let items: Vec<String> = items.into_iter().map(|v| to_sql_value(v).to_string()).collect();
    format!("[{}]", items.join(", "))
}

#[async_trait]
impl SqlDatabase for DuckDbDatabase {
    fn dialect(&self) -> &str {
        "DuckDB"
    }

    fn default_schema(&self) -> &str {
        "main"
    }

    async fn run(&self, sql: &str) -> Result<QueryResult, DbError> {
        self.run_blocking(sql)
    }
}
