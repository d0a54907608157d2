use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::db::{duck::DuckDbDatabase, postgres::PostgresDatabase, DbError, SqlDatabase};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Postgres,
    Duckdb,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "duckdb" => Ok(Backend::Duckdb),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// Everything needed to open the session's single live connection.
#[derive(Clone, PartialEq)]
pub struct ConnectionParams {
    pub backend: Backend,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub schema: Option<String>,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("schema", &self.schema)
            .finish()
    }
}

impl ConnectionParams {
    /// Params for a DuckDB file (or `:memory:`); network fields are unused.
    pub fn duckdb(path: &str) -> Self {
        Self {
            backend: Backend::Duckdb,
            host: String::new(),
            port: 0,
            username: String::new(),
            password: String::new(),
            database: path.to_string(),
            schema: None,
        }
    }
}

/// Opens a connection. The returned handle is held for the whole session.
pub async fn connect(params: &ConnectionParams) -> Result<Arc<dyn SqlDatabase>, DbError> {
    match params.backend {
        Backend::Postgres => {
            info!(
                "Connecting to Postgres at {}:{}/{} as {}",
                params.host, params.port, params.database, params.username
            );
            let db = PostgresDatabase::connect(params).await?;
            Ok(Arc::new(db))
        }
        Backend::Duckdb => {
            info!("Connecting to DuckDB at {}", params.database);
            let db = DuckDbDatabase::open(&params.database)?;
            Ok(Arc::new(db))
        }
    }
}
