pub mod connection;
pub mod duck;
pub mod models;
pub mod postgres;

pub use connection::{connect, Backend, ConnectionParams};
pub use models::*;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection Error: {0}")]
    Connection(String),
    #[error("Query Error: {0}")]
    Query(String),
}

/// A live connection to the database the questions are asked about.
#[async_trait]
pub trait SqlDatabase: Send + Sync {
    /// Dialect name as it should appear in prompts.
    fn dialect(&self) -> &str;

    /// Catalog schema introspected when no other is configured.
    fn default_schema(&self) -> &str;

    /// Submits `sql` verbatim and returns whatever rows it produced.
    async fn run(&self, sql: &str) -> Result<QueryResult, DbError>;
}
