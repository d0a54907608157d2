use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::error;

use crate::db::{ConnectionParams, DbError, QueryResult, SqlDatabase, SqlValue};

/// Postgres over the simple query protocol, so any ad hoc statement the model
/// produces can run without preparing it or knowing its column types.
pub struct PostgresDatabase {
    client: Client,
}

impl PostgresDatabase {
    pub async fn connect(params: &ConnectionParams) -> Result<Self, DbError> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&params.host)
            .port(params.port)
            .user(&params.username)
            .password(&params.password)
            .dbname(&params.database);

        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Postgres connection closed: {}", e);
            }
        });

        Ok(Self { client })
    }
}

#[async_trait]
impl SqlDatabase for PostgresDatabase {
    fn dialect(&self) -> &str {
        "PostgreSQL"
    }

    fn default_schema(&self) -> &str {
        "public"
    }

    async fn run(&self, sql: &str) -> Result<QueryResult, DbError> {
        let messages = self
            .client
            .simple_query(sql)
            .await
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(collect_rows(messages))
    }
}

/// Keeps the last row-producing statement when the text holds several.
fn collect_rows(messages: Vec<SimpleQueryMessage>) -> QueryResult {
    let mut result = QueryResult::default();
    let mut fresh = true;

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                result = QueryResult::new(columns.iter().map(|c| c.name().to_string()).collect(), Vec::new());
                fresh = false;
            }
            SimpleQueryMessage::Row(row) => {
                if fresh {
                    result = QueryResult::new(row.columns().iter().map(|c| c.name().to_string()).collect(), Vec::new());
                    fresh = false;
                }
                let values = (0..row.len()).map(|i| SqlValue::from_text(row.get(i))).collect();
                result.rows.push(values);
            }
            SimpleQueryMessage::CommandComplete(_) => {
                fresh = true;
            }
            _ => {}
        }
    }

    result
}
