use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::chat::{ChatMessage, ConversationStore};
use crate::config::{AppConfig, SchemaConfig};
use crate::db::{connect, ConnectionParams, DbError, SqlDatabase};
use crate::llm::LlmProvider;
use crate::pipeline::{Interaction, Pipeline, PipelineError};
use crate::schema::{provider_for, SchemaProvider};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not connected. Connect to the database to start chatting.")]
    Disconnected,
    #[error("Question is empty")]
    EmptyQuestion,
    #[error(transparent)]
    Connection(DbError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

struct LiveConnection {
    db: Arc<dyn SqlDatabase>,
    schema: Arc<dyn SchemaProvider>,
}

/// Per-session state: the conversation and, once connected, the single live
/// database connection. Nothing here is global.
pub struct ChatSession {
    store: ConversationStore,
    pipeline: Pipeline,
    schema_config: SchemaConfig,
    max_history: usize,
    connection: Option<LiveConnection>,
}

impl ChatSession {
    pub fn new(pipeline: Pipeline, greeting: &str, max_history: usize, schema_config: SchemaConfig) -> Self {
        Self {
            store: ConversationStore::with_greeting(greeting),
            pipeline,
            schema_config,
            max_history,
            connection: None,
        }
    }

    pub fn from_config(config: &AppConfig, llm: Arc<dyn LlmProvider>) -> Self {
        let pipeline = Pipeline::new(llm, config.chat.on_query_error);
        Self::new(
            pipeline,
            &config.chat.greeting,
            config.chat.max_history_messages,
            config.schema.clone(),
        )
    }

    /// Opens a new connection. Any failure leaves the session disconnected,
    /// even if it was connected before.
    pub async fn connect(&mut self, params: &ConnectionParams) -> Result<(), SessionError> {
        self.connection = None;
        let db = connect(params).await.map_err(SessionError::Connection)?;
        self.attach(db, params.schema.clone());
        info!("Session connected ({})", params.database);
        Ok(())
    }

    /// Uses an already open connection, e.g. a fixture in tests.
    pub fn attach(&mut self, db: Arc<dyn SqlDatabase>, schema: Option<String>) {
        let schema = provider_for(&self.schema_config, db.clone(), schema);
        self.connection = Some(LiveConnection { db, schema });
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.store.all()
    }

    pub async fn describe_schema(&self) -> Result<String, SessionError> {
        let conn = self.connection.as_ref().ok_or(SessionError::Disconnected)?;
        conn.schema
            .describe_schema()
            .await
            .map_err(|e| SessionError::Pipeline(PipelineError::Schema(e)))
    }

    /// Runs one interaction. The question is recorded before the model is
    /// called; the answer only once every stage succeeded.
    pub async fn ask(&mut self, question: &str) -> Result<Interaction, SessionError> {
        let (db, schema_provider) = match &self.connection {
            Some(conn) => (conn.db.clone(), conn.schema.clone()),
            None => return Err(SessionError::Disconnected),
        };
        if question.trim().is_empty() {
            return Err(SessionError::EmptyQuestion);
        }

        self.store.append(ChatMessage::human(question));

        let schema = schema_provider
            .describe_schema()
            .await
            .map_err(PipelineError::Schema)?;
        let history = self.store.recent(self.max_history);
        let interaction = self.pipeline.run(db.as_ref(), &schema, question, history).await?;

        self.store.append(ChatMessage::assistant(interaction.answer.clone()));
        Ok(interaction)
    }
}
