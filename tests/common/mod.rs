#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use sqlchat::config::AppConfig;
use sqlchat::db::duck::DuckDbDatabase;
use sqlchat::db::{DbError, QueryResult, SqlDatabase};
use sqlchat::llm::models::{ChatOptions, ChatResponse, Message};
use sqlchat::llm::{LlmError, LlmProvider};

/// Replays canned completions in order and records every prompt it was sent.
/// An exhausted script answers with a network error.
pub struct StubLlm {
    replies: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubLlm {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn name(&self) -> &str {
        "stub"
    }

    async fn chat(&self, messages: &[Message], _options: ChatOptions) -> Result<ChatResponse, LlmError> {
        self.prompts.lock().unwrap().push(messages[0].content.clone());
        let content = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::Network("connection reset".to_string()))?;
        Ok(ChatResponse {
            content,
            model: "stub".to_string(),
            usage: None,
        })
    }

    fn supported_models(&self) -> Vec<&str> {
        vec!["stub"]
    }
}

/// Returns one fixed result for any statement and remembers what it was asked.
pub struct StubDatabase {
    result: QueryResult,
    pub executed: Mutex<Vec<String>>,
}

impl StubDatabase {
    pub fn new(result: QueryResult) -> Arc<Self> {
        Arc::new(Self {
            result,
            executed: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SqlDatabase for StubDatabase {
    fn dialect(&self) -> &str {
        "PostgreSQL"
    }

    fn default_schema(&self) -> &str {
        "public"
    }

    async fn run(&self, sql: &str) -> Result<QueryResult, DbError> {
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(self.result.clone())
    }
}

pub fn customer_db() -> Arc<DuckDbDatabase> {
    let db = DuckDbDatabase::open_in_memory().unwrap();
    db.execute_batch(
        r#"
        CREATE TABLE customer (
            customer_id VARCHAR PRIMARY KEY,
            customer_name VARCHAR NOT NULL,
            customer_age INTEGER NOT NULL,
            customer_location VARCHAR
        );
        INSERT INTO customer VALUES
            ('c1', 'Asha', 34, 'Pune'),
            ('c2', 'Ravi', 41, 'Pune'),
            ('c3', 'Meera', 29, 'Nagpur');
        "#,
    )
    .unwrap();
    Arc::new(db)
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.chat.greeting = "Hi, ask me about your data.".to_string();
    config.schema.sample_rows = 0;
    config
}
