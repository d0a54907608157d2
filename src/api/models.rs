use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::ChatMessage;
use crate::db::{Backend, ConnectionParams};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub connected: bool,
    pub messages: Vec<ChatMessage>,
}

/// Connection settings. Omitted fields fall back to the configured defaults.
#[derive(Deserialize, Default)]
pub struct ConnectRequest {
    pub backend: Option<Backend>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub connected: bool,
    pub database: String,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub question: String,
    pub query: String,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ConnectRequest {
    pub fn apply(self, mut params: ConnectionParams) -> ConnectionParams {
        if let Some(backend) = self.backend {
            params.backend = backend;
        }
        if let Some(host) = self.host {
            params.host = host;
        }
        if let Some(port) = self.port {
            params.port = port;
        }
        if let Some(username) = self.username {
            params.username = username;
        }
        if let Some(password) = self.password {
            params.password = password;
        }
        if let Some(database) = self.database {
            params.database = database;
        }
        if self.schema.is_some() {
            params.schema = self.schema;
        }
        params
    }
}
