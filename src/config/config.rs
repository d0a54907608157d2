use serde::Deserialize;

use crate::db::{Backend, ConnectionParams};
use crate::pipeline::QueryErrorPolicy;
use crate::schema::TableModel;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// HTTP sessions untouched for this long are dropped with their connection.
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            session_idle_secs: 1800,
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: Backend,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    /// Catalog schema to introspect. Falls back to the backend's default.
    pub schema: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Postgres,
            host: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: String::new(),
            database: "postgres".to_string(),
            schema: None,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
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

impl DatabaseConfig {
    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            backend: self.backend,
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
            schema: self.schema.clone(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key: String,
    pub default_model: String,
}

#[derive(Deserialize, Clone)]
pub struct AnthropicConfig {
    pub api_base: String,
    pub api_key: String,
    pub default_model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub default_model: String,
}

#[derive(Deserialize, Clone)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_base")]
    pub api_base: String,
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub default_model: String,
}

fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

macro_rules! redacted_debug {
    ($ty:ident, $($field:ident),*) => {
        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    $(.field(stringify!($field), &self.$field))*
                    .field("api_key", &"<redacted>")
                    .finish()
            }
        }
    };
}

redacted_debug!(OpenAiConfig, api_base, default_model);
redacted_debug!(AnthropicConfig, api_base, default_model);
redacted_debug!(GeminiConfig, api_base, default_model);

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub openai: Option<OpenAiConfig>,
    pub anthropic: Option<AnthropicConfig>,
    pub ollama: Option<OllamaConfig>,
    pub gemini: Option<GeminiConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            openai: None,
            anthropic: None,
            ollama: None,
            gemini: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    pub greeting: String,
    pub max_history_messages: usize,
    pub on_query_error: QueryErrorPolicy,
    /// Print each generated query before its answer.
    pub show_query: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting: "Hi, I am your SQL assistant. Ask a question in plain language and I will \
                       look the answer up in the connected database."
                .to_string(),
            max_history_messages: 50,
            on_query_error: QueryErrorPolicy::Abort,
            show_query: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchemaSourceKind {
    #[default]
    Introspect,
    Static,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SchemaConfig {
    pub source: SchemaSourceKind,
    pub sample_rows: usize,
    pub tables: Vec<TableModel>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            source: SchemaSourceKind::Introspect,
            sample_rows: 3,
            tables: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub chat: ChatConfig,
    pub schema: SchemaConfig,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SQLCHAT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        // Expand environment variables if present like ${PGPASSWORD}
        app_config.server.host = expand_env(&app_config.server.host);
        app_config.database.host = expand_env(&app_config.database.host);
        app_config.database.password = expand_env(&app_config.database.password);
        app_config.database.database = expand_env(&app_config.database.database);

        if let Some(ref mut openai) = app_config.llm.openai {
            openai.api_key = expand_env(&openai.api_key);
        }
        if let Some(ref mut anthropic) = app_config.llm.anthropic {
            anthropic.api_key = expand_env(&anthropic.api_key);
        }
        if let Some(ref mut gemini) = app_config.llm.gemini {
            gemini.api_key = expand_env(&gemini.api_key);
        }

        Ok(app_config)
    }
}

fn expand_env(val: &str) -> String {
    if val.starts_with("${") && val.ends_with('}') {
        let var_name = &val[2..val.len() - 1];
        std::env::var(var_name).unwrap_or_default()
    } else {
        val.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_env_reads_placeholder() {
        std::env::set_var("SQLCHAT_TEST_SECRET", "hunter2");
        assert_eq!(expand_env("${SQLCHAT_TEST_SECRET}"), "hunter2");
        assert_eq!(expand_env("${SQLCHAT_TEST_UNSET_VAR}"), "");
        assert_eq!(expand_env("plain"), "plain");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load("does/not/exist.yaml").unwrap();
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.database.backend, Backend::Postgres);
        assert_eq!(config.chat.on_query_error, QueryErrorPolicy::Abort);
        assert_eq!(config.schema.source, SchemaSourceKind::Introspect);
        assert_eq!(config.schema.sample_rows, 3);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let mut db = DatabaseConfig::default();
        db.password = "s3cret".to_string();
        let gemini = GeminiConfig {
            api_base: default_gemini_base(),
            api_key: "AIza-secret".to_string(),
            default_model: default_gemini_model(),
        };

        assert!(!format!("{:?}", db).contains("s3cret"));
        assert!(!format!("{:?}", gemini).contains("AIza-secret"));
    }
}
