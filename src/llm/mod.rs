pub mod anthropic;
pub mod gemini;
pub mod models;
pub mod ollama;
pub mod openai;

use anthropic::AnthropicProvider;
use gemini::GeminiProvider;
use ollama::OllamaProvider;
use openai::OpenAiProvider;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use models::{ChatOptions, ChatResponse, Message};

/// Sampling temperature when a call does not set one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error: {0}")]
    Api(String),
    #[error("Invalid Response: {0}")]
    InvalidResponse(String),
    #[error("Rate Limited")]
    RateLimited,
    #[error("Configuration Error: {0}")]
    Config(String),
}

/// One hosted model endpoint. A call is a single request, no streaming.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError>;

    fn supported_models(&self) -> Vec<&str>;
}

/// Maps an error status onto `LlmError`, keeping the body for diagnostics.
pub(crate) async fn check_status(response: reqwest::Response, vendor: &str) -> Result<reqwest::Response, LlmError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimited);
    }
    Err(LlmError::Api(format!("{} Error {}: {}", vendor, status, text)))
}

/// Initializes the provider named in config.
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_default(config: &AppConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
        let provider_name = config.llm.provider.as_str();
        let missing = || LlmError::Config(format!("llm.{} section is missing", provider_name));

        match provider_name {
            "gemini" => {
                let cfg = config.llm.gemini.as_ref().ok_or_else(missing)?;
                Ok(Arc::new(GeminiProvider::new(
                    cfg.api_key.clone(),
                    cfg.api_base.clone(),
                    cfg.default_model.clone(),
                )))
            }
            "openai" => {
                let cfg = config.llm.openai.as_ref().ok_or_else(missing)?;
                Ok(Arc::new(OpenAiProvider::new(
                    cfg.api_key.clone(),
                    cfg.api_base.clone(),
                    cfg.default_model.clone(),
                )))
            }
            "anthropic" => {
                let cfg = config.llm.anthropic.as_ref().ok_or_else(missing)?;
                Ok(Arc::new(AnthropicProvider::new(
                    cfg.api_key.clone(),
                    cfg.api_base.clone(),
                    cfg.default_model.clone(),
                )))
            }
            "ollama" => {
                let cfg = config.llm.ollama.as_ref().ok_or_else(missing)?;
                Ok(Arc::new(OllamaProvider::new(
                    cfg.base_url.clone(),
                    cfg.default_model.clone(),
                )))
            }
            other => Err(LlmError::Config(format!("unknown provider '{}'", other))),
        }
    }
}
