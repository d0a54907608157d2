use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::llm::{
    check_status,
    models::{ChatOptions, ChatResponse, Message, Usage},
    LlmError, LlmProvider, DEFAULT_TEMPERATURE, MAX_TOKENS,
};

pub struct OllamaProvider {
    client: Client,
    base_url: String,
    default_model: String,
}

impl OllamaProvider {
    pub fn new(base_url: String, default_model: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            default_model,
        }
    }

    fn parse_response(json: &Value, model: &str) -> Result<ChatResponse, LlmError> {
        let content = json["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::InvalidResponse("missing message.content".to_string()))?
            .to_string();

        let usage = match (json["prompt_eval_count"].as_u64(), json["eval_count"].as_u64()) {
            (Some(input), Some(output)) => Some(Usage {
                input_tokens: input as u32,
                output_tokens: output as u32,
            }),
            _ => None,
        };

        Ok(ChatResponse {
            content,
            model: model.to_string(),
            usage,
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        let model = self.default_model.as_str();

        let body = json!({
            "model": model,
            "messages": messages,
            "stream": false,
            "options": {
                "temperature": options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                "num_predict": MAX_TOKENS
            }
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;
        let response = check_status(response, "Ollama").await?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Self::parse_response(&json, model)
    }

    fn supported_models(&self) -> Vec<&str> {
        vec!["llama3.2", "qwen2.5-coder", "mistral"]
    }
}
