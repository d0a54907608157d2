use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::llm::{
    check_status,
    models::{ChatOptions, ChatResponse, Message, Usage},
    LlmError, LlmProvider, DEFAULT_TEMPERATURE, MAX_TOKENS,
};

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, base_url: String, default_model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            default_model,
        }
    }

    fn build_body(model: &str, messages: &[Message], options: &ChatOptions) -> Value {
        json!({
            "model": model,
            "messages": messages,
            "temperature": options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            "max_tokens": MAX_TOKENS,
        })
    }

    fn parse_response(json: &Value, model: &str) -> Result<ChatResponse, LlmError> {
        let content = json["content"][0]["text"]
            .as_str()
            .ok_or_else(|| LlmError::InvalidResponse("missing content[0].text".to_string()))?
            .to_string();

        let usage = json.get("usage").map(|u| Usage {
            input_tokens: u["input_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: u["output_tokens"].as_u64().unwrap_or(0) as u32,
        });

        Ok(ChatResponse {
            content,
            model: model.to_string(),
            usage,
        })
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        let model = self.default_model.as_str();
        let body = Self::build_body(model, messages, &options);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;
        let response = check_status(response, "Anthropic").await?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Self::parse_response(&json, model)
    }

    fn supported_models(&self) -> Vec<&str> {
        vec!["claude-3-5-sonnet-20241022", "claude-3-5-haiku-20241022"]
    }
}
