use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::llm::{
    check_status,
    models::{ChatOptions, ChatResponse, Message, Usage},
    LlmError, LlmProvider, DEFAULT_TEMPERATURE, MAX_TOKENS,
};

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: String, default_model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            default_model,
        }
    }

    fn parse_response(json: &Value, model: &str) -> Result<ChatResponse, LlmError> {
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::InvalidResponse("missing choices[0].message.content".to_string()))?
            .to_string();

        let usage = json.get("usage").map(|u| Usage {
            input_tokens: u["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: u["completion_tokens"].as_u64().unwrap_or(0) as u32,
        });

        Ok(ChatResponse {
            content,
            model: model.to_string(),
            usage,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        let model = self.default_model.as_str();

        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            "max_tokens": MAX_TOKENS,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;
        let response = check_status(response, "OpenAI").await?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Self::parse_response(&json, model)
    }

    fn supported_models(&self) -> Vec<&str> {
        vec!["gpt-4o", "gpt-4o-mini", "gpt-4-turbo"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_completion_and_usage() {
        let raw = json!({
            "choices": [{"message": {"role": "assistant", "content": "SELECT 1"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        });
        let response = OpenAiProvider::parse_response(&raw, "gpt-4o").unwrap();
        assert_eq!(response.content, "SELECT 1");
        assert_eq!(response.model, "gpt-4o");
        assert_eq!(response.usage.unwrap().input_tokens, 12);
    }

    #[test]
    fn missing_content_is_invalid() {
        let raw = json!({"choices": []});
        assert!(matches!(
            OpenAiProvider::parse_response(&raw, "gpt-4o"),
            Err(LlmError::InvalidResponse(_))
        ));
    }
}
