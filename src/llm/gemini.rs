use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::llm::{
    check_status,
    models::{ChatOptions, ChatResponse, Message, Usage},
    LlmError, LlmProvider, DEFAULT_TEMPERATURE, MAX_TOKENS,
};

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, base_url: String, default_model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            default_model,
        }
    }

    /// Gemini names the assistant role `model`.
    fn build_body(messages: &[Message], options: &ChatOptions) -> Value {
        let contents: Vec<Value> = messages
            .iter()
            .map(|m| {
                let role = if m.role == "assistant" { "model" } else { "user" };
                json!({"role": role, "parts": [{"text": m.content}]})
            })
            .collect();

        json!({
            "contents": contents,
            "generationConfig": {
                "temperature": options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                "maxOutputTokens": MAX_TOKENS,
            }
        })
    }

    fn parse_response(json: &Value, model: &str) -> Result<ChatResponse, LlmError> {
        let content = json
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| LlmError::InvalidResponse("missing candidates[0].content.parts[0].text".to_string()))?
            .to_string();

        let usage = json.get("usageMetadata").map(|u| Usage {
            input_tokens: u["promptTokenCount"].as_u64().unwrap_or(0) as u32,
            output_tokens: u["candidatesTokenCount"].as_u64().unwrap_or(0) as u32,
        });

        Ok(ChatResponse {
            content,
            model: model.to_string(),
            usage,
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        let model = self.default_model.as_str();
        let body = Self::build_body(messages, &options);

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;
        let response = check_status(response, "Gemini").await?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Self::parse_response(&json, model)
    }

    fn supported_models(&self) -> Vec<&str> {
        vec!["gemini-2.5-flash", "gemini-2.5-pro", "gemini-1.5-flash"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_maps_roles() {
        let messages = vec![
            Message::user("Count customers"),
            Message {
                role: "assistant".to_string(),
                content: "SELECT COUNT(*) FROM customer".to_string(),
            },
        ];
        let body = GeminiProvider::build_body(&messages, &ChatOptions::default());

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn body_uses_call_temperature() {
        let options = ChatOptions { temperature: Some(0.3) };
        let body = GeminiProvider::build_body(&[Message::user("hi")], &options);
        let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.3).abs() < 1e-6);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], MAX_TOKENS);
    }

    #[test]
    fn parses_candidate_text() {
        let raw = json!({
            "candidates": [{"content": {"parts": [{"text": "SELECT 42"}]}}],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 2}
        });
        let response = GeminiProvider::parse_response(&raw, "gemini-2.5-flash").unwrap();
        assert_eq!(response.content, "SELECT 42");
        assert_eq!(response.usage.unwrap().output_tokens, 2);
    }

    #[test]
    fn empty_candidates_are_invalid() {
        let raw = json!({"candidates": []});
        assert!(matches!(
            GeminiProvider::parse_response(&raw, "m"),
            Err(LlmError::InvalidResponse(_))
        ));
    }
}
