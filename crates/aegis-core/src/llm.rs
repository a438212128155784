// Workers-AI-style LLM client
//
// Speaks the `run(model, { messages, max_tokens, temperature })` chat
// contract: POST {base_url}/{model} with a messages array, read the
// generated text from `result.response` (with a top-level `response`
// fallback for plainer gateways).

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::traits::{ChatMessage, LanguageModel};

const DEFAULT_MODEL: &str = "@cf/meta/llama-3-8b-instruct";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// HTTP client for a Workers-AI-compatible inference endpoint
pub struct AiClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct RunRequest<'a> {
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

impl AiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_token: None,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Build a client from environment variables.
    ///
    /// `AI_API_URL` is required; `AI_API_TOKEN`, `AI_MODEL`, `AI_MAX_TOKENS`
    /// and `AI_TEMPERATURE` are optional.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("AI_API_URL")
            .map_err(|_| EngineError::llm("AI_API_URL environment variable not set"))?;
        let model = std::env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("AI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);
        let temperature = std::env::var("AI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);

        let mut client = Self::new(base_url, model);
        client.api_token = std::env::var("AI_API_TOKEN").ok();
        client.max_tokens = max_tokens;
        client.temperature = temperature;
        Ok(client)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.model.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl LanguageModel for AiClient {
    async fn generate(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let body = RunRequest {
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EngineError::llm(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EngineError::llm(format!(
                "inference endpoint returned {}: {}",
                status, detail
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| EngineError::llm(format!("invalid response body: {}", e)))?;

        let text = payload
            .pointer("/result/response")
            .or_else(|| payload.get("response"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::llm("response carried no generated text"))?;

        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn generate_reads_result_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/test-model"))
            .and(body_partial_json(json!({
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "result": { "response": "generated analysis" }
            })))
            .mount(&server)
            .await;

        let client = AiClient::new(server.uri(), "test-model");
        let text = client
            .generate(vec![ChatMessage::user("hello")])
            .await
            .unwrap();
        assert_eq!(text, "generated analysis");
    }

    #[tokio::test]
    async fn generate_accepts_flat_response_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "response": "flat text" })),
            )
            .mount(&server)
            .await;

        let client = AiClient::new(server.uri(), "test-model");
        let text = client
            .generate(vec![ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(text, "flat text");
    }

    #[tokio::test]
    async fn generate_maps_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream busy"))
            .mount(&server)
            .await;

        let client = AiClient::new(server.uri(), "test-model");
        let err = client
            .generate(vec![ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Llm(_)));
    }

    #[tokio::test]
    async fn generate_rejects_missing_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .mount(&server)
            .await;

        let client = AiClient::new(server.uri(), "test-model");
        let err = client
            .generate(vec![ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Llm(_)));
    }
}
