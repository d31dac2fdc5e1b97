//! OpenAI chat-completions provider
//!
//! Also the wire implementation behind [`crate::GroqProvider`], which
//! speaks the same protocol against a different base URL.

use crate::providers::{invalid_response, not_configured, request_failed, timeout};
use crate::{CompletionProvider, CompletionRequest};
use adaptiq_core::AdaptiqResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions provider against an OpenAI-compatible endpoint.
pub struct OpenAiProvider {
    client: Client,
    name: String,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiProvider {
    /// Provider against the hosted OpenAI API.
    ///
    /// # Arguments
    /// * `api_key` - API key, or `None` to leave the provider unconfigured
    /// * `model` - Model name (e.g., "gpt-4o-mini")
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self::with_base_url("openai", OPENAI_BASE_URL, api_key, model)
    }

    /// Provider against any OpenAI-compatible endpoint.
    pub fn with_base_url(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            name: name.into(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, request: &CompletionRequest) -> AdaptiqResult<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| not_configured(&self.name))?;

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user.clone(),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    timeout(&self.name, request.timeout.as_millis() as u64)
                } else {
                    request_failed(&self.name, 0, format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = match serde_json::from_str::<ApiError>(&error_text) {
                Ok(api_error) => api_error.error.message,
                Err(_) => error_text,
            };
            return Err(request_failed(&self.name, status.as_u16() as i32, message));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| invalid_response(&self.name, format!("Failed to parse response: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            return Err(invalid_response(&self.name, "empty completion content"));
        }
        Ok(content.to_string())
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorDetail {
    message: String,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_api_key_means_unconfigured() {
        assert!(!OpenAiProvider::new(None, "gpt-4o-mini").is_configured());
        assert!(!OpenAiProvider::new(Some("   ".to_string()), "gpt-4o-mini").is_configured());
        assert!(OpenAiProvider::new(Some("sk-test".to_string()), "gpt-4o-mini").is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_complete_errors_without_io() {
        let provider = OpenAiProvider::new(None, "gpt-4o-mini");
        let request = CompletionRequest {
            system: "s".to_string(),
            user: "u".to_string(),
            temperature: 0.4,
            max_tokens: 10,
            timeout: std::time::Duration::from_secs(1),
        };
        let err = provider.complete(&request).await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = OpenAiProvider::new(Some("sk-secret".to_string()), "gpt-4o-mini");
        let rendered = format!("{:?}", provider);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_chat_response_parses_openai_shape() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"prompt\": \"Q\"}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "{\"prompt\": \"Q\"}");
    }
}
