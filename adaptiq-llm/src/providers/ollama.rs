//! Ollama provider (local models)
//!
//! Uses the non-streaming `/api/generate` endpoint. Ollama has no chat
//! message roles there, so the system and user messages are concatenated
//! into one prompt.

use crate::providers::{invalid_response, not_configured, request_failed, timeout};
use crate::{CompletionProvider, CompletionRequest};
use adaptiq_core::AdaptiqResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Completion provider for a local Ollama server.
#[derive(Debug)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: Option<String>,
}

impl OllamaProvider {
    /// # Arguments
    /// * `base_url` - Ollama server URL (e.g., "http://localhost:11434")
    /// * `model` - Model name, or `None` to leave the provider unconfigured
    pub fn new(base_url: impl Into<String>, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.filter(|m| !m.trim().is_empty()),
        }
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    async fn complete(&self, request: &CompletionRequest) -> AdaptiqResult<String> {
        let model = self.model.as_deref().ok_or_else(|| not_configured("ollama"))?;

        let body = GenerateRequest {
            model: model.to_string(),
            prompt: format!("{}\n\n{}", request.system, request.user),
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
            },
        };

        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    timeout("ollama", request.timeout.as_millis() as u64)
                } else {
                    request_failed("ollama", 0, format!("Failed to connect to Ollama: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(request_failed("ollama", status.as_u16() as i32, error_text));
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|e| invalid_response("ollama", format!("Failed to parse response: {}", e)))?;

        let content = payload.response.unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            return Err(invalid_response("ollama", "empty completion content"));
        }
        Ok(content.to_string())
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

// =============================================================================
// TESTS
// =============================================================================
