//! Groq provider (OpenAI-compatible wire format)

use crate::providers::openai::OpenAiProvider;
use crate::{CompletionProvider, CompletionRequest};
use adaptiq_core::AdaptiqResult;
use async_trait::async_trait;

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq chat-completions provider. Same protocol as OpenAI, different
/// base URL and model names.
#[derive(Debug)]
pub struct GroqProvider {
    inner: OpenAiProvider,
}

impl GroqProvider {
    /// # Arguments
    /// * `api_key` - Groq API key, or `None` to leave the provider unconfigured
    /// * `model` - Model name (e.g., "llama-3.1-8b-instant")
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            inner: OpenAiProvider::with_base_url("groq", GROQ_BASE_URL, api_key, model),
        }
    }
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }

    async fn complete(&self, request: &CompletionRequest) -> AdaptiqResult<String> {
        self.inner.complete(request).await
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groq_provider_name_and_configuration() {
        let provider = GroqProvider::new(Some("gsk_test".to_string()), "llama-3.1-8b-instant");
        assert_eq!(provider.name(), "groq");
        assert!(provider.is_configured());
        assert!(!GroqProvider::new(None, "llama-3.1-8b-instant").is_configured());
    }
}
