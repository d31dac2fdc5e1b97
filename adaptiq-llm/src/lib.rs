//! Adaptiq LLM - Completion Providers and Generation Orchestrator
//!
//! Provider-agnostic completion trait, concrete HTTP providers (OpenAI,
//! Groq, Ollama), and the bounded-retry orchestrator that turns a
//! generation request into a validated canonical question. Providers are
//! constructed from explicit configuration; nothing in this crate reads
//! process-wide state.

use adaptiq_core::AdaptiqResult;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub mod coerce;
pub mod extract;
pub mod orchestrator;
pub mod prompt;
pub mod providers;

pub use coerce::coerce_question_payload;
pub use extract::extract_first_json_object;
pub use orchestrator::{GenerationRequest, ProviderConfig, QuestionOrchestrator};
pub use providers::{GroqProvider, OllamaProvider, OpenAiProvider};

// ============================================================================
// COMPLETION PROVIDER TRAIT
// ============================================================================

/// One completion call: a system message, a user message, and sampling
/// plus timeout bounds. Providers map this onto their own wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-call bound; a provider that exceeds it reports a timeout error
    /// rather than blocking the pipeline.
    pub timeout: Duration,
}

/// Trait for chat-completion backends.
/// Implementations must be thread-safe (Send + Sync).
///
/// # Example
/// ```ignore
/// let provider = OpenAiProvider::new(Some("sk-...".to_string()), "gpt-4o-mini");
/// let content = provider.complete(&request).await?;
/// ```
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Stable provider name used in logs and error messages.
    fn name(&self) -> &str;

    /// Whether the provider has the credentials/model it needs. The
    /// orchestrator skips unconfigured providers without consuming an
    /// attempt.
    fn is_configured(&self) -> bool {
        true
    }

    /// Run one completion.
    ///
    /// # Returns
    /// * `Ok(String)` - The raw completion text
    /// * `Err(AdaptiqError::Llm)` - If the call fails; never fatal to the
    ///   orchestrator, which advances the chain
    async fn complete(&self, request: &CompletionRequest) -> AdaptiqResult<String>;
}

// ============================================================================
// MOCK PROVIDER
// ============================================================================

/// Scripted completion provider for tests. Pops one queued response per
/// call and records every user prompt it receives.
pub struct MockCompletionProvider {
    name: String,
    configured: bool,
    responses: Mutex<VecDeque<AdaptiqResult<String>>>,
    received: Mutex<Vec<String>>,
}

impl MockCompletionProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            configured: true,
            responses: Mutex::new(VecDeque::new()),
            received: Mutex::new(Vec::new()),
        }
    }

    /// A provider the orchestrator must skip without calling.
    pub fn unconfigured(name: impl Into<String>) -> Self {
        let mut mock = Self::new(name);
        mock.configured = false;
        mock
    }

    /// Queue a scripted response.
    pub fn push_response(&self, response: AdaptiqResult<String>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Queue a successful completion body.
    pub fn push_content(&self, content: impl Into<String>) {
        self.push_response(Ok(content.into()));
    }

    /// User prompts received so far, in call order.
    pub fn received_prompts(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, request: &CompletionRequest) -> AdaptiqResult<String> {
        self.received.lock().unwrap().push(request.user.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Err(providers::request_failed(
                &self.name,
                0,
                "mock response queue exhausted",
            )),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use adaptiq_core::{AdaptiqError, LlmError};

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "system".to_string(),
            user: "user".to_string(),
            temperature: 0.4,
            max_tokens: 700,
            timeout: Duration::from_secs(60),
        }
    }

    #[tokio::test]
    async fn test_mock_pops_scripted_responses_in_order() {
        let mock = MockCompletionProvider::new("mock");
        mock.push_content("first");
        mock.push_response(Err(providers::timeout("mock", 60_000)));

        assert_eq!(mock.complete(&request()).await.unwrap(), "first");
        let err = mock.complete(&request()).await.unwrap_err();
        assert!(matches!(err, AdaptiqError::Llm(LlmError::Timeout { .. })));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_exhausted_queue_is_an_error() {
        let mock = MockCompletionProvider::new("mock");
        assert!(mock.complete(&request()).await.is_err());
    }

    #[test]
    fn test_unconfigured_mock_reports_unconfigured() {
        let mock = MockCompletionProvider::unconfigured("mock");
        assert!(!mock.is_configured());
        assert!(MockCompletionProvider::new("mock").is_configured());
    }
}
