//! Completion provider implementations
//!
//! Concrete implementations of the CompletionProvider trait: OpenAI chat
//! completions, Groq (OpenAI-compatible wire format), and local Ollama.

use adaptiq_core::{AdaptiqError, LlmError};

pub mod groq;
pub mod ollama;
pub mod openai;

pub use groq::GroqProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

pub fn not_configured(provider: &str) -> AdaptiqError {
    AdaptiqError::Llm(LlmError::NotConfigured {
        provider: provider.to_string(),
    })
}

pub fn request_failed(provider: &str, status: i32, message: impl Into<String>) -> AdaptiqError {
    AdaptiqError::Llm(LlmError::RequestFailed {
        provider: provider.to_string(),
        status,
        message: message.into(),
    })
}

pub fn timeout(provider: &str, timeout_ms: u64) -> AdaptiqError {
    AdaptiqError::Llm(LlmError::Timeout {
        provider: provider.to_string(),
        timeout_ms,
    })
}

pub fn invalid_response(provider: &str, reason: impl Into<String>) -> AdaptiqError {
    AdaptiqError::Llm(LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    })
}
