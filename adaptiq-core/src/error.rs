//! Error types for Adaptiq operations

use thiserror::Error;

/// Retrieval layer errors (context store and embedding service).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("Context store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("Context store query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Embedding failed: {reason}")]
    EmbeddingFailed { reason: String },
}

/// LLM provider errors. All of these are recoverable inside the
/// orchestrator by advancing the provider chain; none is fatal to a
/// generation request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("Provider {provider} is not configured")]
    NotConfigured { provider: String },

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Request to {provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Validation errors for canonical question payloads.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Question {question_id} needs at least 2 options, found {found}")]
    TooFewOptions { question_id: String, found: usize },

    #[error("Duplicate option id {id} in question {question_id}")]
    DuplicateOptionId { question_id: String, id: String },

    #[error("Question {question_id} has no option matching correct id {correct_id}")]
    Unanswerable {
        question_id: String,
        correct_id: String,
    },
}

/// Master error type for all Adaptiq errors.
#[derive(Debug, Clone, Error)]
pub enum AdaptiqError {
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for Adaptiq operations.
pub type AdaptiqResult<T> = Result<T, AdaptiqError>;

// =============================================================================
// TESTS
// =============================================================================
