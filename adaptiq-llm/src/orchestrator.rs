//! Question generation orchestrator
//!
//! Drives an ordered provider chain through a bounded attempt loop.
//! Each attempt sends one prompt to the first configured provider that
//! answers; malformed JSON, schema mismatches, and duplicated content
//! all feed a corrective guardrail directive into the next attempt. The
//! attempts are deliberately serial so each prompt can carry the
//! previous failure's correction. Exhaustion yields `None`, never an
//! error; the caller falls back to the deterministic generator.

use crate::coerce::coerce_question_payload;
use crate::extract::extract_first_json_object;
use crate::prompt;
use crate::providers::{GroqProvider, OllamaProvider, OpenAiProvider};
use crate::{CompletionProvider, CompletionRequest};
use adaptiq_core::{text, ContextSnippet, Difficulty, GeneratedQuestion, QuizTurn};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_TEMPERATURE: f32 = 0.45;
const DEFAULT_MAX_TOKENS: u32 = 700;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Prior signatures listed in the duplicate guardrail, at most.
const DUPLICATE_EXAMPLE_LIMIT: usize = 5;

// ============================================================================
// PROVIDER CONFIGURATION
// ============================================================================

/// Declarative configuration for one provider chain entry. The chain is
/// explicit and immutable; provider order in the list is fallback order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Provider kind: "openai", "groq", or "ollama".
    pub name: String,
    /// Base URL. Empty means the provider's hosted default.
    pub endpoint: String,
    /// Model name to request.
    pub model: String,
    /// API key, where the provider needs one.
    pub api_key: Option<String>,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: String::new(),
            model: model.into(),
            api_key: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Instantiate the configured provider. Unknown names yield `None`
    /// and are dropped from the chain with a warning.
    pub fn build(&self) -> Option<Arc<dyn CompletionProvider>> {
        match self.name.as_str() {
            "openai" => {
                let provider = if self.endpoint.is_empty() {
                    OpenAiProvider::new(self.api_key.clone(), self.model.clone())
                } else {
                    OpenAiProvider::with_base_url(
                        "openai",
                        self.endpoint.clone(),
                        self.api_key.clone(),
                        self.model.clone(),
                    )
                };
                Some(Arc::new(provider))
            }
            "groq" => Some(Arc::new(GroqProvider::new(
                self.api_key.clone(),
                self.model.clone(),
            ))),
            "ollama" => {
                let endpoint = if self.endpoint.is_empty() {
                    "http://localhost:11434".to_string()
                } else {
                    self.endpoint.clone()
                };
                Some(Arc::new(OllamaProvider::new(
                    endpoint,
                    Some(self.model.clone()),
                )))
            }
            other => {
                warn!(provider = other, "unknown provider name in configuration; skipping");
                None
            }
        }
    }
}

// ============================================================================
// GENERATION REQUEST
// ============================================================================

/// Everything one generation attempt needs, borrowed from the caller.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub topic: Option<&'a str>,
    pub focus_concept: Option<&'a str>,
    pub difficulty: Difficulty,
    pub snippets: &'a [ContextSnippet],
    pub source_names: &'a [String],
    pub history: &'a [QuizTurn],
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Ordered provider chain plus the bounded retry loop.
pub struct QuestionOrchestrator {
    providers: Vec<Arc<dyn CompletionProvider>>,
    max_attempts: usize,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl QuestionOrchestrator {
    /// Build from an already-constructed provider chain, in fallback
    /// order.
    pub fn new(providers: Vec<Arc<dyn CompletionProvider>>) -> Self {
        Self {
            providers,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build the chain from declarative configs; unknown names are
    /// dropped.
    pub fn from_configs(configs: &[ProviderConfig]) -> Self {
        Self::new(configs.iter().filter_map(ProviderConfig::build).collect())
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Generate one canonical question, or `None` when every provider
    /// and attempt produced nothing usable. `None` is not an error;
    /// the deterministic fallback takes over.
    pub async fn generate(&self, request: &GenerationRequest<'_>) -> Option<GeneratedQuestion> {
        let snippets = prompt::prepare_snippets(request.snippets);
        if snippets.is_empty() {
            debug!("no usable context snippets; skipping provider chain");
            return None;
        }

        let topic_label = request
            .topic
            .or(request.focus_concept)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("General concept");
        let overview = prompt::source_overview(request.source_names);
        let base_prompt = prompt::build_user_prompt(
            topic_label,
            request.focus_concept,
            request.difficulty,
            &overview,
            &snippets,
            request.history,
        );
        let prior_signatures = history_signatures(request.history);

        let mut guardrails = String::new();
        for attempt in 0..self.max_attempts {
            let user_prompt = format!("{}{}", base_prompt, guardrails);
            let Some(content) = self.invoke_chain(&user_prompt).await else {
                guardrails =
                    "\n\nIf you cannot access the model, try again with a novel question."
                        .to_string();
                continue;
            };

            let Some(payload) = extract_first_json_object(&content) else {
                warn!(attempt, "completion was not valid JSON");
                guardrails = "\n\nThe previous response was invalid JSON. Output valid JSON \
                              only and follow the schema exactly."
                    .to_string();
                continue;
            };

            let coerced = coerce_question_payload(
                &payload,
                request.difficulty,
                request.topic,
                request.focus_concept,
            )
            .filter(|question| question.validate().is_ok());
            let Some(question) = coerced else {
                warn!(attempt, "completion did not match the question schema");
                guardrails = "\n\nThe previous output did not match the schema. Regenerate a \
                              valid JSON object with all required fields."
                    .to_string();
                continue;
            };

            if is_duplicate(&question, &prior_signatures) {
                info!(attempt, "completion duplicated a prior question; requesting regeneration");
                guardrails = duplicate_guardrail(&prior_signatures, &overview);
                continue;
            }

            return Some(question);
        }

        None
    }

    /// One pass over the chain: first configured provider with non-empty
    /// content wins. Provider errors advance the chain, never propagate.
    async fn invoke_chain(&self, user_prompt: &str) -> Option<String> {
        let request = CompletionRequest {
            system: prompt::SYSTEM_PROMPT.to_string(),
            user: user_prompt.to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: self.timeout,
        };
        for provider in &self.providers {
            if !provider.is_configured() {
                debug!(provider = provider.name(), "provider not configured; skipping");
                continue;
            }
            match provider.complete(&request).await {
                Ok(content) if !content.trim().is_empty() => return Some(content),
                Ok(_) => {
                    warn!(provider = provider.name(), "provider returned empty content");
                }
                Err(error) => {
                    warn!(
                        provider = provider.name(),
                        %error,
                        "provider call failed; advancing chain"
                    );
                }
            }
        }
        None
    }
}

/// Normalized prompt and correct-answer signatures of all prior turns.
fn history_signatures(history: &[QuizTurn]) -> BTreeSet<String> {
    let mut signatures = BTreeSet::new();
    for turn in history {
        if let Some(sig) = turn.prompt_signature() {
            signatures.insert(sig);
        }
        if let Some(sig) = turn.answer_signature() {
            signatures.insert(sig);
        }
    }
    signatures
}

fn is_duplicate(question: &GeneratedQuestion, prior: &BTreeSet<String>) -> bool {
    if let Some(sig) = text::normalize(&question.prompt) {
        if prior.contains(&sig) {
            return true;
        }
    }
    if let Some(sig) = question
        .correct_option_text
        .as_deref()
        .and_then(text::normalize)
    {
        if prior.contains(&sig) {
            return true;
        }
    }
    false
}

fn duplicate_guardrail(prior: &BTreeSet<String>, source_overview: &str) -> String {
    let examples: Vec<&str> = prior
        .iter()
        .take(DUPLICATE_EXAMPLE_LIMIT)
        .map(String::as_str)
        .collect();
    let mut directive = format!(
        "\n\nPrevious questions or answers you must not repeat:\n{}\n\
         Generate a distinctly different question that covers a new angle or \
         sub-concept from the context.",
        examples.join("\n")
    );
    if !source_overview.is_empty() {
        directive.push_str(&format!(" Stay within these sources: {}.", source_overview));
    }
    directive
}

// =============================================================================
// TESTS
// =============================================================================
