//! Adaptiq Core - Assessment Data Types
//!
//! Pure data structures shared by every Adaptiq crate: difficulty levels,
//! quiz history turns, generated questions, retrieval snippets, tenant
//! filters, and the error taxonomy. No business logic, no I/O.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod embedding;
pub mod error;
pub mod question;
pub mod snippet;
pub mod tenant;
pub mod text;
pub mod turn;

pub use embedding::EmbeddingVector;
pub use error::{AdaptiqError, AdaptiqResult, LlmError, RetrievalError, ValidationError};
pub use question::{GeneratedQuestion, QuestionOption, QuestionType};
pub use snippet::{ContextSnippet, SnippetMeta, SourceSelection};
pub use tenant::TenantFilter;
pub use turn::QuizTurn;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a question id with a provenance prefix (`llm-`, `fallback-`).
pub fn new_question_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

// ============================================================================
// DIFFICULTY
// ============================================================================

/// Canonical question difficulty. Everything outside these three values is
/// normalized to `Medium` at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// One step harder. `Hard` saturates.
    pub fn escalate(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium | Difficulty::Hard => Difficulty::Hard,
        }
    }

    /// One step easier. `Easy` saturates.
    pub fn de_escalate(self) -> Self {
        match self {
            Difficulty::Hard => Difficulty::Medium,
            Difficulty::Medium | Difficulty::Easy => Difficulty::Easy,
        }
    }

    /// Parse a free-form difficulty label, normalizing anything
    /// unrecognized to `Medium`.
    pub fn parse_or_medium(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }

    /// Canonical lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// KNOWLEDGE LEVEL
// ============================================================================

/// Self-reported starting level for a quiz session. Maps onto a base
/// difficulty before the per-turn ratchet takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl KnowledgeLevel {
    /// Base difficulty for the first question of a session.
    pub fn base_difficulty(self) -> Difficulty {
        match self {
            KnowledgeLevel::Beginner => Difficulty::Easy,
            KnowledgeLevel::Intermediate => Difficulty::Medium,
            KnowledgeLevel::Advanced => Difficulty::Hard,
        }
    }

    /// Parse a free-form level label; unrecognized values yield `None`
    /// (callers fall back to a `Medium` base).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "beginner" => Some(KnowledgeLevel::Beginner),
            "intermediate" => Some(KnowledgeLevel::Intermediate),
            "advanced" => Some(KnowledgeLevel::Advanced),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalate_steps_up_and_saturates() {
        assert_eq!(Difficulty::Easy.escalate(), Difficulty::Medium);
        assert_eq!(Difficulty::Medium.escalate(), Difficulty::Hard);
        assert_eq!(Difficulty::Hard.escalate(), Difficulty::Hard);
    }

    #[test]
    fn test_de_escalate_steps_down_and_saturates() {
        assert_eq!(Difficulty::Hard.de_escalate(), Difficulty::Medium);
        assert_eq!(Difficulty::Medium.de_escalate(), Difficulty::Easy);
        assert_eq!(Difficulty::Easy.de_escalate(), Difficulty::Easy);
    }

    #[test]
    fn test_parse_or_medium_normalizes_unknown() {
        assert_eq!(Difficulty::parse_or_medium("easy"), Difficulty::Easy);
        assert_eq!(Difficulty::parse_or_medium(" HARD "), Difficulty::Hard);
        assert_eq!(Difficulty::parse_or_medium("extreme"), Difficulty::Medium);
        assert_eq!(Difficulty::parse_or_medium(""), Difficulty::Medium);
    }

    #[test]
    fn test_knowledge_level_base_difficulty() {
        assert_eq!(KnowledgeLevel::Beginner.base_difficulty(), Difficulty::Easy);
        assert_eq!(
            KnowledgeLevel::Intermediate.base_difficulty(),
            Difficulty::Medium
        );
        assert_eq!(KnowledgeLevel::Advanced.base_difficulty(), Difficulty::Hard);
    }

    #[test]
    fn test_knowledge_level_parse() {
        assert_eq!(KnowledgeLevel::parse("Beginner"), Some(KnowledgeLevel::Beginner));
        assert_eq!(KnowledgeLevel::parse("advanced"), Some(KnowledgeLevel::Advanced));
        assert_eq!(KnowledgeLevel::parse("expert"), None);
    }

    #[test]
    fn test_difficulty_serde_lowercase() {
        let json = serde_json::to_string(&Difficulty::Easy).unwrap();
        assert_eq!(json, "\"easy\"");
        let back: Difficulty = serde_json::from_str("\"hard\"").unwrap();
        assert_eq!(back, Difficulty::Hard);
    }

    #[test]
    fn test_new_question_id_prefix() {
        let id = new_question_id("fallback");
        assert!(id.starts_with("fallback-"));
        assert!(id.len() > "fallback-".len());
    }
}
