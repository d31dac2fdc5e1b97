//! Quiz history turns
//!
//! A turn is one completed question, immutable once recorded. The ordered
//! turn sequence is the only state a session carries between generation
//! calls. Callers historically sent either camelCase or snake_case field
//! names; the serde aliases consolidate both spellings at this boundary
//! instead of scattering lookups through the pipeline.

use crate::text;
use crate::Difficulty;
use serde::{Deserialize, Serialize};

/// One completed quiz question with the student's outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizTurn {
    /// Id of the question that was asked.
    #[serde(default, alias = "question_id")]
    pub question_id: Option<String>,
    /// The question text shown to the student.
    #[serde(alias = "question", alias = "promptText")]
    pub prompt: String,
    /// Option id the student picked.
    #[serde(default, alias = "selected_option_id")]
    pub selected_option_id: Option<String>,
    /// Option id that was correct.
    #[serde(default, alias = "correct_option_id")]
    pub correct_option_id: Option<String>,
    /// Text of the correct option.
    #[serde(default, alias = "correct_option_text")]
    pub correct_option_text: Option<String>,
    /// Difficulty the question was asked at.
    pub difficulty: Difficulty,
    /// Whether the student answered correctly.
    #[serde(alias = "was_correct")]
    pub was_correct: bool,
    /// Optional explanation shown after answering.
    #[serde(default)]
    pub explanation: Option<String>,
    /// Concept label the question targeted, when known.
    #[serde(default, alias = "concept_label")]
    pub concept_label: Option<String>,
}

impl QuizTurn {
    /// Minimal constructor for building history in tests and callers.
    pub fn new(prompt: impl Into<String>, difficulty: Difficulty, was_correct: bool) -> Self {
        Self {
            question_id: None,
            prompt: prompt.into(),
            selected_option_id: None,
            correct_option_id: None,
            correct_option_text: None,
            difficulty,
            was_correct,
            explanation: None,
            concept_label: None,
        }
    }

    /// Attach a concept label.
    pub fn with_concept(mut self, label: impl Into<String>) -> Self {
        self.concept_label = Some(label.into());
        self
    }

    /// Attach the correct option text.
    pub fn with_correct_text(mut self, answer: impl Into<String>) -> Self {
        self.correct_option_text = Some(answer.into());
        self
    }

    /// Normalized signature of the question text.
    pub fn prompt_signature(&self) -> Option<String> {
        text::normalize(&self.prompt)
    }

    /// Normalized signature of the correct-answer text.
    pub fn answer_signature(&self) -> Option<String> {
        self.correct_option_text
            .as_deref()
            .and_then(text::normalize)
    }
}

// =============================================================================
// TESTS
// =============================================================================
