//! Canonical generated-question shape
//!
//! This is the single output contract the engine guarantees to callers:
//! either backend-sourced and validated, or fallback-sourced, but always
//! answerable.

use crate::error::{AdaptiqResult, ValidationError};
use crate::Difficulty;
use serde::{Deserialize, Serialize};

/// The four canonical question styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    Scenario,
    TrueFalse,
    FillBlank,
}

impl QuestionType {
    /// Parse a free-form label, defaulting to `Mcq` when unrecognized.
    pub fn parse_or_mcq(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "scenario" => QuestionType::Scenario,
            "true_false" => QuestionType::TrueFalse,
            "fill_blank" => QuestionType::FillBlank,
            _ => QuestionType::Mcq,
        }
    }
}

impl Default for QuestionType {
    fn default() -> Self {
        QuestionType::Mcq
    }
}

/// One answer choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Option id, unique within the question (typically "A".."D").
    pub id: String,
    /// Display text, never empty.
    pub text: String,
}

impl QuestionOption {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Canonical generated question handed to the caller for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    /// Globally unique, generator-assigned id.
    pub question_id: String,
    /// Question text.
    pub prompt: String,
    /// Difficulty the question was generated at.
    pub difficulty: Difficulty,
    /// Ordered answer choices (2-4 entries, ids unique).
    pub options: Vec<QuestionOption>,
    /// Id of the correct choice; always resolves to a member of `options`.
    pub correct_option_id: String,
    /// Text of the correct choice.
    #[serde(default)]
    pub correct_option_text: Option<String>,
    /// Optional explanation for the answer.
    #[serde(default)]
    pub explanation: Option<String>,
    /// Concept label this question targets.
    #[serde(default)]
    pub concept_label: Option<String>,
    /// Question style.
    #[serde(default)]
    pub question_type: QuestionType,
    /// Focus concept the adaptive loop selected.
    #[serde(default)]
    pub focus_concept: Option<String>,
    /// Key terms the question exercises (deduplicated, order-preserving).
    #[serde(default)]
    pub focus_keywords: Vec<String>,
}

impl GeneratedQuestion {
    /// The option referenced by `correct_option_id`, if present.
    pub fn correct_option(&self) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == self.correct_option_id)
    }

    /// Check the structural invariants of the canonical shape: 2-4 options
    /// with unique ids and non-empty text, and a resolvable correct id.
    pub fn validate(&self) -> AdaptiqResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "prompt".to_string(),
            }
            .into());
        }
        if self.options.len() < 2 {
            return Err(ValidationError::TooFewOptions {
                question_id: self.question_id.clone(),
                found: self.options.len(),
            }
            .into());
        }
        let mut seen = std::collections::HashSet::new();
        for option in &self.options {
            if option.text.trim().is_empty() {
                return Err(ValidationError::RequiredFieldMissing {
                    field: format!("options[{}].text", option.id),
                }
                .into());
            }
            if !seen.insert(option.id.as_str()) {
                return Err(ValidationError::DuplicateOptionId {
                    question_id: self.question_id.clone(),
                    id: option.id.clone(),
                }
                .into());
            }
        }
        if self.correct_option().is_none() {
            return Err(ValidationError::Unanswerable {
                question_id: self.question_id.clone(),
                correct_id: self.correct_option_id.clone(),
            }
            .into());
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GeneratedQuestion {
        GeneratedQuestion {
            question_id: "llm-1".to_string(),
            prompt: "Which statement is accurate?".to_string(),
            difficulty: Difficulty::Medium,
            options: vec![
                QuestionOption::new("A", "First"),
                QuestionOption::new("B", "Second"),
            ],
            correct_option_id: "A".to_string(),
            correct_option_text: Some("First".to_string()),
            explanation: None,
            concept_label: None,
            question_type: QuestionType::Mcq,
            focus_concept: None,
            focus_keywords: vec![],
        }
    }

    #[test]
    fn test_valid_question_passes() {
        assert!(sample().validate().is_ok());
        assert_eq!(sample().correct_option().unwrap().text, "First");
    }

    #[test]
    fn test_dangling_correct_id_rejected() {
        let mut q = sample();
        q.correct_option_id = "Z".to_string();
        assert!(q.validate().is_err());
        assert!(q.correct_option().is_none());
    }

    #[test]
    fn test_too_few_options_rejected() {
        let mut q = sample();
        q.options.truncate(1);
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_duplicate_option_id_rejected() {
        let mut q = sample();
        q.options.push(QuestionOption::new("A", "Third"));
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_empty_option_text_rejected() {
        let mut q = sample();
        q.options[1].text = "  ".to_string();
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_question_type_parse_or_mcq() {
        assert_eq!(QuestionType::parse_or_mcq("true_false"), QuestionType::TrueFalse);
        assert_eq!(QuestionType::parse_or_mcq("fill_blank"), QuestionType::FillBlank);
        assert_eq!(QuestionType::parse_or_mcq("scenario"), QuestionType::Scenario);
        assert_eq!(QuestionType::parse_or_mcq("essay"), QuestionType::Mcq);
    }

    #[test]
    fn test_serializes_camel_case_contract() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("questionId").is_some());
        assert!(json.get("correctOptionId").is_some());
        assert!(json.get("questionType").is_some());
        assert_eq!(json["questionType"], "mcq");
    }
}
