//! Response coercion into the canonical question shape
//!
//! Provider output is duck-typed: options arrive as lists or id-keyed
//! maps, ids may be missing, the answer may be named by id or by text.
//! Coercion normalizes all of that into a [`GeneratedQuestion`] or
//! rejects the payload (`None`) so the orchestrator can re-prompt.

use adaptiq_core::{
    new_question_id, text, Difficulty, GeneratedQuestion, QuestionOption, QuestionType,
};
use serde_json::Value;
use tracing::warn;

/// Coerce a parsed provider payload into a canonical question.
///
/// The stamped difficulty always comes from the request, never from the
/// payload. Returns `None` when the payload is missing a prompt or
/// cannot yield at least two usable options.
pub fn coerce_question_payload(
    payload: &Value,
    difficulty: Difficulty,
    topic: Option<&str>,
    focus_concept: Option<&str>,
) -> Option<GeneratedQuestion> {
    let prompt = payload
        .get("prompt")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|p| !p.is_empty())?;

    let options = coerce_options(payload.get("options")?);
    if options.len() < 2 {
        return None;
    }

    let answer_id = string_field(payload, &["answer", "correctOptionId"])
        .map(|id| id.trim().to_uppercase())
        .unwrap_or_default();
    let answer_text = string_field(payload, &["answerText", "correctOptionText"]);

    let correct_option_id = resolve_answer_id(&options, &answer_id, answer_text.as_deref());

    let explanation = payload
        .get("explanation")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(String::from);

    let question_type = payload
        .get("questionType")
        .and_then(Value::as_str)
        .map(QuestionType::parse_or_mcq)
        .unwrap_or_default();

    let concept_label = string_field(payload, &["conceptLabel"])
        .or_else(|| focus_concept.map(String::from))
        .or_else(|| topic.map(String::from));
    let focus = string_field(payload, &["focusConcept"])
        .or_else(|| focus_concept.map(String::from))
        .or_else(|| topic.map(String::from));

    let correct_option_text = answer_text
        .map(|t| text::collapse_whitespace(&t))
        .filter(|t| !t.is_empty())
        .or_else(|| {
            options
                .iter()
                .find(|o| o.id == correct_option_id)
                .map(|o| o.text.clone())
        });

    Some(GeneratedQuestion {
        question_id: string_field(payload, &["questionId"])
            .unwrap_or_else(|| new_question_id("llm")),
        prompt: prompt.to_string(),
        difficulty,
        options,
        correct_option_id,
        correct_option_text,
        explanation,
        concept_label,
        question_type,
        focus_concept: focus,
        focus_keywords: coerce_keywords(payload),
    })
}

/// Normalize raw options from either a list or an id-keyed map. Missing
/// ids are assigned positionally (`A`, `B`, ...); blank texts and
/// repeated ids are dropped.
fn coerce_options(raw: &Value) -> Vec<QuestionOption> {
    let entries: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => return Vec::new(),
    };

    let mut options = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for (idx, entry) in entries.into_iter().enumerate() {
        let (id, entry_text) = match entry {
            Value::Object(option) => (
                option
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string(),
                option.get("text").and_then(value_text),
            ),
            other => (String::new(), value_text(other)),
        };
        let id = if id.is_empty() {
            positional_id(idx)
        } else {
            id.to_uppercase()
        };
        let clean = match entry_text.map(|t| text::collapse_whitespace(&t)) {
            Some(t) if !t.is_empty() => t,
            _ => continue,
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        options.push(QuestionOption::new(id, clean));
    }
    options
}

/// Resolve the correct option id: exact id match first, then a
/// normalized-text match, then the first option with a warning.
fn resolve_answer_id(options: &[QuestionOption], answer_id: &str, answer_text: Option<&str>) -> String {
    if options.iter().any(|o| o.id == answer_id) {
        return answer_id.to_string();
    }
    if let Some(normalized_answer) = answer_text.and_then(text::normalize) {
        for option in options {
            if text::normalize(&option.text).as_deref() == Some(normalized_answer.as_str()) {
                return option.id.clone();
            }
        }
    }
    warn!("question payload missing explicit answer id; defaulting to first option");
    options[0].id.clone()
}

fn coerce_keywords(payload: &Value) -> Vec<String> {
    let raw = payload
        .get("focusKeywords")
        .or_else(|| payload.get("keywords"));
    let mut keywords: Vec<String> = match raw {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(value_text)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect(),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    };
    let mut seen = std::collections::HashSet::new();
    keywords.retain(|k| seen.insert(k.to_lowercase()));
    keywords
}

fn string_field(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| payload.get(key))
        .filter_map(value_text)
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Stringify scalar values; structured values yield `None`.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn positional_id(idx: usize) -> String {
    if idx < 26 {
        char::from(b'A' + idx as u8).to_string()
    } else {
        format!("OPT{}", idx + 1)
    }
}

// =============================================================================
// TESTS
// =============================================================================
