//! Generation prompt construction
//!
//! One structured user prompt per attempt: topic, focus concept,
//! requested difficulty, selected sources, numbered context snippets, a
//! short transcript of recent turns for anti-repetition, and the strict
//! output schema. Guardrail directives from failed attempts are appended
//! by the orchestrator, not built here.

use adaptiq_core::{text, ContextSnippet, Difficulty, QuizTurn};

/// Snippets fed to a prompt, at most.
pub const SNIPPET_LIMIT: usize = 3;
/// Per-snippet character cap.
pub const SNIPPET_MAX_CHARS: usize = 600;
/// History turns shown in the transcript.
pub const HISTORY_LIMIT: usize = 3;

pub const SYSTEM_PROMPT: &str = "You are an instructional designer generating high-quality \
quiz questions from study notes. Output valid JSON only.";

const SCHEMA_BLOCK: &str = r#"{
  "prompt": string,
  "questionType": one of ['mcq','scenario','true_false','fill_blank'],
  "options": [ { "id": string, "text": string } ],
  "answer": string (option id),
  "answerText": string,
  "explanation": string,
  "focusKeywords": array of short phrases
}"#;

/// Whitespace-collapse and cap retrieved snippets for prompting. Empty
/// chunks are dropped; at most [`SNIPPET_LIMIT`] survive.
pub fn prepare_snippets(snippets: &[ContextSnippet]) -> Vec<String> {
    let mut prepared = Vec::new();
    for snippet in snippets {
        let cleaned = text::collapse_whitespace(&snippet.formatted());
        if cleaned.is_empty() {
            continue;
        }
        prepared.push(clip_chars(&cleaned, SNIPPET_MAX_CHARS));
        if prepared.len() >= SNIPPET_LIMIT {
            break;
        }
    }
    prepared
}

/// Render the last [`HISTORY_LIMIT`] turns as transcript rows, or
/// `"None"` when there is no history.
pub fn format_history(history: &[QuizTurn]) -> String {
    if history.is_empty() {
        return "None".to_string();
    }
    let start = history.len().saturating_sub(HISTORY_LIMIT);
    let rows: Vec<String> = history[start..]
        .iter()
        .map(|turn| {
            let question = clip_chars(&text::collapse_whitespace(&turn.prompt), 140);
            let answer = clip_chars(
                &text::collapse_whitespace(turn.correct_option_text.as_deref().unwrap_or("")),
                90,
            );
            let outcome = if turn.was_correct { "correct" } else { "incorrect" };
            format!("- Q: {} | Answer: {} ({})", question, answer, outcome)
        })
        .collect();
    rows.join("\n")
}

/// Deduplicated, comma-joined source names for the prompt and the
/// duplicate guardrail. Empty when no sources are known.
pub fn source_overview(source_names: &[String]) -> String {
    let mut seen = Vec::new();
    for name in source_names {
        let label = name.trim();
        if !label.is_empty() && !seen.iter().any(|s: &&str| *s == label) {
            seen.push(label);
        }
    }
    seen.join(", ")
}

/// Build the base user prompt for one generation request.
pub fn build_user_prompt(
    topic_label: &str,
    focus_concept: Option<&str>,
    difficulty: Difficulty,
    source_overview: &str,
    snippets: &[String],
    history: &[QuizTurn],
) -> String {
    let context_block: Vec<String> = snippets
        .iter()
        .enumerate()
        .map(|(idx, snippet)| format!("{}. {}", idx + 1, snippet))
        .collect();
    format!(
        "Topic: {topic}\n\
         Focus concept: {focus}\n\
         Requested difficulty: {difficulty}\n\
         Selected sources: {sources}\n\
         Context snippets:\n\
         {context}\n\n\
         Craft one adaptive quiz question grounded strictly in the context. Avoid repeating recent questions.\n\
         Recent questions:\n{history}\n\n\
         Respond with JSON only, matching this schema:\n\
         {schema}\n\
         Rules:\n\
         - Use clear, student-friendly wording.\n\
         - Keep options mutually exclusive and under 120 characters.\n\
         - For fill_blank, include exactly one blank marked as '_____'.\n\
         - For true_false, provide options 'A' (True) and 'B' (False).\n\
         - Populate focusKeywords with up to 4 important terms.\n\
         - Stay faithful to the selected sources; do not introduce outside knowledge.\n\
         - If you provide an explanation, reference the relevant source name when helpful.\n\
         - Do not reuse any previous question wording or answers; every new question must be materially different.\n",
        topic = topic_label,
        focus = focus_concept.unwrap_or(topic_label),
        difficulty = difficulty,
        sources = if source_overview.is_empty() {
            "Not specified"
        } else {
            source_overview
        },
        context = context_block.join("\n"),
        history = format_history(history),
        schema = SCHEMA_BLOCK,
    )
}

/// Char-safe prefix of `value`, at most `max_chars` characters.
fn clip_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        value.chars().take(max_chars).collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
