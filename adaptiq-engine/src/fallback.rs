//! Deterministic fallback question generator
//!
//! The last line of defense: pure, synchronous, and total. Whatever the
//! providers did, this module turns the retrieved snippets into an
//! answerable multiple-choice question. When the snippets say nothing
//! about the topic it produces a "topic miss" question that tells the
//! student their notes do not cover it, which is itself useful signal.

use adaptiq_core::{
    new_question_id, text, ContextSnippet, Difficulty, GeneratedQuestion, QuestionOption,
    QuestionType, QuizTurn,
};
use std::collections::HashSet;
use tracing::debug;

/// Answer statements longer than this are cut at a word boundary.
const STATEMENT_MAX_CHARS: usize = 220;
/// Statements with more digits than this read like tables, not prose.
const MAX_DIGITS: usize = 8;
/// Minimum words for a statement to stand alone as an answer.
const MIN_WORDS: usize = 5;

/// Generate a question without any provider. Total: always returns a
/// valid, answerable question.
pub fn fallback_question(
    topic: Option<&str>,
    snippets: &[ContextSnippet],
    difficulty: Difficulty,
    focus_concept: Option<&str>,
    history: &[QuizTurn],
) -> GeneratedQuestion {
    let topic_label = topic
        .or(focus_concept)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("the material");

    let sentences = extract_statements(snippets);
    let topic_terms = text::terms(topic_label, 3);
    let focus_terms = focus_concept
        .map(|f| text::terms(f, 3))
        .unwrap_or_default();
    let used = used_signatures(history);

    let mut best: Option<&str> = None;
    let mut best_score: i64 = -1;
    for sentence in &sentences {
        let Some(normalized) = text::normalize(sentence) else {
            continue;
        };
        if used.contains(&normalized) {
            continue;
        }
        let score = score_statement(&normalized, &topic_terms, &focus_terms);
        if score > best_score {
            best_score = score;
            best = Some(sentence);
        }
    }

    // Nothing unused matched - reuse the first sentence rather than repeat
    // the scoring pass, but treat it as unscored.
    if best.is_none() {
        if let Some(first) = sentences.iter().find(|s| text::normalize(s).is_some()) {
            best = Some(first);
            best_score = 0;
        }
    }

    let Some(statement) = best else {
        debug!(topic = topic_label, "no usable statements; topic-miss fallback");
        return topic_miss_question(topic_label, difficulty, focus_concept);
    };
    if best_score <= 0 && !topic_terms.is_empty() {
        debug!(topic = topic_label, "statements never mention topic; topic-miss fallback");
        return topic_miss_question(topic_label, difficulty, focus_concept);
    }

    let correct_text = text::truncate_at_word(statement.trim(), STATEMENT_MAX_CHARS);
    let concept = focus_concept.unwrap_or(topic_label).to_string();
    let options = vec![
        QuestionOption::new("A", correct_text.clone()),
        QuestionOption::new(
            "B",
            format!(
                "The notes argue that {} is unrelated to the material under review.",
                topic_label
            ),
        ),
        QuestionOption::new(
            "C",
            format!(
                "They insist that {} has been completely deprecated in practice.",
                topic_label
            ),
        ),
        QuestionOption::new("D", "They present the opposite claim of the provided passage."),
    ];

    GeneratedQuestion {
        question_id: new_question_id("fallback"),
        prompt: format!(
            "According to the notes, which statement is accurate about {}?",
            topic_label
        ),
        difficulty,
        options,
        correct_option_id: "A".to_string(),
        correct_option_text: Some(correct_text),
        explanation: None,
        concept_label: Some(concept.clone()),
        question_type: QuestionType::Mcq,
        focus_concept: Some(concept),
        focus_keywords: Vec::new(),
    }
}

/// The question produced when retrieval found nothing on-topic.
fn topic_miss_question(
    topic_label: &str,
    difficulty: Difficulty,
    focus_concept: Option<&str>,
) -> GeneratedQuestion {
    let concept = focus_concept.unwrap_or(topic_label).to_string();
    let first_option = format!(
        "Locate or upload study material that covers {}, then retry the quiz.",
        topic_label
    );
    GeneratedQuestion {
        question_id: new_question_id("fallback"),
        prompt: format!(
            "The current notes do not contain enough details about {}. What should you do next to prepare for this topic?",
            topic_label
        ),
        difficulty,
        options: vec![
            QuestionOption::new("A", first_option.clone()),
            QuestionOption::new("B", "Guess the answers until a new question appears."),
            QuestionOption::new(
                "C",
                "Disable the topic filter so the quiz uses unrelated notes.",
            ),
            QuestionOption::new("D", "Skip preparing; the topic will not be assessed."),
        ],
        correct_option_id: "A".to_string(),
        correct_option_text: Some(first_option),
        explanation: Some(format!(
            "Local fallback: no retrieved notes mention {}. Add relevant content or enable an LLM provider for richer questions.",
            topic_label
        )),
        concept_label: Some(concept.clone()),
        question_type: QuestionType::Mcq,
        focus_concept: Some(concept),
        focus_keywords: Vec::new(),
    }
}

/// Term-overlap score: whole-token topic hits weigh 3, focus hits 2;
/// when neither matches a token, substring hits count 1 each.
fn score_statement(normalized: &str, topic_terms: &[String], focus_terms: &[String]) -> i64 {
    let tokens: HashSet<String> = text::tokens(normalized).into_iter().collect();
    let mut score: i64 = 0;
    score += 3 * topic_terms.iter().filter(|t| tokens.contains(*t)).count() as i64;
    score += 2 * focus_terms.iter().filter(|t| tokens.contains(*t)).count() as i64;
    if score == 0 {
        score += topic_terms.iter().filter(|t| normalized.contains(*t)).count() as i64;
        score += focus_terms.iter().filter(|t| normalized.contains(*t)).count() as i64;
    }
    score
}

/// Normalized prompt and correct-answer texts from prior turns; the
/// fallback never reuses a statement the student has already seen.
fn used_signatures(history: &[QuizTurn]) -> HashSet<String> {
    let mut used = HashSet::new();
    for turn in history {
        if let Some(sig) = turn.prompt_signature() {
            used.insert(sig);
        }
        if let Some(sig) = turn.answer_signature() {
            used.insert(sig);
        }
    }
    used
}

/// Split snippet texts into sanitized candidate statements.
fn extract_statements(snippets: &[ContextSnippet]) -> Vec<String> {
    let mut statements = Vec::new();
    for snippet in snippets {
        for sentence in split_sentences(&snippet.text) {
            if let Some(cleaned) = sanitize_statement(&sentence) {
                statements.push(cleaned);
            }
        }
    }
    statements
}

/// Sentence boundaries: `.`, `!`, or `?` followed by whitespace (or end
/// of text). Decimal points and the like never split.
fn split_sentences(value: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?')
            && chars.peek().map_or(true, |next| next.is_whitespace())
        {
            sentences.push(std::mem::take(&mut current));
            while chars.peek().is_some_and(|next| next.is_whitespace()) {
                chars.next();
            }
        }
    }
    if !current.trim().is_empty() {
        sentences.push(current);
    }
    sentences
}

/// Reject fragments that would make nonsense answer options: URL-ish
/// text, fewer than five words, digit-heavy rows, or dash-runs of
/// table-of-contents noise. Survivors are capped at 220 characters.
fn sanitize_statement(value: &str) -> Option<String> {
    let cleaned = text::collapse_whitespace(value);
    let cleaned = cleaned
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | ' '))
        .to_string();
    if cleaned.is_empty() {
        return None;
    }
    let lowered = cleaned.to_lowercase();
    if ["http://", "https://", "www."]
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        return None;
    }
    if cleaned.split_whitespace().count() < MIN_WORDS {
        return None;
    }
    if cleaned.chars().filter(|c| c.is_ascii_digit()).count() > MAX_DIGITS {
        return None;
    }
    if cleaned.matches(" - ").count() >= 4 {
        return None;
    }
    Some(text::truncate_at_word(&cleaned, STATEMENT_MAX_CHARS))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(text: &str) -> ContextSnippet {
        ContextSnippet::new(text)
    }

    #[test]
    fn test_matching_sentence_becomes_option_a() {
        let snippets = vec![snippet(
            "The mitochondria is the powerhouse of the cell.",
        )];
        let q = fallback_question(
            Some("mitochondria"),
            &snippets,
            Difficulty::Medium,
            None,
            &[],
        );
        assert_eq!(q.correct_option_id, "A");
        assert_eq!(
            q.options[0].text,
            "The mitochondria is the powerhouse of the cell."
        );
        assert_eq!(
            q.correct_option_text.as_deref(),
            Some("The mitochondria is the powerhouse of the cell.")
        );
        assert!(q.prompt.contains("mitochondria"));
        assert!(q.question_id.starts_with("fallback-"));
        assert_eq!(q.options.len(), 4);
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_unrelated_topic_yields_topic_miss() {
        let snippets = vec![snippet(
            "The French Revolution began in 1789 and reshaped Europe.",
        )];
        let q = fallback_question(
            Some("quantum computing"),
            &snippets,
            Difficulty::Easy,
            None,
            &[],
        );
        assert!(q.prompt.contains("do not contain enough details about quantum computing"));
        assert_eq!(q.correct_option_id, "A");
        assert!(q.options[0].text.contains("quantum computing"));
        assert!(q.explanation.as_deref().unwrap_or("").contains("Local fallback"));
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_empty_snippets_yield_topic_miss() {
        let q = fallback_question(Some("anything"), &[], Difficulty::Hard, None, &[]);
        assert!(q.prompt.contains("do not contain enough details"));
        assert_eq!(q.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_history_excludes_already_used_statement() {
        let snippets = vec![snippet(
            "Mitosis is how cells divide for growth. Mitosis repair happens in somatic cells daily.",
        )];
        let history = vec![QuizTurn::new("Old question", Difficulty::Medium, true)
            .with_correct_text("Mitosis is how cells divide for growth.")];
        let q = fallback_question(Some("mitosis"), &snippets, Difficulty::Medium, None, &history);
        assert_eq!(
            q.options[0].text,
            "Mitosis repair happens in somatic cells daily."
        );
    }

    #[test]
    fn test_focus_terms_break_topic_ties() {
        let snippets = vec![snippet(
            "Cell walls protect plant structure always. Cell membranes control osmosis in detail.",
        )];
        let q = fallback_question(
            Some("cell"),
            &snippets,
            Difficulty::Medium,
            Some("osmosis"),
            &[],
        );
        assert!(q.options[0].text.contains("osmosis"));
        assert_eq!(q.focus_concept.as_deref(), Some("osmosis"));
        assert_eq!(q.concept_label.as_deref(), Some("osmosis"));
    }

    #[test]
    fn test_no_topic_uses_focus_then_generic_label() {
        let snippets = vec![snippet("Osmosis moves water across membranes constantly.")];
        let q = fallback_question(None, &snippets, Difficulty::Medium, Some("osmosis"), &[]);
        assert!(q.prompt.contains("osmosis"));

        // No topic or focus: the generic label never matches the notes,
        // so the topic-miss question reports it.
        let q2 = fallback_question(None, &snippets, Difficulty::Medium, None, &[]);
        assert!(q2.prompt.contains("the material"));
        assert!(q2.prompt.contains("do not contain enough details"));
    }

    #[test]
    fn test_long_statement_truncated_at_word_boundary() {
        let long = format!("The mitochondria {} end.", "supports cellular energy ".repeat(15));
        let snippets = vec![snippet(&long)];
        let q = fallback_question(Some("mitochondria"), &snippets, Difficulty::Medium, None, &[]);
        assert!(q.options[0].text.ends_with("..."));
        assert!(q.options[0].text.chars().count() <= STATEMENT_MAX_CHARS + 3);
    }

    #[test]
    fn test_sanitize_rejects_noise() {
        assert!(sanitize_statement("See https://example.com for details today").is_none());
        assert!(sanitize_statement("Visit www.example.com for the full chapter").is_none());
        assert!(sanitize_statement("too short here").is_none());
        assert!(sanitize_statement("Call 123 456 789 012 at extension 345 now").is_none());
        assert!(sanitize_statement(
            "alpha - beta - gamma - delta - epsilon entries in the index"
        )
        .is_none());
        assert_eq!(
            sanitize_statement("  'The  cell divides   during mitosis.'  "),
            Some("The cell divides during mitosis.".to_string())
        );
    }

    #[test]
    fn test_split_sentences_respects_decimals() {
        let parts = split_sentences("Pi is roughly 3.14 in value. The next fact follows! Done?");
        assert_eq!(
            parts,
            vec![
                "Pi is roughly 3.14 in value.",
                "The next fact follows!",
                "Done?"
            ]
        );
    }

    #[test]
    fn test_split_sentences_keeps_trailing_fragment() {
        let parts = split_sentences("One complete sentence here. trailing fragment without stop");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1], "trailing fragment without stop");
    }
}

// =============================================================================
// PROPERTY-BASED TESTS
// =============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Total function: any topic and any snippet soup still produces
        /// a structurally valid, answerable question.
        #[test]
        fn prop_fallback_always_valid(
            topic in prop::option::of("[A-Za-z ]{1,30}"),
            texts in prop::collection::vec(".{0,300}", 0..6),
        ) {
            let snippets: Vec<ContextSnippet> =
                texts.iter().map(ContextSnippet::new).collect();
            let q = fallback_question(
                topic.as_deref(),
                &snippets,
                Difficulty::Medium,
                None,
                &[],
            );
            prop_assert!(q.validate().is_ok());
            prop_assert_eq!(q.correct_option_id.as_str(), "A");
            prop_assert!(q.question_id.starts_with("fallback-"));
            prop_assert!(q.correct_option().is_some());
        }
    }
}
