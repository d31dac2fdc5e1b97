//! Quiz summary aggregation
//!
//! Built once the history reaches the session's question count: overall
//! accuracy, per-difficulty and per-concept breakdowns, and the concepts
//! worth revising next.

use adaptiq_core::{Difficulty, QuizTurn};
use serde::{Deserialize, Serialize};

/// Concepts below this accuracy are recommended for revision.
const RECOMMEND_BELOW: f64 = 0.75;
const RECOMMEND_LIMIT: usize = 3;

/// Per-difficulty slice of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyBreakdown {
    pub difficulty: Difficulty,
    pub attempts: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub accuracy: f64,
}

/// Per-concept slice of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptBreakdown {
    pub concept: String,
    pub attempts: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub accuracy: f64,
}

/// End-of-session summary handed back instead of another question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub total_questions: usize,
    pub correct_count: usize,
    pub incorrect_count: usize,
    /// Overall accuracy, rounded to two decimals.
    pub accuracy: f64,
    /// Concepts ordered by most attempts, then highest accuracy.
    pub concept_breakdown: Vec<ConceptBreakdown>,
    /// Only difficulties that were actually asked appear.
    pub difficulty_breakdown: Vec<DifficultyBreakdown>,
    /// Up to three weak concepts worth revising.
    pub recommended_concepts: Vec<String>,
}

/// Aggregate a finished session's history. Turns without a concept label
/// are attributed to the session topic, or "Core concept" without one.
pub fn build_summary(topic: Option<&str>, history: &[QuizTurn]) -> QuizSummary {
    let total = history.len();
    let correct = history.iter().filter(|t| t.was_correct).count();

    let difficulty_breakdown = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
        .into_iter()
        .filter_map(|difficulty| {
            let subset: Vec<&QuizTurn> = history
                .iter()
                .filter(|t| t.difficulty == difficulty)
                .collect();
            if subset.is_empty() {
                return None;
            }
            let attempts = subset.len();
            let diff_correct = subset.iter().filter(|t| t.was_correct).count();
            Some(DifficultyBreakdown {
                difficulty,
                attempts,
                correct: diff_correct,
                incorrect: attempts - diff_correct,
                accuracy: round2(diff_correct as f64 / attempts as f64),
            })
        })
        .collect();

    // Insertion-ordered per-concept counters.
    let mut concepts: Vec<ConceptBreakdown> = Vec::new();
    for turn in history {
        let label = turn
            .concept_label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .or(topic)
            .unwrap_or("Core concept");
        let idx = match concepts.iter().position(|c| c.concept == label) {
            Some(idx) => idx,
            None => {
                concepts.push(ConceptBreakdown {
                    concept: label.to_string(),
                    attempts: 0,
                    correct: 0,
                    incorrect: 0,
                    accuracy: 0.0,
                });
                concepts.len() - 1
            }
        };
        let entry = &mut concepts[idx];
        entry.attempts += 1;
        if turn.was_correct {
            entry.correct += 1;
        }
    }
    for entry in &mut concepts {
        entry.incorrect = entry.attempts - entry.correct;
        entry.accuracy = round2(entry.correct as f64 / entry.attempts as f64);
    }
    concepts.sort_by(|a, b| {
        b.attempts.cmp(&a.attempts).then(
            b.accuracy
                .partial_cmp(&a.accuracy)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });

    let recommended = concepts
        .iter()
        .filter(|c| c.accuracy < RECOMMEND_BELOW)
        .take(RECOMMEND_LIMIT)
        .map(|c| c.concept.clone())
        .collect();

    QuizSummary {
        total_questions: total,
        correct_count: correct,
        incorrect_count: total - correct,
        accuracy: if total == 0 {
            0.0
        } else {
            round2(correct as f64 / total as f64)
        },
        concept_breakdown: concepts,
        difficulty_breakdown,
        recommended_concepts: recommended,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// TESTS
// =============================================================================
