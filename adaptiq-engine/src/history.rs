//! Quiz history analysis
//!
//! Two pure decisions feed every generation request: how hard the next
//! question should be, and which concept it should target. Both read the
//! ordered turn history and nothing else.

use adaptiq_core::{Difficulty, KnowledgeLevel, QuizTurn};

/// Accuracy threshold above which a concept is considered strong.
const STRONG_ACCURACY: f64 = 0.9;
/// Attempts below which a strong-looking concept is still under-sampled.
const MIN_SAMPLED_ATTEMPTS: usize = 2;

/// Difficulty for the next question: a one-step ratchet off the most
/// recent turn only. No history means the self-reported level's base
/// difficulty (`Medium` when none was given).
pub fn next_difficulty(knowledge_level: Option<KnowledgeLevel>, history: &[QuizTurn]) -> Difficulty {
    let base = knowledge_level
        .map(KnowledgeLevel::base_difficulty)
        .unwrap_or(Difficulty::Medium);
    match history.last() {
        None => base,
        Some(last) if last.was_correct => last.difficulty.escalate(),
        Some(last) => last.difficulty.de_escalate(),
    }
}

/// Concept the next question should target.
///
/// Remediation first: a missed last turn with a concept label re-targets
/// that concept immediately. Otherwise labeled turns are aggregated
/// per concept (case-insensitive key, case-preserving label), ranked
/// weakest-first by `(accuracy, -attempts)`, and the first concept that
/// is either below the strong threshold or sampled at least twice wins.
/// With no qualifying concept the single weakest is returned; with no
/// labels at all, the caller's default topic.
pub fn next_focus_concept(default_topic: Option<&str>, history: &[QuizTurn]) -> Option<String> {
    if history.is_empty() {
        return default_topic.map(String::from);
    }

    if let Some(last) = history.last() {
        if let Some(label) = turn_concept(last) {
            if !last.was_correct {
                return Some(label.to_string());
            }
        }
    }

    // Insertion-ordered aggregation keyed on the lowercased label.
    let mut stats: Vec<ConceptCounter> = Vec::new();
    for turn in history {
        let Some(label) = turn_concept(turn) else {
            continue;
        };
        let key = label.to_lowercase();
        let idx = match stats.iter().position(|c| c.key == key) {
            Some(idx) => idx,
            None => {
                stats.push(ConceptCounter {
                    key,
                    label: label.to_string(),
                    attempts: 0,
                    correct: 0,
                });
                stats.len() - 1
            }
        };
        let entry = &mut stats[idx];
        entry.attempts += 1;
        if turn.was_correct {
            entry.correct += 1;
        }
    }

    if stats.is_empty() {
        return default_topic.map(String::from);
    }

    stats.sort_by(|a, b| {
        a.accuracy()
            .partial_cmp(&b.accuracy())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.attempts.cmp(&a.attempts))
    });

    for entry in &stats {
        if entry.accuracy() < STRONG_ACCURACY || entry.attempts >= MIN_SAMPLED_ATTEMPTS {
            return Some(entry.label.clone());
        }
    }
    stats.first().map(|entry| entry.label.clone())
}

struct ConceptCounter {
    key: String,
    label: String,
    attempts: usize,
    correct: usize,
}

impl ConceptCounter {
    fn accuracy(&self) -> f64 {
        if self.attempts == 0 {
            1.0
        } else {
            self.correct as f64 / self.attempts as f64
        }
    }
}

fn turn_concept(turn: &QuizTurn) -> Option<&str> {
    turn.concept_label
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty())
}

// =============================================================================
// TESTS
// =============================================================================


// =============================================================================
// PROPERTY-BASED TESTS
// =============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn difficulty_strategy() -> impl Strategy<Value = Difficulty> {
        prop_oneof![
            Just(Difficulty::Easy),
            Just(Difficulty::Medium),
            Just(Difficulty::Hard),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The ratchet never moves more than one step from the last
        /// turn's difficulty, regardless of everything before it.
        #[test]
        fn prop_ratchet_is_single_step(
            difficulties in prop::collection::vec(difficulty_strategy(), 1..10),
            outcomes in prop::collection::vec(any::<bool>(), 1..10),
        ) {
            let history: Vec<QuizTurn> = difficulties
                .iter()
                .zip(outcomes.iter())
                .map(|(d, c)| QuizTurn::new("Q", *d, *c))
                .collect();
            let next = next_difficulty(None, &history);
            let last = history.last().unwrap();
            let expected = if last.was_correct {
                last.difficulty.escalate()
            } else {
                last.difficulty.de_escalate()
            };
            prop_assert_eq!(next, expected);
        }

        /// Focus selection always lands on a concept present in history
        /// (or the default topic when no labels exist).
        #[test]
        fn prop_focus_is_from_history_or_default(
            labels in prop::collection::vec(
                prop::option::of("[A-Za-z]{3,10}"),
                1..12,
            ),
            outcomes in prop::collection::vec(any::<bool>(), 1..12),
        ) {
            let history: Vec<QuizTurn> = labels
                .iter()
                .zip(outcomes.iter())
                .map(|(label, correct)| {
                    let turn = QuizTurn::new("Q", Difficulty::Medium, *correct);
                    match label {
                        Some(l) => turn.with_concept(l.clone()),
                        None => turn,
                    }
                })
                .collect();
            let focus = next_focus_concept(Some("default"), &history);
            let focus = focus.unwrap();
            let known: Vec<String> = history
                .iter()
                .filter_map(|t| t.concept_label.clone())
                .collect();
            prop_assert!(focus == "default" || known.contains(&focus));
        }
    }
}
