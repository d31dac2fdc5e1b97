//! Text normalization helpers
//!
//! Shared by duplicate detection, coercion, and the fallback generator.
//! All comparisons in the pipeline go through [`normalize`] so that a
//! question differing only in casing or whitespace counts as a repeat.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(value: &str) -> String {
    WHITESPACE_RE.replace_all(value, " ").trim().to_string()
}

/// Normalized signature of a text: whitespace-collapsed and lower-cased.
/// Returns `None` for blank input.
pub fn normalize(value: &str) -> Option<String> {
    let compact = collapse_whitespace(value);
    if compact.is_empty() {
        None
    } else {
        Some(compact.to_lowercase())
    }
}

/// Lower-cased word tokens of a text.
pub fn tokens(value: &str) -> Vec<String> {
    WORD_RE
        .find_iter(&value.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Lower-cased word tokens with at least `min_len` characters. Used to
/// turn a topic label into matchable terms.
pub fn terms(value: &str, min_len: usize) -> Vec<String> {
    tokens(value)
        .into_iter()
        .filter(|t| t.len() >= min_len)
        .collect()
}

/// Truncate to at most `max_len` characters at a word boundary, appending
/// an ellipsis marker when anything was cut.
pub fn truncate_at_word(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        return value.to_string();
    }
    let mut snippet: String = value.chars().take(max_len).collect();
    snippet.truncate(snippet.trim_end().len());
    if let Some(idx) = snippet.rfind(' ') {
        snippet.truncate(idx);
    }
    format!("{}...", snippet)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n b\t\tc  "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_normalize_lowercases_and_collapses() {
        assert_eq!(
            normalize("  What   IS  x? "),
            Some("what is x?".to_string())
        );
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn test_tokens_and_terms() {
        assert_eq!(tokens("The cell's wall"), vec!["the", "cell", "s", "wall"]);
        assert_eq!(terms("The cell's wall", 3), vec!["the", "cell", "wall"]);
        assert!(terms("a b", 3).is_empty());
    }

    #[test]
    fn test_truncate_short_input_untouched() {
        assert_eq!(truncate_at_word("short sentence", 220), "short sentence");
    }

    #[test]
    fn test_truncate_cuts_at_word_boundary() {
        let long = "alpha beta gamma delta epsilon";
        let cut = truncate_at_word(long, 15);
        assert!(cut.ends_with("..."));
        // no partial word before the marker
        assert_eq!(cut, "alpha beta...");
        assert!(cut.chars().count() <= 15 + 3);
    }

    #[test]
    fn test_truncate_multibyte_safe() {
        let value = "é".repeat(300);
        let cut = truncate_at_word(&value, 220);
        assert!(cut.ends_with("..."));
        assert!(cut.chars().count() <= 223);
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

        /// Normalization is idempotent: normalizing a normalized value
        /// changes nothing.
        #[test]
        fn prop_normalize_idempotent(value in ".{0,200}") {
            if let Some(first) = normalize(&value) {
                prop_assert_eq!(normalize(&first), Some(first.clone()));
            }
        }

        /// Truncation never exceeds the budget plus the ellipsis marker.
        #[test]
        fn prop_truncate_bounded(value in ".{0,500}", max_len in 5usize..300) {
            let cut = truncate_at_word(&value, max_len);
            prop_assert!(cut.chars().count() <= max_len + 3);
        }
    }
}
