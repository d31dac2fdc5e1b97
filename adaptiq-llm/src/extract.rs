//! Balanced-JSON extraction from completion text
//!
//! Models are told to answer with JSON only, but routinely wrap the
//! object in prose or code fences. [`extract_first_json_object`] parses
//! the whole body first and, failing that, scans for the first balanced
//! `{...}` object, respecting string literals and escapes.

use serde_json::Value;

/// Extract the first JSON object from a completion body.
/// Returns `None` when no parseable object is present.
pub fn extract_first_json_object(content: &str) -> Option<Value> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
    }
    let candidate = first_balanced_object(trimmed)?;
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
}

/// Slice of the first balanced top-level `{...}` in `content`, or `None`
/// when braces never balance.
fn first_balanced_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in content[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

// =============================================================================
// TESTS
// =============================================================================


// =============================================================================
// PROPERTY-BASED TESTS
// =============================================================================
