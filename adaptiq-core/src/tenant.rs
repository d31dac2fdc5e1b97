//! Tenant isolation filter
//!
//! An opaque predicate scoping every read to one student's visible
//! documents. The retrieval layer passes it into every store call; there
//! is no code path that reaches the store without one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-request tenant filter as field/value pairs (e.g. university +
/// roll number). Opaque to the pipeline: only the context store
/// interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TenantFilter(BTreeMap<String, String>);

impl TenantFilter {
    /// An unrestricted filter (single-tenant deployments).
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Add a field constraint.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Whether any constraint is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the constraints.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether a metadata map satisfies every constraint. A record missing
    /// a constrained field does NOT match; isolation errs on exclusion.
    pub fn matches(&self, meta: &BTreeMap<String, String>) -> bool {
        self.fields()
            .all(|(field, value)| meta.get(field).map(String::as_str) == Some(value))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_unrestricted_matches_everything() {
        let filter = TenantFilter::unrestricted();
        assert!(filter.is_empty());
        assert!(filter.matches(&meta(&[])));
        assert!(filter.matches(&meta(&[("university", "A")])));
    }

    #[test]
    fn test_matching_tenant() {
        let filter = TenantFilter::unrestricted()
            .with("university", "A")
            .with("roll_no", "1");
        assert!(filter.matches(&meta(&[("university", "A"), ("roll_no", "1")])));
    }

    #[test]
    fn test_other_tenant_rejected() {
        let filter = TenantFilter::unrestricted()
            .with("university", "A")
            .with("roll_no", "1");
        assert!(!filter.matches(&meta(&[("university", "B"), ("roll_no", "1")])));
        assert!(!filter.matches(&meta(&[("university", "A"), ("roll_no", "2")])));
    }

    #[test]
    fn test_missing_field_rejected() {
        let filter = TenantFilter::unrestricted().with("university", "A");
        assert!(!filter.matches(&meta(&[("roll_no", "1")])));
    }
}
