//! Retrieved context snippets and source selection

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata attached to a retrieved chunk by the context store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnippetMeta {
    /// Name of the ingested source document.
    #[serde(default)]
    pub source: Option<String>,
    /// Section heading inside the source, when the parser captured one.
    #[serde(default)]
    pub section: Option<String>,
    /// Remaining store-specific fields (tenant markers included).
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, String>,
}

/// A retrieved text fragment plus optional source/section metadata.
/// Ephemeral: produced per-request, never persisted by this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnippet {
    /// The chunk text.
    pub text: String,
    /// Source/section metadata.
    #[serde(default)]
    pub meta: SnippetMeta,
    /// Retrieval score, when the store reports one.
    #[serde(default)]
    pub score: Option<f32>,
}

impl ContextSnippet {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            meta: SnippetMeta::default(),
            score: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.meta.source = Some(source.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.meta.section = Some(section.into());
        self
    }

    /// Snippet text with a `Source: … | Section: …` prefix when metadata
    /// is available, as fed into prompts.
    pub fn formatted(&self) -> String {
        let mut prefix_parts = Vec::new();
        if let Some(source) = &self.meta.source {
            prefix_parts.push(format!("Source: {}", source));
        }
        if let Some(section) = &self.meta.section {
            prefix_parts.push(format!("Section: {}", section));
        }
        if prefix_parts.is_empty() {
            self.text.clone()
        } else {
            format!("{}\n{}", prefix_parts.join(" | "), self.text)
        }
    }
}

/// Which ingested sources a quiz should draw from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode", content = "source")]
pub enum SourceSelection {
    /// Most recently ingested source only.
    Latest,
    /// Second most recently ingested source.
    Previous,
    /// Every tenant-visible source.
    All,
    /// Exactly the named source, or nothing if it is not tenant-visible.
    Custom(String),
}

impl Default for SourceSelection {
    fn default() -> Self {
        SourceSelection::Latest
    }
}

// =============================================================================
// TESTS
// =============================================================================
