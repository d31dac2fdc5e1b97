//! Adaptiq Context - Retrieval Context Assembly
//!
//! Assembles tenant-isolated retrieval context for question generation.
//! Defines the collaborator traits this layer consumes ([`ContextStore`],
//! [`Embedder`]) and the [`ContextAssembler`] that turns a topic and a
//! source selection into formatted snippets, falling back across
//! retrieval strategies when the primary path comes up empty.

use adaptiq_core::{
    AdaptiqResult, ContextSnippet, EmbeddingVector, SourceSelection, TenantFilter, Timestamp,
};
use async_trait::async_trait;
use std::sync::Arc;

// ============================================================================
// COLLABORATOR TRAITS
// ============================================================================

/// One tenant-visible source document, newest first in listings.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceStat {
    /// Source document name.
    pub name: String,
    /// When the source was ingested.
    pub ingested_at: Timestamp,
}

/// Read-only access to the chunk store. Every method takes the tenant
/// filter; this layer never issues a call without it, which is the whole
/// multi-tenant isolation guarantee it upholds.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Primary ranked retrieval for an embedded query.
    async fn search(
        &self,
        query: &EmbeddingVector,
        top_k: usize,
        allowed_sources: Option<&[String]>,
        tenant: &TenantFilter,
    ) -> AdaptiqResult<Vec<ContextSnippet>>;

    /// Secondary raw vector-similarity path, used when [`ContextStore::search`]
    /// yields nothing.
    async fn similarity_search(
        &self,
        query: &EmbeddingVector,
        top_k: usize,
        allowed_sources: Option<&[String]>,
        tenant: &TenantFilter,
    ) -> AdaptiqResult<Vec<ContextSnippet>>;

    /// Most recently ingested chunks, no embedding involved.
    async fn list_recent(
        &self,
        limit: usize,
        allowed_sources: Option<&[String]>,
        tenant: &TenantFilter,
    ) -> AdaptiqResult<Vec<ContextSnippet>>;

    /// Tenant-visible sources, most recently ingested first.
    async fn list_sources(&self, tenant: &TenantFilter) -> AdaptiqResult<Vec<SourceStat>>;
}

/// Maps text to a fixed-size numeric vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> AdaptiqResult<EmbeddingVector>;
}

// ============================================================================
// CONTEXT ASSEMBLER
// ============================================================================

/// Assembler behavior knobs.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// In `latest` mode, top up short context with chunks from other
    /// tenant-visible sources until the limit is reached.
    pub backfill_latest: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            backfill_latest: true,
        }
    }
}

/// Retrieval result: snippets plus the sources that fed them.
#[derive(Debug, Clone, Default)]
pub struct AssembledContext {
    /// Retrieved snippets, at most the requested limit.
    pub snippets: Vec<ContextSnippet>,
    /// Resolved source names: the explicit selection when one applied,
    /// otherwise derived from snippet metadata in retrieval order.
    pub sources: Vec<String>,
}

impl AssembledContext {
    /// Snippet texts with source/section prefixes, ready for prompting.
    pub fn formatted_snippets(&self) -> Vec<String> {
        self.snippets.iter().map(|s| s.formatted()).collect()
    }
}

/// Assembles retrieval context for one generation request.
pub struct ContextAssembler {
    store: Arc<dyn ContextStore>,
    embedder: Arc<dyn Embedder>,
    config: AssemblerConfig,
}

impl ContextAssembler {
    pub fn new(store: Arc<dyn ContextStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            config: AssemblerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AssemblerConfig) -> Self {
        self.config = config;
        self
    }

    /// Retrieve up to `limit` snippets for `topic` from the selected
    /// sources, always scoped by `tenant`.
    ///
    /// With a topic, the query is embedded and sent down the primary
    /// ranked path, then the secondary vector path if the primary yields
    /// nothing. Without a topic, the most recent chunks are fetched
    /// directly. In `latest` mode a short result is backfilled from other
    /// tenant-visible sources (never from another tenant).
    pub async fn assemble(
        &self,
        topic: Option<&str>,
        limit: usize,
        tenant: &TenantFilter,
        selection: &SourceSelection,
    ) -> AdaptiqResult<AssembledContext> {
        let limit = limit.max(1);

        let available = self.store.list_sources(tenant).await?;
        let selected = resolve_source_selection(selection, &available);

        // A custom source outside the tenant's visible set resolves to the
        // empty set: no snippets, never a silent widening of scope.
        if selected.is_empty() {
            if let SourceSelection::Custom(name) = selection {
                tracing::debug!(source = %name, "custom source not visible for tenant");
                return Ok(AssembledContext::default());
            }
        }

        let allowed = if selected.is_empty() {
            None
        } else {
            Some(selected.as_slice())
        };

        let mut snippets = match topic.map(str::trim).filter(|t| !t.is_empty()) {
            Some(topic) => {
                let query = self.embedder.embed(topic).await?;
                let primary = self.store.search(&query, limit, allowed, tenant).await?;
                if primary.is_empty() {
                    tracing::debug!(topic, "primary retrieval empty, trying vector search");
                    self.store
                        .similarity_search(&query, limit, allowed, tenant)
                        .await?
                } else {
                    primary
                }
            }
            None => self.store.list_recent(limit, allowed, tenant).await?,
        };
        snippets.retain(|s| !s.text.trim().is_empty());

        if snippets.len() < limit
            && *selection == SourceSelection::Latest
            && self.config.backfill_latest
        {
            let others: Vec<String> = available
                .iter()
                .map(|s| s.name.clone())
                .filter(|name| !selected.contains(name))
                .collect();
            if !others.is_empty() {
                let needed = limit - snippets.len();
                let extra = self
                    .store
                    .list_recent(needed, Some(&others), tenant)
                    .await?;
                for snippet in extra {
                    if snippet.text.trim().is_empty() {
                        continue;
                    }
                    snippets.push(snippet);
                    if snippets.len() >= limit {
                        break;
                    }
                }
            }
        }

        snippets.truncate(limit);

        let sources = if selected.is_empty() {
            derive_sources(&snippets)
        } else {
            selected
        };

        tracing::debug!(
            snippet_count = snippets.len(),
            source_count = sources.len(),
            "assembled retrieval context"
        );
        Ok(AssembledContext { snippets, sources })
    }
}

/// Map a source selection onto the tenant-visible source list
/// (most recent first).
fn resolve_source_selection(selection: &SourceSelection, available: &[SourceStat]) -> Vec<String> {
    let names: Vec<String> = available.iter().map(|s| s.name.clone()).collect();
    match selection {
        SourceSelection::All => names,
        SourceSelection::Latest => names.into_iter().take(1).collect(),
        SourceSelection::Previous => {
            if names.len() >= 2 {
                vec![names[1].clone()]
            } else {
                names.into_iter().take(1).collect()
            }
        }
        SourceSelection::Custom(name) => {
            if names.iter().any(|n| n == name) {
                vec![name.clone()]
            } else {
                Vec::new()
            }
        }
    }
}

/// Distinct source names from snippet metadata, in retrieval order.
fn derive_sources(snippets: &[ContextSnippet]) -> Vec<String> {
    let mut seen = Vec::new();
    for snippet in snippets {
        if let Some(source) = &snippet.meta.source {
            if !seen.contains(source) {
                seen.push(source.clone());
            }
        }
    }
    seen
}

// ============================================================================
// MOCK COLLABORATORS FOR TESTING
// ============================================================================

/// Mock embedder generating deterministic embeddings from text bytes.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    model_id: String,
    dimensions: usize,
}

impl MockEmbedder {
    pub fn new(model_id: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimensions,
        }
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut data = vec![0.0f32; self.dimensions];

        for (i, byte) in text.bytes().enumerate() {
            let idx = i % self.dimensions;
            data[idx] += (byte as f32) / 255.0;
        }

        let norm: f32 = data.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut data {
                *x /= norm;
            }
        }

        data
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new("mock-embed", 64)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> AdaptiqResult<EmbeddingVector> {
        Ok(EmbeddingVector::new(
            self.generate_embedding(text),
            self.model_id.clone(),
        ))
    }
}

/// In-memory context store for tests. Ranks by cosine similarity against
/// [`MockEmbedder`] embeddings and enforces the tenant filter the way a
/// real store would.
pub struct MockContextStore {
    docs: std::sync::RwLock<Vec<StoredChunk>>,
    embedder: MockEmbedder,
    primary_empty: std::sync::atomic::AtomicBool,
}

struct StoredChunk {
    snippet: ContextSnippet,
    embedding: EmbeddingVector,
    ingested_at: Timestamp,
}

impl MockContextStore {
    pub fn new() -> Self {
        Self {
            docs: std::sync::RwLock::new(Vec::new()),
            embedder: MockEmbedder::default(),
            primary_empty: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Insert a chunk. Later inserts count as more recently ingested.
    pub fn insert(&self, snippet: ContextSnippet) {
        let embedding =
            EmbeddingVector::new(self.embedder.generate_embedding(&snippet.text), "mock-embed");
        let mut docs = self.docs.write().expect("mock store lock");
        let ingested_at = chrono::Utc::now() + chrono::Duration::seconds(docs.len() as i64);
        docs.push(StoredChunk {
            snippet,
            embedding,
            ingested_at,
        });
    }

    /// Force the primary path to return nothing, exercising the
    /// secondary vector-search fallback.
    pub fn set_primary_empty(&self, empty: bool) {
        self.primary_empty
            .store(empty, std::sync::atomic::Ordering::Relaxed);
    }

    fn visible(
        &self,
        allowed_sources: Option<&[String]>,
        tenant: &TenantFilter,
    ) -> Vec<(ContextSnippet, EmbeddingVector, Timestamp)> {
        let docs = self.docs.read().expect("mock store lock");
        docs.iter()
            .filter(|chunk| tenant.matches(&chunk.snippet.meta.extra))
            .filter(|chunk| match allowed_sources {
                Some(allowed) => chunk
                    .snippet
                    .meta
                    .source
                    .as_ref()
                    .is_some_and(|s| allowed.contains(s)),
                None => true,
            })
            .map(|chunk| {
                (
                    chunk.snippet.clone(),
                    chunk.embedding.clone(),
                    chunk.ingested_at,
                )
            })
            .collect()
    }
}

impl Default for MockContextStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextStore for MockContextStore {
    async fn search(
        &self,
        query: &EmbeddingVector,
        top_k: usize,
        allowed_sources: Option<&[String]>,
        tenant: &TenantFilter,
    ) -> AdaptiqResult<Vec<ContextSnippet>> {
        if self
            .primary_empty
            .load(std::sync::atomic::Ordering::Relaxed)
        {
            return Ok(Vec::new());
        }
        self.similarity_search(query, top_k, allowed_sources, tenant)
            .await
    }

    async fn similarity_search(
        &self,
        query: &EmbeddingVector,
        top_k: usize,
        allowed_sources: Option<&[String]>,
        tenant: &TenantFilter,
    ) -> AdaptiqResult<Vec<ContextSnippet>> {
        let mut scored: Vec<(f32, ContextSnippet)> = self
            .visible(allowed_sources, tenant)
            .into_iter()
            .map(|(snippet, embedding, _)| (query.cosine_similarity(&embedding), snippet))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, mut snippet)| {
                snippet.score = Some(score);
                snippet
            })
            .collect())
    }

    async fn list_recent(
        &self,
        limit: usize,
        allowed_sources: Option<&[String]>,
        tenant: &TenantFilter,
    ) -> AdaptiqResult<Vec<ContextSnippet>> {
        let mut chunks = self.visible(allowed_sources, tenant);
        chunks.sort_by(|a, b| b.2.cmp(&a.2));
        Ok(chunks
            .into_iter()
            .take(limit)
            .map(|(snippet, _, _)| snippet)
            .collect())
    }

    async fn list_sources(&self, tenant: &TenantFilter) -> AdaptiqResult<Vec<SourceStat>> {
        let mut chunks = self.visible(None, tenant);
        chunks.sort_by(|a, b| b.2.cmp(&a.2));
        let mut stats: Vec<SourceStat> = Vec::new();
        for (snippet, _, ingested_at) in chunks {
            if let Some(name) = snippet.meta.source {
                if !stats.iter().any(|s| s.name == name) {
                    stats.push(SourceStat { name, ingested_at });
                }
            }
        }
        Ok(stats)
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
