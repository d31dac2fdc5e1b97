//! Embedding vector operations

use serde::{Deserialize, Serialize};

/// Embedding vector with dynamic dimensions, produced by the embedding
/// service for retrieval queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    /// The embedding data as a vector of f32 values.
    pub data: Vec<f32>,
    /// Identifier of the model that produced this embedding.
    pub model_id: String,
}

impl EmbeddingVector {
    /// Create a new embedding vector.
    pub fn new(data: Vec<f32>, model_id: impl Into<String>) -> Self {
        Self {
            data,
            model_id: model_id.into(),
        }
    }

    /// Number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.data.len()
    }

    /// Cosine similarity against another vector. Returns 0.0 on dimension
    /// mismatch or zero-norm input rather than erroring; retrieval ranking
    /// treats those as "no signal".
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> f32 {
        if self.data.len() != other.data.len() || self.data.is_empty() {
            return 0.0;
        }

        let mut dot_product = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;

        for (a, b) in self.data.iter().zip(other.data.iter()) {
            dot_product += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let norm_a = norm_a.sqrt();
        let norm_b = norm_b.sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

// =============================================================================
// TESTS
// =============================================================================
