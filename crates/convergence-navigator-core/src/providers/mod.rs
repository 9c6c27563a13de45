//! External capability traits consumed by the engine.
//!
//! The engine never talks to a vector database, an embedding API, or a
//! prefix index directly; it consumes these three narrow traits. All
//! operations are async (via `async-trait`) so network-backed
//! implementations can live in the application crate; the in-memory
//! implementations in [`memory`] return immediately-ready futures and
//! are what the engine tests run against.
//!
//! Unavailability is data, not an error: an embedding provider that
//! cannot produce a vector returns `Ok(None)`, and callers degrade to a
//! zero-contribution signal with a recorded reason.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::models::{ContentChunk, DimensionSet};

/// A slice of the pre-indexed corpus returned by the provider.
#[derive(Debug, Clone, Default)]
pub struct CorpusSlice {
    /// Total chunks known to the backing store (may exceed
    /// `chunks.len()` if the provider pre-filters).
    pub total: usize,
    pub chunks: Vec<ContentChunk>,
}

/// Supplies pre-indexed content chunks. The backing store is opaque to
/// the engine.
#[async_trait]
pub trait ContentCorpusProvider: Send + Sync {
    /// Fetch the chunks relevant to a decomposed intention.
    async fn fetch(&self, dimension_set: &DimensionSet) -> Result<CorpusSlice>;
}

/// Produces embedding vectors and compares them.
///
/// `embed` returning `Ok(None)` means "unavailable" — a normal,
/// non-error condition the resolver degrades around.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>>;

    /// Similarity between two vectors, `[-1, 1]`. Defaults to cosine.
    fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }
}

/// Result of a prefix-match lookup for one chunk.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrefixEnhancement {
    /// Score enhancement in `[0, 0.2]`.
    pub enhancement: f64,
    pub confidence: f64,
    pub prefix_matches: usize,
    pub top_matches: Vec<String>,
}

/// Context handed to the prefix-match lookup and the contextual
/// analysis of the zero-relevance resolver.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    pub file_name: Option<String>,
    pub folder_path: Option<String>,
    pub file_size_bytes: Option<u64>,
    pub file_modified: Option<chrono::DateTime<chrono::Utc>>,
    /// Query vocabulary the prefix matcher compares chunk terms against.
    pub query_terms: Vec<String>,
}

/// Looks up prefix-level matches for a chunk against external context.
#[async_trait]
pub trait PrefixMatchProvider: Send + Sync {
    async fn enhance(
        &self,
        chunk: &ContentChunk,
        context: &ResolutionContext,
    ) -> Result<PrefixEnhancement>;
}

/// Cosine similarity between two embedding vectors.
///
/// Returns `0.0` for empty vectors or vectors of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
