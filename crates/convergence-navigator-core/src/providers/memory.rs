//! In-memory provider implementations for testing and offline use.
//!
//! These return immediately-ready futures and have no I/O. The
//! embedding stub projects text into a small deterministic vector via
//! byte histograms, which is enough for similarity comparisons in
//! tests without a model.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ContentChunk, DimensionSet};

use super::{
    ContentCorpusProvider, CorpusSlice, EmbeddingProvider, PrefixEnhancement,
    PrefixMatchProvider, ResolutionContext,
};

/// Corpus provider over a fixed chunk list.
pub struct StaticCorpusProvider {
    chunks: Vec<ContentChunk>,
}

impl StaticCorpusProvider {
    pub fn new(chunks: Vec<ContentChunk>) -> Self {
        Self { chunks }
    }
}

#[async_trait]
impl ContentCorpusProvider for StaticCorpusProvider {
    async fn fetch(&self, _dimension_set: &DimensionSet) -> Result<CorpusSlice> {
        Ok(CorpusSlice {
            total: self.chunks.len(),
            chunks: self.chunks.clone(),
        })
    }
}

/// Dimensionality of the stub embedding space.
const STUB_DIMS: usize = 32;

/// Deterministic embedding stub: a normalized byte histogram projected
/// into [`STUB_DIMS`] buckets. Similar texts land near each other,
/// which is all the resolver's semantic analysis needs under test.
pub struct HashEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>> {
        if text.is_empty() {
            return Ok(None);
        }
        let mut buckets = vec![0.0f32; STUB_DIMS];
        for byte in text.bytes() {
            buckets[byte as usize % STUB_DIMS] += 1.0;
        }
        let norm = buckets.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut buckets {
                *v /= norm;
            }
        }
        Ok(Some(buckets))
    }
}

/// Embedding provider that is always unavailable.
pub struct UnavailableEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for UnavailableEmbeddingProvider {
    async fn embed(&self, _text: &str) -> Result<Option<Vec<f32>>> {
        Ok(None)
    }
}

/// Prefix provider returning a fixed enhancement.
pub struct FixedPrefixProvider {
    pub enhancement: f64,
    pub confidence: f64,
}

impl FixedPrefixProvider {
    /// A provider that never enhances anything.
    pub fn none() -> Self {
        Self {
            enhancement: 0.0,
            confidence: 0.0,
        }
    }
}

#[async_trait]
impl PrefixMatchProvider for FixedPrefixProvider {
    async fn enhance(
        &self,
        _chunk: &ContentChunk,
        _context: &ResolutionContext,
    ) -> Result<PrefixEnhancement> {
        Ok(PrefixEnhancement {
            enhancement: self.enhancement.clamp(0.0, 0.2),
            confidence: self.confidence,
            prefix_matches: if self.enhancement > 0.0 { 1 } else { 0 },
            top_matches: Vec::new(),
        })
    }
}
