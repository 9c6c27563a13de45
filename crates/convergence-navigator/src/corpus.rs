//! JSON-file corpus provider.
//!
//! The corpus is a JSON array of chunks produced by an upstream indexing
//! step. The whole file is loaded at construction; `fetch` filters by
//! temporal window when the decomposed intention has one, so the engine
//! scores fewer obviously-stale chunks.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;

use convergence_navigator_core::models::{ContentChunk, DimensionSet};
use convergence_navigator_core::providers::{ContentCorpusProvider, CorpusSlice};

/// Corpus provider backed by a JSON file loaded once at startup.
pub struct JsonCorpusProvider {
    chunks: Vec<ContentChunk>,
}

impl JsonCorpusProvider {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            chunks: load_chunks(path)?,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[ContentChunk] {
        &self.chunks
    }
}

#[async_trait]
impl ContentCorpusProvider for JsonCorpusProvider {
    async fn fetch(&self, dimension_set: &DimensionSet) -> Result<CorpusSlice> {
        let chunks: Vec<ContentChunk> = match &dimension_set.temporal {
            // Chunks without a timestamp are kept; the temporal scorer
            // gives them 0 on that dimension but they can still match
            // non-temporal combinations.
            Some(temporal) => self
                .chunks
                .iter()
                .filter(|c| match c.last_modified {
                    Some(modified) => modified >= temporal.start_date,
                    None => true,
                })
                .cloned()
                .collect(),
            None => self.chunks.clone(),
        };

        Ok(CorpusSlice {
            total: self.chunks.len(),
            chunks,
        })
    }
}

/// Read and deserialize a chunk corpus from a JSON array file.
pub fn load_chunks(path: &Path) -> Result<Vec<ContentChunk>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
    let chunks: Vec<ContentChunk> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse corpus file: {}", path.display()))?;
    Ok(chunks)
}
