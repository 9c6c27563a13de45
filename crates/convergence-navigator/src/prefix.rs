//! Vocabulary-backed prefix matching.
//!
//! Approximates a prefix index over a configured domain vocabulary plus
//! the query terms of the current request. A chunk term matches a
//! vocabulary term when one is a prefix of the other and they share at
//! least [`MIN_PREFIX_LEN`] characters, so "deploy" matches
//! "deployment" and "deployments" without any stemming machinery.

use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;

use convergence_navigator_core::decompose::normalize_text;
use convergence_navigator_core::models::ContentChunk;
use convergence_navigator_core::providers::{
    PrefixEnhancement, PrefixMatchProvider, ResolutionContext,
};

const MIN_PREFIX_LEN: usize = 4;

/// Maximum enhancement contributed by prefix matching, on the engine's
/// `0..0.2` scale.
const MAX_ENHANCEMENT: f64 = 0.2;

/// Enhancement contributed per matched vocabulary term.
const PER_MATCH: f64 = 0.05;

pub struct VocabularyPrefixProvider {
    vocabulary: Vec<String>,
}

impl VocabularyPrefixProvider {
    /// Terms are normalized once at construction; short terms that can
    /// never satisfy the prefix minimum are dropped.
    pub fn new(vocabulary: &[String]) -> Self {
        Self {
            vocabulary: vocabulary
                .iter()
                .map(|t| normalize_text(t))
                .filter(|t| t.len() >= MIN_PREFIX_LEN)
                .collect(),
        }
    }
}

fn prefix_match(a: &str, b: &str) -> bool {
    let shared = a.chars().count().min(b.chars().count());
    shared >= MIN_PREFIX_LEN && a.chars().take(shared).eq(b.chars().take(shared))
}

#[async_trait]
impl PrefixMatchProvider for VocabularyPrefixProvider {
    async fn enhance(
        &self,
        chunk: &ContentChunk,
        context: &ResolutionContext,
    ) -> Result<PrefixEnhancement> {
        let terms: Vec<String> = self
            .vocabulary
            .iter()
            .cloned()
            .chain(
                context
                    .query_terms
                    .iter()
                    .map(|t| normalize_text(t))
                    .filter(|t| t.len() >= MIN_PREFIX_LEN),
            )
            .collect();
        if terms.is_empty() {
            return Ok(PrefixEnhancement::default());
        }

        let chunk_tokens: BTreeSet<String> = normalize_text(&chunk.text)
            .split_whitespace()
            .filter(|t| t.len() >= MIN_PREFIX_LEN)
            .map(str::to_string)
            .collect();

        let matched: Vec<String> = terms
            .iter()
            .filter(|term| chunk_tokens.iter().any(|token| prefix_match(term, token)))
            .cloned()
            .collect();

        let enhancement = (matched.len() as f64 * PER_MATCH).min(MAX_ENHANCEMENT);
        let confidence = (matched.len() as f64 / 4.0).min(1.0);
        let mut top_matches = matched;
        top_matches.truncate(5);

        Ok(PrefixEnhancement {
            enhancement,
            confidence,
            prefix_matches: top_matches.len(),
            top_matches,
        })
    }
}
