//! Request orchestration: decompose an intention, fetch the corpus,
//! intersect, converge, and synthesize navigation paths.
//!
//! The [`Navigator`] owns the corpus provider and a per-instance result
//! cache keyed by the normalized intention text, so repeating the same
//! query (modulo case, accents and punctuation) does not re-run the
//! pipeline. Changing the convergence threshold invalidates the cache.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::converge::{self, ConvergenceConfig};
use crate::decompose;
use crate::error::EngineError;
use crate::intersect;
use crate::models::{Convergence, DimensionSet, Intention, Intersection, NavigationPath};
use crate::paths::{self, PathConfig};
use crate::providers::ContentCorpusProvider;

/// Engine-wide tuning, one section per pipeline stage.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub convergence: ConvergenceConfig,
    pub paths: PathConfig,
}

/// Everything one navigation request produced, from decomposition
/// through path synthesis.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationOutcome {
    pub intention: Intention,
    pub dimensions: DimensionSet,
    /// Corpus size the provider reported for this request.
    pub total_chunks: usize,
    pub intersections: Vec<Intersection>,
    pub convergences: Vec<Convergence>,
    pub convergence_count: usize,
    pub paths: Vec<NavigationPath>,
    /// Ids of the chunks backing at least one convergence.
    pub evidence_pool: Vec<String>,
    /// Fraction of the corpus the convergences filtered away, `[0, 1]`.
    pub reduction_rate: f64,
    /// Degradations recorded while producing this outcome, e.g. an
    /// unreachable corpus provider. Empty on a clean run.
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Pipeline driver with a normalized-intention result cache.
pub struct Navigator {
    corpus: Box<dyn ContentCorpusProvider>,
    config: EngineConfig,
    cache: HashMap<String, NavigationOutcome>,
}

impl Navigator {
    pub fn new(corpus: Box<dyn ContentCorpusProvider>, config: EngineConfig) -> Self {
        Self {
            corpus,
            config,
            cache: HashMap::new(),
        }
    }

    /// Run the full pipeline for a raw intention, anchored at the
    /// current wall clock.
    pub async fn navigate(&mut self, raw: &str) -> anyhow::Result<NavigationOutcome> {
        self.navigate_at(raw, Utc::now()).await
    }

    /// Run the full pipeline with an explicit temporal anchor.
    ///
    /// Cache hits return the outcome computed with the anchor of the
    /// first request for that intention.
    pub async fn navigate_at(
        &mut self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<NavigationOutcome> {
        let intention = decompose::intention(raw)?;
        if let Some(hit) = self.cache.get(&intention.normalized) {
            return Ok(hit.clone());
        }

        let dimensions = decompose::decompose_intention(&intention, now);

        // An unreachable corpus degrades to an empty slice with a
        // recorded warning; the request still produces the sentinel
        // path instead of failing.
        let mut warnings = Vec::new();
        let slice = match self.corpus.fetch(&dimensions).await {
            Ok(slice) => slice,
            Err(e) => {
                warnings.push(EngineError::provider("corpus", e.to_string()).to_string());
                Default::default()
            }
        };

        let intersections = intersect::calculate(&dimensions, &slice.chunks, now);
        let convergences =
            converge::identify_convergences(&intersections, &slice.chunks, &self.config.convergence);
        let paths = paths::generate(&convergences, &self.config.paths);

        let mut evidence_pool: Vec<String> = Vec::new();
        for convergence in &convergences {
            for &index in &convergence.evidence_chunks {
                let id = &slice.chunks[index].id;
                if !evidence_pool.iter().any(|seen| seen == id) {
                    evidence_pool.push(id.clone());
                }
            }
        }
        let reduction_rate = if slice.total > 0 {
            1.0 - evidence_pool.len() as f64 / slice.total as f64
        } else {
            0.0
        };

        let outcome = NavigationOutcome {
            intention: intention.clone(),
            dimensions,
            total_chunks: slice.total,
            intersections,
            convergence_count: convergences.len(),
            convergences,
            paths,
            evidence_pool,
            reduction_rate,
            warnings,
            generated_at: now,
        };
        self.cache.insert(intention.normalized, outcome.clone());
        Ok(outcome)
    }

    /// Adjust the convergence threshold, clamped to the unit interval.
    /// Cached outcomes were computed under the old threshold, so the
    /// cache is dropped.
    pub fn set_convergence_threshold(&mut self, threshold: f64) {
        self.config.convergence.threshold = threshold.clamp(0.0, 1.0);
        self.cache.clear();
    }

    pub fn convergence_threshold(&self) -> f64 {
        self.config.convergence.threshold
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cached_intentions(&self) -> usize {
        self.cache.len()
    }
}
