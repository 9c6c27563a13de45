//! `cnav resolve` — run zero-relevance resolution over the corpus.
//!
//! Walks every zero-scored chunk, runs the four-signal resolver, and
//! prints one line per chunk plus a diagnostics summary. With `--json`
//! the per-chunk results and diagnostics are emitted as one JSON object.

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::debug;

use convergence_navigator_core::providers::ResolutionContext;
use convergence_navigator_core::resolver::{
    ResolverDiagnostics, ZeroRelevanceResolution, ZeroRelevanceResolver,
};

use crate::config::Config;
use crate::corpus::JsonCorpusProvider;
use crate::embedding::create_provider;
use crate::prefix::VocabularyPrefixProvider;

#[derive(Serialize)]
struct ResolveReport {
    results: Vec<ChunkResolution>,
    diagnostics: ResolverDiagnostics,
}

#[derive(Serialize)]
struct ChunkResolution {
    chunk_id: String,
    source_document_id: String,
    #[serde(flatten)]
    resolution: ZeroRelevanceResolution,
}

pub async fn run_resolve(
    cfg: &Config,
    chunk_id: Option<&str>,
    json: bool,
    verbose: bool,
) -> Result<()> {
    let Some(corpus_path) = &cfg.corpus.path else {
        bail!("corpus.path must be set in the config file for `resolve`");
    };
    let corpus = JsonCorpusProvider::open(corpus_path)?;
    if let Some(id) = chunk_id {
        if !corpus.chunks().iter().any(|c| c.id == id) {
            bail!("no chunk with id '{}' in the corpus", id);
        }
    }

    let embedding = create_provider(&cfg.embedding)?;
    let prefix = Box::new(VocabularyPrefixProvider::new(&cfg.resolver.vocabulary));
    let mut resolver = ZeroRelevanceResolver::new(embedding, prefix, cfg.resolver.threshold);

    let mut results = Vec::new();
    for chunk in corpus.chunks() {
        if let Some(id) = chunk_id {
            if chunk.id != id {
                continue;
            }
        } else if chunk.base_relevance_score != 0.0 {
            continue;
        }
        debug!(chunk = %chunk.id, "resolving zero-relevance chunk");
        let resolution = resolver.resolve(chunk, &ResolutionContext::default()).await;
        results.push(ChunkResolution {
            chunk_id: chunk.id.clone(),
            source_document_id: chunk.source_document_id.clone(),
            resolution,
        });
    }

    if json {
        let report = ResolveReport {
            results,
            diagnostics: resolver.diagnostics().clone(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for result in &results {
        let r = &result.resolution;
        if r.skipped {
            println!("{}  skipped (non-zero base score)", result.chunk_id);
            continue;
        }
        if r.resolved {
            println!(
                "{}  resolved -> {} (combined {:.1}, via {})",
                result.chunk_id,
                r.new_score,
                r.combined,
                r.primary_signal.as_deref().unwrap_or("-")
            );
        } else {
            println!(
                "{}  unresolved (combined {:.1}, {})",
                result.chunk_id,
                r.combined,
                r.recommendation.as_deref().unwrap_or("-")
            );
        }
        if verbose {
            if let Some(breakdown) = &r.breakdown {
                println!(
                    "    semantic   {:>5.1}  {}",
                    breakdown.semantic.score, breakdown.semantic.reason
                );
                println!(
                    "    structural {:>5.1}  {}",
                    breakdown.structural.score, breakdown.structural.reason
                );
                println!(
                    "    contextual {:>5.1}  {}",
                    breakdown.contextual.score, breakdown.contextual.reason
                );
                println!(
                    "    prefix     {:>5.1}  {}",
                    breakdown.prefix.score, breakdown.prefix.reason
                );
            }
        }
    }

    let diag = resolver.diagnostics();
    println!(
        "\n{} attempted, {} resolved, {} unresolved, avg resolved score {:.1}",
        diag.attempts,
        diag.successes,
        diag.failures,
        diag.average_resolved_score()
    );
    Ok(())
}
