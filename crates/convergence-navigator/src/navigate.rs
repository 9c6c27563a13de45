//! `cnav navigate` — run the full pipeline and print navigation paths.

use anyhow::{bail, Result};
use tracing::{debug, warn};

use convergence_navigator_core::models::{NavigationPath, PathType};
use convergence_navigator_core::navigate::{NavigationOutcome, Navigator};

use crate::config::Config;
use crate::corpus::JsonCorpusProvider;

pub async fn run_navigate(
    cfg: &Config,
    intention: &str,
    threshold: Option<f64>,
    json: bool,
    explain: bool,
) -> Result<()> {
    let Some(corpus_path) = &cfg.corpus.path else {
        bail!("corpus.path must be set in the config file for `navigate`");
    };
    let provider = JsonCorpusProvider::open(corpus_path)?;
    debug!(chunks = provider.len(), "corpus loaded");

    let mut navigator = Navigator::new(Box::new(provider), cfg.engine.to_engine_config());
    if let Some(threshold) = threshold {
        navigator.set_convergence_threshold(threshold);
    }

    let outcome = navigator.navigate(intention).await?;
    for warning in &outcome.warnings {
        warn!("{warning}");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    print_outcome(&outcome, explain);
    Ok(())
}

fn print_outcome(outcome: &NavigationOutcome, explain: bool) {
    println!("Intention: {}", outcome.intention.raw);
    println!(
        "Dimensions: {} active, confidence {:.2}",
        outcome.dimensions.active_dimensions().len(),
        outcome.dimensions.confidence
    );
    if let Some(temporal) = &outcome.dimensions.temporal {
        println!(
            "  temporal    {} .. {} ({} days)",
            temporal.start_date.format("%Y-%m-%d"),
            temporal.end_date.format("%Y-%m-%d"),
            temporal.day_window
        );
    }
    if !outcome.dimensions.semantic.is_empty() {
        println!("  semantic    {}", outcome.dimensions.semantic.join(", "));
    }
    if !outcome.dimensions.categorical.is_empty() {
        println!("  categorical {}", outcome.dimensions.categorical.join(", "));
    }
    if let Some(analytical) = &outcome.dimensions.analytical {
        println!("  analytical  {analytical}");
    }
    println!(
        "Corpus: {} chunks, {} converged, reduction {:.0}%",
        outcome.total_chunks,
        outcome.convergence_count,
        outcome.reduction_rate * 100.0
    );
    println!();

    if explain {
        println!(
            "Intersections ({} over {} chunks):",
            outcome.intersections.len(),
            outcome.total_chunks
        );
        for intersection in &outcome.intersections {
            let dims: Vec<&str> = intersection.dimensions.iter().map(|d| d.name()).collect();
            println!(
                "  [{}] chunks={} density={:.3} confidence={:.2}",
                dims.join("+"),
                intersection.matching_chunks.len(),
                intersection.density,
                intersection.confidence
            );
        }
        println!();

        println!("Convergences ({}):", outcome.convergences.len());
        for convergence in &outcome.convergences {
            println!(
                "  #{} {} density={:.3} intersections={} evidence={}",
                convergence.rank,
                convergence.source_document_id,
                convergence.average_density,
                convergence.contributing_intersections.len(),
                convergence.evidence_chunks.len()
            );
        }
        println!();
    }

    for path in &outcome.paths {
        print_path(path);
    }
}

fn print_path(path: &NavigationPath) {
    let kind = match path.path_type {
        PathType::Primary => "PRIMARY",
        PathType::Alternative => "alternative",
    };
    println!("[{kind}] {}", path.id);
    if path.tag.is_none() {
        println!("  density {:.3}  strength {:.3}", path.density, path.strength);
    }
    println!("  {}", path.narrative);
    if !path.evidence_documents.is_empty() {
        println!("  evidence: {}", path.evidence_documents.join(", "));
    }
    for (i, step) in path.suggested_steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
    for question in &path.guiding_questions {
        println!("  ? {question}");
    }
    for link in &path.cross_links {
        println!("  ↔ {} ({:.2})", link.target, link.strength);
    }
    println!();
}
