//! Navigation path synthesis: convergences → explorable, cross-linked
//! paths.
//!
//! Each convergence becomes a path carrying a strength score, a
//! narrative (picked deterministically per density band), ordered
//! exploration steps, guiding questions, and cross-links to related
//! paths. Empty input never yields an empty list: a sentinel
//! "no-convergence" path with generic refinement suggestions is
//! produced instead, so consumers always have something to render.
//!
//! Narrative selection hashes the source document id (SHA-256) into the
//! band's sentence list, so path output is reproducible across runs.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{Convergence, CrossLink, Dimension, NavigationPath, PathType};

/// Alternative paths exposed alongside the primary one.
pub const MAX_ALTERNATIVES: usize = 2;

/// Tuning knobs for path synthesis.
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Maximum paths synthesized per request.
    pub max_paths: usize,
    /// Minimum density for non-primary paths. The top convergence
    /// always produces a path regardless.
    pub min_density: f64,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            max_paths: 5,
            min_density: 0.5,
        }
    }
}

/// Density band used for narrative and enrichment selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DensityBand {
    High,
    Medium,
    Low,
}

impl DensityBand {
    fn of(density: f64) -> Self {
        if density > 0.8 {
            DensityBand::High
        } else if density > 0.6 {
            DensityBand::Medium
        } else {
            DensityBand::Low
        }
    }

    /// Exploration direction implied by the band.
    fn direction(self) -> &'static str {
        match self {
            DensityBand::High => "deep",
            DensityBand::Medium => "broad",
            DensityBand::Low => "exploratory",
        }
    }

    fn narratives(self) -> &'static [&'static str] {
        match self {
            DensityBand::High => &[
                "Strong convergence: the evidence points at this document from several directions at once.",
                "This document sits at the center of the intention; nearly every dimension agrees on it.",
                "A dense cluster of signals converges here; start your exploration from this document.",
            ],
            DensityBand::Medium => &[
                "Solid convergence with room for interpretation; cross-check the supporting dimensions.",
                "Several dimensions agree on this document, though not all with equal force.",
                "A moderately dense match; worth reading alongside its top evidence.",
            ],
            DensityBand::Low => &[
                "A loose convergence; treat this as a lead rather than an answer.",
                "Only part of the intention maps onto this document; scan before committing.",
                "Weak but non-trivial overlap; useful mainly for widening the search.",
            ],
        }
    }
}

/// Synthesize navigation paths from ranked convergences.
///
/// The first (highest-ranked) convergence yields the single `primary`
/// path; every other path is `alternative`. Up to `max_paths`
/// candidates are considered, non-primary candidates below
/// `min_density` are skipped, and the output carries the primary plus
/// at most [`MAX_ALTERNATIVES`] alternatives.
pub fn generate(convergences: &[Convergence], config: &PathConfig) -> Vec<NavigationPath> {
    if convergences.is_empty() {
        return vec![empty_path()];
    }

    let mut paths: Vec<NavigationPath> = Vec::new();
    for convergence in convergences {
        if paths.len() >= config.max_paths {
            break;
        }
        let is_first = paths.is_empty();
        if !is_first && convergence.average_density < config.min_density {
            continue;
        }
        paths.push(synthesize(convergence, is_first));
    }

    // The floor can skip every non-primary candidate; the primary path
    // for the top convergence always survives.
    paths.truncate(1 + MAX_ALTERNATIVES);
    cross_link(&mut paths);
    paths
}

/// Build the sentinel path returned when nothing converged.
fn empty_path() -> NavigationPath {
    NavigationPath {
        id: Uuid::new_v4().to_string(),
        path_type: PathType::Primary,
        density: 0.0,
        strength: 0.0,
        dimensions: Vec::new(),
        evidence_documents: Vec::new(),
        narrative: "No document converges on this intention yet.".to_string(),
        suggested_steps: vec![
            "Broaden the intention with more specific keywords".to_string(),
            "Drop or widen the time window".to_string(),
            "Check that the corpus has been indexed recently".to_string(),
        ],
        guiding_questions: vec![
            "Is the intention phrased with vocabulary the corpus actually uses?".to_string(),
            "Would a category or analysis type narrow the search usefully?".to_string(),
        ],
        cross_links: Vec::new(),
        tag: Some("no-convergence".to_string()),
    }
}

/// Build one path from a convergence.
fn synthesize(convergence: &Convergence, primary: bool) -> NavigationPath {
    let density = convergence.average_density;
    let band = DensityBand::of(density);
    let dimensions = convergence.active_dimensions.clone();
    let evidence_count = convergence.evidence_chunks.len();

    let strength = density * 0.5
        + (dimensions.len() as f64 / 4.0) * 0.3
        + (evidence_count as f64 / 10.0).min(1.0) * 0.2;

    let focus = focus_dimension(&dimensions);
    let dimension_names: Vec<&str> = dimensions.iter().map(|d| d.name()).collect();

    let narrative = format!(
        "{} Converges on {} across {} ({:.0}% density, {} evidence chunk{}); {} {} exploration recommended.",
        pick_narrative(band, &convergence.source_document_id),
        convergence.source_document_id,
        dimension_names.join(" + "),
        density * 100.0,
        evidence_count,
        if evidence_count == 1 { "" } else { "s" },
        if primary { "primary," } else { "alternative," },
        band.direction(),
    );

    NavigationPath {
        id: Uuid::new_v4().to_string(),
        path_type: if primary {
            PathType::Primary
        } else {
            PathType::Alternative
        },
        density,
        strength,
        suggested_steps: steps(&dimensions, focus),
        guiding_questions: questions(band, &dimensions),
        dimensions,
        evidence_documents: vec![convergence.source_document_id.clone()],
        narrative,
        cross_links: Vec::new(),
        tag: None,
    }
}

/// The dimension the path should lead with: semantic > temporal >
/// categorical > analytical.
fn focus_dimension(dimensions: &[Dimension]) -> Option<Dimension> {
    const PRIORITY: [Dimension; 4] = [
        Dimension::Semantic,
        Dimension::Temporal,
        Dimension::Categorical,
        Dimension::Analytical,
    ];
    PRIORITY.into_iter().find(|d| dimensions.contains(d))
}

/// Deterministic narrative pick: SHA-256 of the document id indexes the
/// band's sentence list.
fn pick_narrative(band: DensityBand, document_id: &str) -> &'static str {
    let sentences = band.narratives();
    let digest = Sha256::digest(document_id.as_bytes());
    let index = digest[0] as usize % sentences.len();
    sentences[index]
}

/// Ordered canned exploration steps: lead dimension, cross-reference,
/// evidence, synthesis.
fn steps(dimensions: &[Dimension], focus: Option<Dimension>) -> Vec<String> {
    let mut steps = Vec::new();
    if let Some(focus) = focus {
        steps.push(format!(
            "Explore the {} dimension of the document first",
            focus.name()
        ));
        if let Some(second) = dimensions.iter().find(|d| Some(**d) != Some(focus)) {
            steps.push(format!(
                "Cross-reference against the {} dimension",
                second.name()
            ));
        }
    }
    steps.push("Examine the top evidence chunks in ranked order".to_string());
    steps.push("Synthesize findings back against the original intention".to_string());
    steps
}

/// Guiding questions from a fixed band + dimension rule table.
fn questions(band: DensityBand, dimensions: &[Dimension]) -> Vec<String> {
    let mut questions = Vec::new();
    match band {
        DensityBand::High => {
            questions.push("What makes this document converge so strongly?".to_string())
        }
        DensityBand::Medium => {
            questions.push("Which dimension carries most of this match?".to_string())
        }
        DensityBand::Low => {
            questions.push("Is this overlap meaningful or incidental?".to_string())
        }
    }
    if dimensions.contains(&Dimension::Temporal) {
        questions.push("Does the time window capture the right period?".to_string());
    }
    if dimensions.contains(&Dimension::Semantic) {
        questions.push("Do the matched keywords reflect the real topic?".to_string());
    }
    if dimensions.contains(&Dimension::Analytical) {
        questions.push("Does the analysis type match what you are looking for?".to_string());
    }
    questions
}

/// Connect every path pair by the larger of dimension overlap and
/// evidence overlap, both `|∩| / max(|A|, |B|)`.
fn cross_link(paths: &mut [NavigationPath]) {
    let snapshots: Vec<(String, Vec<Dimension>, Vec<String>)> = paths
        .iter()
        .map(|p| {
            (
                p.id.clone(),
                p.dimensions.clone(),
                p.evidence_documents.clone(),
            )
        })
        .collect();

    for (i, path) in paths.iter_mut().enumerate() {
        for (j, (other_id, other_dims, other_docs)) in snapshots.iter().enumerate() {
            if i == j {
                continue;
            }
            let dim_overlap = overlap_ratio(
                path.dimensions.iter().map(|d| d.name()),
                other_dims.iter().map(|d| d.name()),
            );
            let doc_overlap = overlap_ratio(
                path.evidence_documents.iter().map(String::as_str),
                other_docs.iter().map(String::as_str),
            );
            let strength = dim_overlap.max(doc_overlap);
            if strength > 0.0 {
                path.cross_links.push(CrossLink {
                    target: other_id.clone(),
                    strength,
                });
            }
        }
        path.cross_links.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

/// `|A ∩ B| / max(|A|, |B|)`, 0 when either set is empty.
fn overlap_ratio<'a>(
    a: impl Iterator<Item = &'a str>,
    b: impl Iterator<Item = &'a str>,
) -> f64 {
    let a: Vec<&str> = a.collect();
    let b: Vec<&str> = b.collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.iter().filter(|x| b.contains(x)).count();
    shared as f64 / a.len().max(b.len()) as f64
}
