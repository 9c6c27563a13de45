//! Core data models used throughout the convergence engine.
//!
//! These types represent the intention, its decomposition into
//! interpretive dimensions, the corpus chunks being scored, and the
//! derived entities (intersections, convergences, navigation paths)
//! that flow from decomposition to the final navigation result.
//!
//! All derived entities are request-scoped: they reference corpus
//! chunks by index or source documents by id, and never own the
//! underlying [`ContentChunk`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the four independent interpretive axes an intention is
/// decomposed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Temporal,
    Semantic,
    Categorical,
    Analytical,
}

impl Dimension {
    /// All four dimensions in canonical order.
    pub const ALL: [Dimension; 4] = [
        Dimension::Temporal,
        Dimension::Semantic,
        Dimension::Categorical,
        Dimension::Analytical,
    ];

    /// Weight of this dimension in the per-chunk weighted total.
    ///
    /// Semantic overlap dominates; the other three split the rest.
    pub fn weight(self) -> f64 {
        match self {
            Dimension::Temporal => 0.25,
            Dimension::Semantic => 0.35,
            Dimension::Categorical => 0.20,
            Dimension::Analytical => 0.20,
        }
    }

    /// Lowercase display name, used in path descriptions and JSON.
    pub fn name(self) -> &'static str {
        match self {
            Dimension::Temporal => "temporal",
            Dimension::Semantic => "semantic",
            Dimension::Categorical => "categorical",
            Dimension::Analytical => "analytical",
        }
    }
}

/// A free-text intention plus its normalized form.
///
/// Immutable and request-scoped. The normalized form (lowercase,
/// diacritics and punctuation stripped, whitespace collapsed) is the
/// cache key for navigation results.
#[derive(Debug, Clone, Serialize)]
pub struct Intention {
    /// The text exactly as the caller provided it.
    pub raw: String,
    /// Lowercased, folded, punctuation-free form.
    pub normalized: String,
}

/// How a temporal dimension was derived from the intention text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalKind {
    /// Matched a fixed relative-window phrase ("today", "this week").
    Relative,
    /// Matched a quantified pattern ("last 30 days").
    Quantified,
    /// Matched an explicit 4-digit year.
    Specific,
}

/// A resolved time window extracted from the intention.
#[derive(Debug, Clone, Serialize)]
pub struct TemporalDimension {
    pub kind: TemporalKind,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Width of the window in days.
    pub day_window: i64,
}

/// The label assigned when no analytical trigger or fallback matches.
pub const DEFAULT_ANALYTICAL_LABEL: &str = "General Analysis";

/// Structured decomposition of an intention across the four dimensions.
///
/// Derived once per request and read-only afterwards. A missing
/// dimension is `None`/empty — never an error.
#[derive(Debug, Clone, Serialize)]
pub struct DimensionSet {
    pub temporal: Option<TemporalDimension>,
    /// Deduplicated keywords, ranked by extraction order.
    pub semantic: Vec<String>,
    /// Categories implied by the intention vocabulary.
    pub categorical: Vec<String>,
    /// Analytical classification label; always populated after
    /// decomposition (defaulting to [`DEFAULT_ANALYTICAL_LABEL`]).
    pub analytical: Option<String>,
    /// How confidently the decomposition covers the intention, in `[0, 1]`.
    pub confidence: f64,
}

impl DimensionSet {
    /// Dimensions that carry signal, in canonical order.
    ///
    /// The analytical dimension counts as active whenever a label is
    /// present, including the default one — a default label can still
    /// match chunks tagged with it.
    pub fn active_dimensions(&self) -> Vec<Dimension> {
        let mut active = Vec::new();
        if self.temporal.is_some() {
            active.push(Dimension::Temporal);
        }
        if !self.semantic.is_empty() {
            active.push(Dimension::Semantic);
        }
        if !self.categorical.is_empty() {
            active.push(Dimension::Categorical);
        }
        if self.analytical.is_some() {
            active.push(Dimension::Analytical);
        }
        active
    }
}

/// A pre-indexed content chunk supplied by the corpus provider.
///
/// The engine never produces these; it only scores them. The shape
/// mirrors what the external indexer stores per chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentChunk {
    pub id: String,
    pub source_document_id: String,
    pub text: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub analysis_type_label: Option<String>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    /// Primary relevance score assigned by the upstream indexer, 0..100.
    #[serde(default)]
    pub base_relevance_score: f64,
}

/// Per-dimension scores for one chunk, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DimensionScores {
    pub temporal: f64,
    pub semantic: f64,
    pub categorical: f64,
    pub analytical: f64,
}

impl DimensionScores {
    pub fn get(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Temporal => self.temporal,
            Dimension::Semantic => self.semantic,
            Dimension::Categorical => self.categorical,
            Dimension::Analytical => self.analytical,
        }
    }
}

/// A chunk's scores against the dimension set, by corpus index.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    /// Index into the corpus slice this request was scored against.
    pub chunk_index: usize,
    pub scores: DimensionScores,
    /// `Σ(score × dimension weight)` over all four dimensions.
    pub weighted_total: f64,
}

/// A dimension combination together with the chunks that cleared the
/// per-dimension floor on *every* dimension in it.
///
/// Exists only when at least one chunk matched; the combination always
/// has two or more dimensions.
#[derive(Debug, Clone, Serialize)]
pub struct Intersection {
    pub dimensions: Vec<Dimension>,
    /// Corpus indices of the matching chunks.
    pub matching_chunks: Vec<usize>,
    /// Blend of match breadth, combination width, and base scarcity, `[0, 1]`.
    pub density: f64,
    pub confidence: f64,
}

/// A source document converging on the intention across multiple
/// dimension combinations.
///
/// Exists only when its average density is strictly above the
/// convergence threshold.
#[derive(Debug, Clone, Serialize)]
pub struct Convergence {
    pub source_document_id: String,
    pub average_density: f64,
    /// The intersections this document appeared in.
    pub contributing_intersections: Vec<Intersection>,
    /// Union of dimensions across contributing intersections.
    pub active_dimensions: Vec<Dimension>,
    /// 1-based rank after sorting by average density.
    pub rank: usize,
    /// Corpus indices of this document's matching chunks.
    pub evidence_chunks: Vec<usize>,
}

/// Whether a navigation path is the recommended entry point or an
/// alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
    Primary,
    Alternative,
}

/// A link from one navigation path to another related one.
#[derive(Debug, Clone, Serialize)]
pub struct CrossLink {
    /// Id of the target path.
    pub target: String,
    /// Overlap strength in `[0, 1]` (the larger of dimension overlap
    /// and evidence overlap).
    pub strength: f64,
}

/// Ranked, annotated presentation of one convergence (or its absence)
/// for guided exploration.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationPath {
    pub id: String,
    #[serde(rename = "type")]
    pub path_type: PathType,
    pub density: f64,
    pub strength: f64,
    pub dimensions: Vec<Dimension>,
    /// Source documents backing this path.
    pub evidence_documents: Vec<String>,
    pub narrative: String,
    pub suggested_steps: Vec<String>,
    pub guiding_questions: Vec<String>,
    pub cross_links: Vec<CrossLink>,
    /// Set to `"no-convergence"` on the sentinel empty path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}
