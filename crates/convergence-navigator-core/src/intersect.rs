//! Per-chunk dimensional scoring and combinatorial intersection
//! generation.
//!
//! # Algorithm
//!
//! 1. Score every corpus chunk against each active dimension of the
//!    [`DimensionSet`], independently, each score in `[0, 1]`.
//! 2. Enumerate every subset of size ≥ 2 of the active dimensions
//!    (`k` active ⇒ `2^k − k − 1` combinations).
//! 3. Per combination, keep chunks scoring above the per-dimension
//!    floor on *every* dimension in the combination.
//! 4. Compute density (match breadth + combination width + base) and
//!    confidence per combination; discard zero-match combinations.
//! 5. Sort by density descending.
//!
//! Narrower combinations are scored independently from broader ones, so
//! a chunk strongly matching two dimensions is not diluted by a weak
//! four-dimension score. Chunks are scored in one linear pass; the full
//! per-dimension score map is computed per chunk and only the indices
//! that matter survive into the intersections.

use chrono::{DateTime, Utc};

use crate::models::{
    ContentChunk, Dimension, DimensionScores, DimensionSet, Intersection, ScoredChunk,
};

/// Minimum per-dimension score for a chunk to count as matching that
/// dimension inside a combination.
pub const MIN_DIMENSION_SCORE: f64 = 0.3;

/// Fixed contribution to density shared by every intersection.
const DENSITY_BASE: f64 = 0.85;

/// Generate all intersections for a dimension set over a corpus.
///
/// `now` anchors temporal scoring so results are reproducible in tests.
pub fn calculate(
    dimension_set: &DimensionSet,
    corpus: &[ContentChunk],
    now: DateTime<Utc>,
) -> Vec<Intersection> {
    let active = dimension_set.active_dimensions();
    if active.len() < 2 || corpus.is_empty() {
        return Vec::new();
    }

    let scored: Vec<ScoredChunk> = corpus
        .iter()
        .enumerate()
        .map(|(index, chunk)| score_chunk(index, chunk, dimension_set, now))
        .collect();

    let mut intersections = Vec::new();
    for combination in combinations(&active) {
        let matching: Vec<usize> = scored
            .iter()
            .filter(|s| {
                combination
                    .iter()
                    .all(|dim| s.scores.get(*dim) > MIN_DIMENSION_SCORE)
            })
            .map(|s| s.chunk_index)
            .collect();

        if matching.is_empty() {
            continue;
        }

        let density = 0.4 * (matching.len() as f64 / corpus.len() as f64)
            + 0.4 * (combination.len() as f64 / 4.0)
            + 0.2 * DENSITY_BASE;

        let mean_of_means: f64 = matching
            .iter()
            .map(|index| {
                let s = &scored[*index];
                combination.iter().map(|d| s.scores.get(*d)).sum::<f64>()
                    / combination.len() as f64
            })
            .sum::<f64>()
            / matching.len() as f64;
        let confidence =
            (mean_of_means + (matching.len() as f64 / 10.0).min(1.0) * 0.2).min(1.0);

        intersections.push(Intersection {
            dimensions: combination,
            matching_chunks: matching,
            density,
            confidence,
        });
    }

    intersections.sort_by(|a, b| {
        b.density
            .partial_cmp(&a.density)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    intersections
}

/// Enumerate every subset of size ≥ 2 of the active dimensions.
pub fn combinations(active: &[Dimension]) -> Vec<Vec<Dimension>> {
    let k = active.len();
    let mut result = Vec::new();
    for mask in 1u32..(1 << k) {
        if mask.count_ones() < 2 {
            continue;
        }
        let subset: Vec<Dimension> = (0..k)
            .filter(|i| mask & (1 << i) != 0)
            .map(|i| active[i])
            .collect();
        result.push(subset);
    }
    result
}

/// Score one chunk against every dimension of the set.
pub fn score_chunk(
    chunk_index: usize,
    chunk: &ContentChunk,
    dimension_set: &DimensionSet,
    now: DateTime<Utc>,
) -> ScoredChunk {
    let scores = DimensionScores {
        temporal: temporal_score(chunk, dimension_set, now),
        semantic: semantic_score(chunk, dimension_set),
        categorical: categorical_score(chunk, dimension_set),
        analytical: analytical_score(chunk, dimension_set),
    };

    let weighted_total = Dimension::ALL
        .iter()
        .map(|d| scores.get(*d) * d.weight())
        .sum();

    ScoredChunk {
        chunk_index,
        scores,
        weighted_total,
    }
}

/// Temporal fit of the chunk's timestamp against the intention window.
///
/// - No temporal dimension or no chunk timestamp ⇒ 0.
/// - Specific range ⇒ linear 0.5–1.0 by position in the range (later
///   is higher); outside the range ⇒ 0.
/// - Day window ⇒ `1 − 0.5·(days_since / window)` inside the window,
///   0 outside.
fn temporal_score(chunk: &ContentChunk, dims: &DimensionSet, now: DateTime<Utc>) -> f64 {
    let Some(temporal) = &dims.temporal else {
        return 0.0;
    };
    let Some(modified) = chunk.last_modified else {
        return 0.0;
    };

    match temporal.kind {
        crate::models::TemporalKind::Specific => {
            if modified < temporal.start_date || modified > temporal.end_date {
                return 0.0;
            }
            let span = (temporal.end_date - temporal.start_date).num_seconds() as f64;
            if span <= 0.0 {
                return 1.0;
            }
            let position = (modified - temporal.start_date).num_seconds() as f64 / span;
            0.5 + 0.5 * position
        }
        _ => {
            let days_since = (now - modified).num_seconds() as f64 / 86_400.0;
            if days_since < 0.0 || days_since > temporal.day_window as f64 {
                return 0.0;
            }
            1.0 - 0.5 * (days_since / temporal.day_window as f64)
        }
    }
}

/// Position-decayed keyword overlap, normalized by total weight.
///
/// Keyword `i` carries weight `1/(i+1)`. An exact match against the
/// chunk's keyword list earns full weight; a substring hit inside the
/// keyword list earns 0.7×; a substring hit in the chunk text earns
/// 0.5×.
fn semantic_score(chunk: &ContentChunk, dims: &DimensionSet) -> f64 {
    if dims.semantic.is_empty() {
        return 0.0;
    }

    let chunk_keywords: Vec<String> = chunk.keywords.iter().map(|k| k.to_lowercase()).collect();
    let text = chunk.text.to_lowercase();

    let mut total = 0.0;
    let mut total_weight = 0.0;
    for (i, keyword) in dims.semantic.iter().enumerate() {
        let weight = 1.0 / (i as f64 + 1.0);
        total_weight += weight;

        if chunk_keywords.iter().any(|k| k == keyword) {
            total += weight;
        } else if chunk_keywords
            .iter()
            .any(|k| k.contains(keyword.as_str()) || keyword.contains(k.as_str()))
        {
            total += 0.7 * weight;
        } else if text.contains(keyword.as_str()) {
            total += 0.5 * weight;
        }
    }

    total / total_weight
}

/// Category overlap: exact = 1, substring either direction = 0.5,
/// summed and divided by the number of dimension categories.
fn categorical_score(chunk: &ContentChunk, dims: &DimensionSet) -> f64 {
    if dims.categorical.is_empty() {
        return 0.0;
    }

    let chunk_categories: Vec<String> =
        chunk.categories.iter().map(|c| c.to_lowercase()).collect();

    let mut total = 0.0;
    for category in &dims.categorical {
        let wanted = category.to_lowercase();
        if chunk_categories.iter().any(|c| *c == wanted) {
            total += 1.0;
        } else if chunk_categories
            .iter()
            .any(|c| c.contains(&wanted) || wanted.contains(c.as_str()))
        {
            total += 0.5;
        }
    }

    total / dims.categorical.len() as f64
}

/// Label fit: exact (case-insensitive) = 1.0, substring either
/// direction = 0.7, else token-overlap ratio.
fn analytical_score(chunk: &ContentChunk, dims: &DimensionSet) -> f64 {
    let Some(wanted) = &dims.analytical else {
        return 0.0;
    };
    let Some(label) = &chunk.analysis_type_label else {
        return 0.0;
    };

    let wanted_lower = wanted.to_lowercase();
    let label_lower = label.to_lowercase();

    if wanted_lower == label_lower {
        return 1.0;
    }
    if wanted_lower.contains(&label_lower) || label_lower.contains(&wanted_lower) {
        return 0.7;
    }

    let wanted_tokens: Vec<&str> = wanted_lower.split_whitespace().collect();
    let label_tokens: Vec<&str> = label_lower.split_whitespace().collect();
    if wanted_tokens.is_empty() {
        return 0.0;
    }
    let overlap = wanted_tokens
        .iter()
        .filter(|t| label_tokens.contains(t))
        .count();
    overlap as f64 / wanted_tokens.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompose;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn chunk(id: &str, doc: &str) -> ContentChunk {
        ContentChunk {
            id: id.to_string(),
            source_document_id: doc.to_string(),
            text: String::new(),
            keywords: Vec::new(),
            categories: Vec::new(),
            analysis_type_label: None,
            last_modified: None,
            base_relevance_score: 50.0,
        }
    }

    fn scenario_chunk() -> ContentChunk {
        ContentChunk {
            id: "c1".to_string(),
            source_document_id: "doc-1".to_string(),
            text: "Breakthrough results on the new pipeline.".to_string(),
            keywords: vec!["breakthrough".to_string()],
            categories: vec!["Technical".to_string()],
            analysis_type_label: Some("Breakthrough Técnico".to_string()),
            last_modified: Some(fixed_now() - Duration::days(5)),
            base_relevance_score: 40.0,
        }
    }

    #[test]
    fn test_combination_counts() {
        use Dimension::*;
        assert_eq!(combinations(&[Temporal, Semantic]).len(), 1);
        assert_eq!(combinations(&[Temporal, Semantic, Categorical]).len(), 4);
        assert_eq!(
            combinations(&[Temporal, Semantic, Categorical, Analytical]).len(),
            11
        );
        assert!(combinations(&[Temporal]).is_empty());
    }

    #[test]
    fn test_temporal_window_scoring() {
        let dims = decompose::decompose("updates from the last 30 days", fixed_now()).unwrap();
        let mut c = chunk("c1", "d1");

        c.last_modified = Some(fixed_now() - Duration::days(5));
        let fresh = temporal_score(&c, &dims, fixed_now());
        assert!((fresh - (1.0 - 0.5 * (5.0 / 30.0))).abs() < 1e-6);

        c.last_modified = Some(fixed_now() - Duration::days(45));
        assert_eq!(temporal_score(&c, &dims, fixed_now()), 0.0);

        c.last_modified = None;
        assert_eq!(temporal_score(&c, &dims, fixed_now()), 0.0);
    }

    #[test]
    fn test_temporal_specific_range_scoring() {
        let dims = decompose::decompose("work from 2023", fixed_now()).unwrap();
        let mut c = chunk("c1", "d1");

        // Later in the year scores higher, floor of 0.5 at the start.
        c.last_modified = Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        let early = temporal_score(&c, &dims, fixed_now());
        c.last_modified = Some(Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        let late = temporal_score(&c, &dims, fixed_now());
        assert!(early >= 0.5 && early < late && late <= 1.0);

        c.last_modified = Some(Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(temporal_score(&c, &dims, fixed_now()), 0.0);
    }

    #[test]
    fn test_semantic_match_tiers() {
        let dims = decompose::decompose("breakthrough pipeline", fixed_now()).unwrap();
        assert_eq!(dims.semantic, vec!["breakthrough", "pipeline"]);

        // Exact keyword match on the first keyword, text match on the second.
        let mut c = chunk("c1", "d1");
        c.keywords = vec!["breakthrough".to_string()];
        c.text = "pipeline rework".to_string();
        let score = semantic_score(&c, &dims);
        let expected = (1.0 + 0.5 * 0.5) / 1.5;
        assert!((score - expected).abs() < 1e-6);

        // Substring inside the chunk keyword list earns 0.7×.
        let mut c2 = chunk("c2", "d2");
        c2.keywords = vec!["breakthrough-moment".to_string()];
        let score2 = semantic_score(&c2, &dims);
        let expected2 = (0.7 * 1.0) / 1.5;
        assert!((score2 - expected2).abs() < 1e-6);

        assert_eq!(semantic_score(&chunk("c3", "d3"), &dims), 0.0);
    }

    #[test]
    fn test_categorical_scoring() {
        let dims = decompose::decompose("api strategy", fixed_now()).unwrap();
        assert_eq!(dims.categorical, vec!["Technical", "Strategic"]);

        let mut c = chunk("c1", "d1");
        c.categories = vec!["Technical".to_string()];
        assert!((categorical_score(&c, &dims) - 0.5).abs() < 1e-6);

        c.categories = vec!["Technical".to_string(), "Strategic Planning".to_string()];
        assert!((categorical_score(&c, &dims) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_analytical_scoring() {
        let dims = decompose::decompose("breakthrough fix", fixed_now()).unwrap();

        let mut c = chunk("c1", "d1");
        c.analysis_type_label = Some("breakthrough técnico".to_string());
        assert_eq!(analytical_score(&c, &dims), 1.0);

        c.analysis_type_label = Some("Breakthrough".to_string());
        assert_eq!(analytical_score(&c, &dims), 0.7);

        c.analysis_type_label = Some("Técnico Review".to_string());
        assert!((analytical_score(&c, &dims) - 0.5).abs() < 1e-6);

        c.analysis_type_label = None;
        assert_eq!(analytical_score(&c, &dims), 0.0);
    }

    #[test]
    fn test_calculate_full_convergence() {
        let dims =
            decompose::decompose("breakthrough results last 30 days", fixed_now()).unwrap();
        assert_eq!(dims.active_dimensions().len(), 4);

        let corpus = vec![scenario_chunk()];
        let intersections = calculate(&dims, &corpus, fixed_now());

        // One strongly matching chunk clears the floor on all four
        // dimensions, so all 11 combinations survive.
        assert_eq!(intersections.len(), 11);
        for inter in &intersections {
            assert!(inter.dimensions.len() >= 2);
            assert_eq!(inter.matching_chunks, vec![0]);
            assert!(inter.density > MIN_DIMENSION_SCORE);
            assert!((0.0..=1.0).contains(&inter.confidence));
        }
        // Sorted by density descending: the widest combination first.
        assert_eq!(intersections[0].dimensions.len(), 4);
    }

    #[test]
    fn test_calculate_discards_non_matching() {
        let dims =
            decompose::decompose("breakthrough results last 30 days", fixed_now()).unwrap();

        // A chunk with no overlap at all contributes to no intersection.
        let corpus = vec![chunk("c1", "d1")];
        assert!(calculate(&dims, &corpus, fixed_now()).is_empty());
    }

    #[test]
    fn test_calculate_requires_two_active_dimensions() {
        let dims = decompose::decompose("xyzzy", fixed_now()).unwrap();
        // Semantic + default analytical label are the active pair here;
        // drop to one by clearing semantic.
        let mut single = dims.clone();
        single.semantic.clear();
        assert!(calculate(&single, &[scenario_chunk()], fixed_now()).is_empty());
    }

    #[test]
    fn test_weighted_total() {
        let dims =
            decompose::decompose("breakthrough results last 30 days", fixed_now()).unwrap();
        let scored = score_chunk(0, &scenario_chunk(), &dims, fixed_now());
        let manual = scored.scores.temporal * 0.25
            + scored.scores.semantic * 0.35
            + scored.scores.categorical * 0.20
            + scored.scores.analytical * 0.20;
        assert!((scored.weighted_total - manual).abs() < 1e-9);
    }
}
