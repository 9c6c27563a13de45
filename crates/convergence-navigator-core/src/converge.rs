//! Convergence aggregation: intersections → ranked per-document
//! convergences.
//!
//! The source document is the canonical grouping unit, independent of
//! which dimension combination produced a given intersection. A
//! document's convergence strength is the average density of every
//! intersection it appears in; documents at or below the threshold are
//! dropped (the boundary itself is excluded), the rest are ranked by
//! average density and truncated.

use std::collections::BTreeMap;

use crate::models::{ContentChunk, Convergence, Dimension, Intersection};

/// Tuning knobs for aggregation. Immutable per request; the owning
/// [`Navigator`](crate::navigate::Navigator) holds the mutable copy and
/// invalidates its cache when the threshold changes.
#[derive(Debug, Clone)]
pub struct ConvergenceConfig {
    /// A document converges only when its average density is strictly
    /// above this value.
    pub threshold: f64,
    /// Maximum convergences kept after ranking.
    pub max_convergences: usize,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            max_convergences: 10,
        }
    }
}

/// Group intersections by source document and rank the documents whose
/// average density clears the threshold.
pub fn identify_convergences(
    intersections: &[Intersection],
    corpus: &[ContentChunk],
    config: &ConvergenceConfig,
) -> Vec<Convergence> {
    // BTreeMap keeps document order stable across runs, so equal
    // densities rank deterministically.
    let mut per_document: BTreeMap<String, DocumentAccumulator> = BTreeMap::new();

    for intersection in intersections {
        for chunk_index in &intersection.matching_chunks {
            let doc_id = &corpus[*chunk_index].source_document_id;
            let acc = per_document.entry(doc_id.clone()).or_default();
            if !acc.seen_intersection(intersection) {
                acc.intersections.push(intersection.clone());
            }
            if !acc.evidence_chunks.contains(chunk_index) {
                acc.evidence_chunks.push(*chunk_index);
            }
        }
    }

    let mut convergences: Vec<Convergence> = per_document
        .into_iter()
        .filter_map(|(doc_id, acc)| {
            let average_density = acc.average_density();
            if average_density <= config.threshold {
                return None;
            }
            Some(Convergence {
                source_document_id: doc_id,
                average_density,
                active_dimensions: acc.dimension_union(),
                contributing_intersections: acc.intersections,
                rank: 0,
                evidence_chunks: acc.evidence_chunks,
            })
        })
        .collect();

    convergences.sort_by(|a, b| {
        b.average_density
            .partial_cmp(&a.average_density)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.source_document_id.cmp(&b.source_document_id))
    });
    convergences.truncate(config.max_convergences);

    for (i, convergence) in convergences.iter_mut().enumerate() {
        convergence.rank = i + 1;
    }
    convergences
}

#[derive(Default)]
struct DocumentAccumulator {
    intersections: Vec<Intersection>,
    evidence_chunks: Vec<usize>,
}

impl DocumentAccumulator {
    fn seen_intersection(&self, intersection: &Intersection) -> bool {
        self.intersections
            .iter()
            .any(|i| i.dimensions == intersection.dimensions)
    }

    fn average_density(&self) -> f64 {
        if self.intersections.is_empty() {
            return 0.0;
        }
        self.intersections.iter().map(|i| i.density).sum::<f64>()
            / self.intersections.len() as f64
    }

    fn dimension_union(&self) -> Vec<Dimension> {
        Dimension::ALL
            .iter()
            .copied()
            .filter(|d| {
                self.intersections
                    .iter()
                    .any(|i| i.dimensions.contains(d))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Dimension::*;

    fn chunk(id: &str, doc: &str) -> ContentChunk {
        ContentChunk {
            id: id.to_string(),
            source_document_id: doc.to_string(),
            text: String::new(),
            keywords: Vec::new(),
            categories: Vec::new(),
            analysis_type_label: None,
            last_modified: None,
            base_relevance_score: 0.0,
        }
    }

    fn intersection(dims: &[Dimension], chunks: &[usize], density: f64) -> Intersection {
        Intersection {
            dimensions: dims.to_vec(),
            matching_chunks: chunks.to_vec(),
            density,
            confidence: 0.8,
        }
    }

    #[test]
    fn test_groups_by_document_across_combinations() {
        // Two chunks of the same document appearing in different
        // combinations collapse to one convergence.
        let corpus = vec![chunk("c0", "doc-a"), chunk("c1", "doc-a")];
        let intersections = vec![
            intersection(&[Temporal, Semantic], &[0], 0.8),
            intersection(&[Semantic, Categorical], &[1], 0.6),
        ];

        let result =
            identify_convergences(&intersections, &corpus, &ConvergenceConfig::default());
        assert_eq!(result.len(), 1);
        let conv = &result[0];
        assert_eq!(conv.source_document_id, "doc-a");
        assert!((conv.average_density - 0.7).abs() < 1e-9);
        assert_eq!(conv.contributing_intersections.len(), 2);
        assert_eq!(conv.evidence_chunks, vec![0, 1]);
        assert_eq!(
            conv.active_dimensions,
            vec![Temporal, Semantic, Categorical]
        );
        assert_eq!(conv.rank, 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        let corpus = vec![chunk("c0", "doc-a"), chunk("c1", "doc-b")];
        let intersections = vec![
            intersection(&[Temporal, Semantic], &[0], 0.3),
            intersection(&[Temporal, Semantic], &[1], 0.301),
        ];

        let result =
            identify_convergences(&intersections, &corpus, &ConvergenceConfig::default());
        // doc-a sits exactly on the boundary and is excluded.
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].source_document_id, "doc-b");
        assert!(result[0].average_density > 0.3);
    }

    #[test]
    fn test_ranking_and_truncation() {
        let corpus: Vec<ContentChunk> = (0..5)
            .map(|i| chunk(&format!("c{i}"), &format!("doc-{i}")))
            .collect();
        let intersections: Vec<Intersection> = (0..5)
            .map(|i| intersection(&[Temporal, Semantic], &[i], 0.5 + i as f64 * 0.05))
            .collect();

        let config = ConvergenceConfig {
            threshold: 0.3,
            max_convergences: 3,
        };
        let result = identify_convergences(&intersections, &corpus, &config);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].source_document_id, "doc-4");
        assert_eq!(result[0].rank, 1);
        assert_eq!(result[2].rank, 3);
        assert!(result[0].average_density >= result[1].average_density);
    }

    #[test]
    fn test_empty_input() {
        let result =
            identify_convergences(&[], &[], &ConvergenceConfig::default());
        assert!(result.is_empty());
    }
}
