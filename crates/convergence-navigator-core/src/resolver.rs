//! Zero-relevance resolution: a secondary multi-signal pass for chunks
//! the primary scorer assigned relevance 0.
//!
//! Four independent analyses each produce `{score, confidence, reason}`:
//!
//! 1. **Semantic** — embed the chunk's leading text and compare against
//!    three fixed reference patterns. Degrades to 0 when the embedding
//!    provider is unavailable or the content is too short.
//! 2. **Structural** — Markdown structure (headers, lists, code fences,
//!    links, tables), keyword hits, and file-extension relevance.
//! 3. **Contextual** — filename, folder path, file metadata, content
//!    density, and information/noise ratio.
//! 4. **Prefix** — delegated to the external prefix-match provider,
//!    its `0..0.2` enhancement rescaled onto `0..25`.
//!
//! Signals that produce nothing are treated as absent and the weighted
//! combination renormalizes over the rest (via
//! [`score::weighted_composite`](crate::score::weighted_composite)), so
//! one strong signal can carry a chunk over the threshold. Every
//! analysis is attempted even when another fails; a failing analysis
//! contributes 0 with a documented reason and never aborts the others.
//!
//! Resolution failure is not an error: `resolved: false` is a normal
//! outcome. Resolved scores are capped at 45 on the 0..100 scale, so a
//! resolved chunk never lands in high-relevance territory.

use std::collections::HashMap;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::ContentChunk;
use crate::providers::{EmbeddingProvider, PrefixMatchProvider, ResolutionContext};
use crate::score;

/// Hard ceiling for resolved scores on the 0..100 scale.
pub const MAX_RESOLVED_SCORE: f64 = 45.0;

/// Combination weights, in signal order.
const SIGNAL_WEIGHTS: [(&str, f64); 4] = [
    ("semantic", 0.35),
    ("structural", 0.25),
    ("contextual", 0.25),
    ("prefix", 0.15),
];

/// Reference texts whose embeddings anchor the semantic analysis.
const REFERENCE_PATTERNS: [&str; 3] = [
    "Technical documentation describing an implementation, its architecture, \
     configuration and known trade-offs, with code examples and operational notes.",
    "A decision record capturing the options considered, the choice made, the \
     reasoning behind it and its expected consequences for the project.",
    "Learning notes summarizing a study session: key concepts, worked examples, \
     open questions and references for further reading.",
];

static DATE_IN_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}|\d{8}").expect("date-in-name regex"));

const TECHNICAL_KEYWORDS: &[&str] = &[
    "api", "function", "class", "database", "algorithm", "config", "deploy", "server",
    "pipeline",
];
const BUSINESS_KEYWORDS: &[&str] = &[
    "strategy", "revenue", "customer", "market", "decision", "roadmap", "stakeholder",
];
const DESCRIPTIVE_NAME_WORDS: &[&str] = &[
    "spec", "design", "notes", "analysis", "report", "meeting", "decision", "plan",
];
const KNOWN_DIRECTORIES: &[&str] = &[
    "docs", "notes", "projects", "research", "meetings", "decisions", "archive",
];

/// Extension → structural relevance contribution.
const EXTENSION_RELEVANCE: &[(&str, f64)] = &[
    ("md", 8.0),
    ("rs", 6.0),
    ("py", 6.0),
    ("js", 5.0),
    ("ts", 5.0),
    ("toml", 4.0),
    ("json", 4.0),
    ("txt", 3.0),
    ("log", 1.0),
];

/// One analysis outcome.
#[derive(Debug, Clone, Serialize)]
pub struct SignalReport {
    pub score: f64,
    pub confidence: f64,
    pub reason: String,
}

impl SignalReport {
    fn zero(reason: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            confidence: 0.0,
            reason: reason.into(),
        }
    }
}

/// Per-signal breakdown attached to every resolution result.
#[derive(Debug, Clone, Serialize)]
pub struct SignalBreakdown {
    pub semantic: SignalReport,
    pub structural: SignalReport,
    pub contextual: SignalReport,
    pub prefix: SignalReport,
}

/// Outcome of one resolution attempt.
#[derive(Debug, Clone, Serialize)]
pub struct ZeroRelevanceResolution {
    pub resolved: bool,
    /// True when the chunk already had a non-zero score and no analysis
    /// ran.
    pub skipped: bool,
    /// Rounded resolved score, `0..=45`. Zero unless `resolved`.
    pub new_score: u32,
    pub combined: f64,
    pub confidence: f64,
    /// The strongest signal, when any analysis ran.
    pub primary_signal: Option<String>,
    pub breakdown: Option<SignalBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl ZeroRelevanceResolution {
    fn skipped() -> Self {
        Self {
            resolved: false,
            skipped: true,
            new_score: 0,
            combined: 0.0,
            confidence: 0.0,
            primary_signal: None,
            breakdown: None,
            recommendation: None,
        }
    }
}

/// Running counters across resolution attempts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolverDiagnostics {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    /// Resolutions won per primary signal.
    pub resolved_by_signal: HashMap<String, u64>,
    sum_resolved_scores: f64,
}

impl ResolverDiagnostics {
    /// Mean `new_score` over successful resolutions.
    pub fn average_resolved_score(&self) -> f64 {
        if self.successes == 0 {
            return 0.0;
        }
        self.sum_resolved_scores / self.successes as f64
    }
}

/// Multi-signal resolver for zero-scored chunks.
pub struct ZeroRelevanceResolver {
    embedding: Box<dyn EmbeddingProvider>,
    prefix: Box<dyn PrefixMatchProvider>,
    threshold: f64,
    reference_embeddings: Option<Vec<Vec<f32>>>,
    diagnostics: ResolverDiagnostics,
}

impl ZeroRelevanceResolver {
    /// `threshold` is clamped to the tunable range `5..=50`.
    pub fn new(
        embedding: Box<dyn EmbeddingProvider>,
        prefix: Box<dyn PrefixMatchProvider>,
        threshold: f64,
    ) -> Self {
        Self {
            embedding,
            prefix,
            threshold: threshold.clamp(5.0, 50.0),
            reference_embeddings: None,
            diagnostics: ResolverDiagnostics::default(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn diagnostics(&self) -> &ResolverDiagnostics {
        &self.diagnostics
    }

    /// Resolve one chunk.
    ///
    /// Chunks with a non-zero base score short-circuit to a skipped
    /// result without running any analysis.
    pub async fn resolve(
        &mut self,
        chunk: &ContentChunk,
        context: &ResolutionContext,
    ) -> ZeroRelevanceResolution {
        if chunk.base_relevance_score != 0.0 {
            return ZeroRelevanceResolution::skipped();
        }

        self.diagnostics.attempts += 1;

        let semantic = self.semantic_analysis(chunk).await;
        let structural = structural_analysis(chunk, context);
        let contextual = contextual_analysis(chunk, context);
        let prefix = self.prefix_analysis(chunk, context).await;

        let reports = [
            ("semantic", &semantic),
            ("structural", &structural),
            ("contextual", &contextual),
            ("prefix", &prefix),
        ];

        // Zero-valued signals are treated as absent; the composite
        // renormalizes over what actually scored.
        let fields: HashMap<&str, f64> = reports
            .iter()
            .filter(|(_, r)| r.score > 0.0)
            .map(|(name, r)| (*name, r.score))
            .collect();
        let combined = score::weighted_composite(&fields, &SIGNAL_WEIGHTS);

        let confidence =
            reports.iter().map(|(_, r)| r.confidence).sum::<f64>() / reports.len() as f64;

        let primary_signal = reports
            .iter()
            .filter(|(_, r)| r.score > 0.0)
            .max_by(|a, b| {
                a.1.score
                    .partial_cmp(&b.1.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(name, _)| (*name).to_string());

        let resolved = combined >= self.threshold;
        let new_score = if resolved {
            combined.min(MAX_RESOLVED_SCORE).round() as u32
        } else {
            0
        };

        if resolved {
            self.diagnostics.successes += 1;
            self.diagnostics.sum_resolved_scores += f64::from(new_score);
            if let Some(signal) = &primary_signal {
                *self
                    .diagnostics
                    .resolved_by_signal
                    .entry(signal.clone())
                    .or_insert(0) += 1;
            }
        } else {
            self.diagnostics.failures += 1;
        }

        let recommendation = if resolved {
            None
        } else if combined > 5.0 {
            Some("manual review".to_string())
        } else {
            Some("likely low-value".to_string())
        };

        ZeroRelevanceResolution {
            resolved,
            skipped: false,
            new_score,
            combined,
            confidence,
            primary_signal,
            breakdown: Some(SignalBreakdown {
                semantic,
                structural,
                contextual,
                prefix,
            }),
            recommendation,
        }
    }

    /// Embedding similarity against the three reference patterns.
    async fn semantic_analysis(&mut self, chunk: &ContentChunk) -> SignalReport {
        let content: String = chunk.text.chars().take(1000).collect();
        if content.chars().count() < 50 {
            return SignalReport::zero("content shorter than 50 chars");
        }

        let embedded = match self.embedding.embed(&content).await {
            Ok(Some(v)) => v,
            Ok(None) => return SignalReport::zero("embedding provider unavailable"),
            Err(e) => return SignalReport::zero(format!("embedding provider error: {e}")),
        };

        match self.fill_reference_embeddings().await {
            Ok(true) => {}
            Ok(false) => return SignalReport::zero("reference embeddings unavailable"),
            Err(e) => return SignalReport::zero(format!("reference embedding error: {e}")),
        }
        let references = self
            .reference_embeddings
            .as_deref()
            .unwrap_or_default();

        let best = references
            .iter()
            .map(|r| self.embedding.similarity(&embedded, r))
            .fold(f32::NEG_INFINITY, f32::max) as f64;

        let raw = if best >= 0.6 { best * 60.0 } else { best * 20.0 };
        let score = raw.clamp(0.0, 50.0);
        SignalReport {
            score,
            confidence: best.clamp(0.0, 1.0),
            reason: format!("best reference similarity {best:.3}"),
        }
    }

    /// Lazily embed and cache the reference patterns. Returns whether
    /// the cache is populated afterwards.
    async fn fill_reference_embeddings(&mut self) -> anyhow::Result<bool> {
        if self.reference_embeddings.is_none() {
            let mut embedded = Vec::with_capacity(REFERENCE_PATTERNS.len());
            for pattern in REFERENCE_PATTERNS {
                match self.embedding.embed(pattern).await? {
                    Some(v) => embedded.push(v),
                    None => return Ok(false),
                }
            }
            self.reference_embeddings = Some(embedded);
        }
        Ok(true)
    }

    /// Rescale the provider's `0..0.2` enhancement onto `0..25`.
    async fn prefix_analysis(
        &self,
        chunk: &ContentChunk,
        context: &ResolutionContext,
    ) -> SignalReport {
        match self.prefix.enhance(chunk, context).await {
            Ok(enhancement) => SignalReport {
                score: (enhancement.enhancement.clamp(0.0, 0.2) * 125.0).min(25.0),
                confidence: enhancement.confidence,
                reason: format!("{} prefix matches", enhancement.prefix_matches),
            },
            Err(e) => SignalReport::zero(format!("prefix provider error: {e}")),
        }
    }
}

/// Markdown structure, keyword hits, and extension relevance, capped 40.
fn structural_analysis(chunk: &ContentChunk, context: &ResolutionContext) -> SignalReport {
    let text = &chunk.text;
    let lower = text.to_lowercase();

    let headers = text
        .lines()
        .filter(|l| l.starts_with('#'))
        .count();
    let lists = text
        .lines()
        .filter(|l| {
            let t = l.trim_start();
            t.starts_with("- ")
                || t.starts_with("* ")
                || t.chars().next().is_some_and(|c| c.is_ascii_digit()) && t.contains(". ")
        })
        .count();
    let code_blocks = text.matches("```").count() / 2;
    let links = text.matches("](").count();
    let table_rows = text
        .lines()
        .filter(|l| l.matches('|').count() >= 2)
        .count();

    let keyword_hits = TECHNICAL_KEYWORDS
        .iter()
        .chain(BUSINESS_KEYWORDS)
        .filter(|k| lower.contains(**k))
        .count();

    let extension_score = context
        .file_name
        .as_deref()
        .and_then(|name| name.rsplit_once('.'))
        .and_then(|(_, ext)| {
            EXTENSION_RELEVANCE
                .iter()
                .find(|(e, _)| *e == ext.to_lowercase())
                .map(|(_, v)| *v)
        })
        .unwrap_or(0.0);

    let mut parts: Vec<(&str, f64)> = Vec::new();
    parts.push(("headers", (headers as f64 * 3.0).min(15.0)));
    parts.push(("lists", (lists as f64 * 2.0).min(10.0)));
    parts.push(("code", (code_blocks as f64 * 5.0).min(20.0)));
    parts.push(("links", (links as f64 * 2.0).min(10.0)));
    parts.push(("tables", (table_rows as f64 * 3.0).min(15.0)));
    parts.push(("keywords", (keyword_hits as f64 * 2.0).min(12.0)));
    parts.push(("extension", extension_score));

    let total: f64 = parts.iter().map(|(_, v)| v).sum::<f64>().min(40.0);
    let kinds_hit = parts.iter().filter(|(_, v)| *v > 0.0).count();

    let found: Vec<String> = parts
        .iter()
        .filter(|(_, v)| *v > 0.0)
        .map(|(name, v)| format!("{name}={v:.0}"))
        .collect();
    SignalReport {
        score: total,
        confidence: kinds_hit as f64 / parts.len() as f64,
        reason: if found.is_empty() {
            "no structural markers".to_string()
        } else {
            found.join(", ")
        },
    }
}

/// Filename, folder, metadata, content density and noise ratio, capped 35.
fn contextual_analysis(chunk: &ContentChunk, context: &ResolutionContext) -> SignalReport {
    let mut total: f64 = 0.0;
    let mut checks_with_data = 0;

    // Filename: length, descriptive words, date pattern. Cap 8.
    if let Some(name) = &context.file_name {
        checks_with_data += 1;
        let stem = name.rsplit_once('.').map_or(name.as_str(), |(s, _)| s);
        let lower = stem.to_lowercase();
        let mut sub: f64 = 0.0;
        if stem.len() >= 8 {
            sub += 2.0;
        }
        if DESCRIPTIVE_NAME_WORDS.iter().any(|w| lower.contains(w)) {
            sub += 3.0;
        }
        if DATE_IN_NAME_RE.is_match(stem) {
            sub += 3.0;
        }
        total += sub.min(8.0);
    }

    // Folder path: known-directory membership and depth. Cap 8.
    if let Some(folder) = &context.folder_path {
        checks_with_data += 1;
        let lower = folder.to_lowercase();
        let mut sub: f64 = 0.0;
        if KNOWN_DIRECTORIES.iter().any(|d| lower.contains(d)) {
            sub += 5.0;
        }
        let depth = folder.split('/').filter(|s| !s.is_empty()).count();
        sub += (depth as f64).min(3.0);
        total += sub.min(8.0);
    }

    // Metadata: size band and recency. Cap 6.
    if context.file_size_bytes.is_some() || context.file_modified.is_some() {
        checks_with_data += 1;
        let mut sub: f64 = 0.0;
        if let Some(size) = context.file_size_bytes {
            sub += if (1_024..=102_400).contains(&size) {
                3.0
            } else {
                1.0
            };
        }
        if let Some(modified) = context.file_modified {
            if (Utc::now() - modified).num_days() <= 90 {
                sub += 3.0;
            }
        }
        total += sub.min(6.0);
    }

    // Content density: word, sentence, and paragraph counts. Gated on a
    // minimum word count so near-empty chunks do not register. Cap 7.
    let words = chunk.text.split_whitespace().count();
    if words >= 30 {
        checks_with_data += 1;
        let sentences = chunk
            .text
            .split(['.', '!', '?'])
            .filter(|s| s.split_whitespace().count() >= 2)
            .count();
        let paragraphs = chunk
            .text
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count();
        let mut sub: f64 = 0.0;
        if words >= 50 {
            sub += 3.0;
        }
        if sentences >= 3 {
            sub += 2.0;
        }
        if paragraphs >= 2 {
            sub += 2.0;
        }
        total += sub.min(7.0);
    }

    // Information/noise ratio. Same gate. Cap 6.
    if words >= 20 {
        checks_with_data += 1;
        let tokens = chunk.text.split_whitespace().count();
        let informative = chunk
            .text
            .split_whitespace()
            .filter(|t| t.chars().any(|c| c.is_alphanumeric()) && t.len() > 2)
            .count();
        let ratio = informative as f64 / tokens as f64;
        total += if ratio >= 0.7 {
            6.0
        } else if ratio >= 0.5 {
            4.0
        } else if ratio >= 0.3 {
            2.0
        } else {
            0.0
        };
    }

    SignalReport {
        score: total.min(35.0),
        confidence: checks_with_data as f64 / 5.0,
        reason: format!("{checks_with_data}/5 contextual checks had data"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::memory::{
        FixedPrefixProvider, HashEmbeddingProvider, UnavailableEmbeddingProvider,
    };

    fn zero_chunk(text: &str) -> ContentChunk {
        ContentChunk {
            id: "c1".to_string(),
            source_document_id: "doc-1".to_string(),
            text: text.to_string(),
            keywords: Vec::new(),
            categories: Vec::new(),
            analysis_type_label: None,
            last_modified: None,
            base_relevance_score: 0.0,
        }
    }

    fn resolver_without_embeddings() -> ZeroRelevanceResolver {
        ZeroRelevanceResolver::new(
            Box::new(UnavailableEmbeddingProvider),
            Box::new(FixedPrefixProvider::none()),
            15.0,
        )
    }

    #[tokio::test]
    async fn test_nonzero_score_short_circuits() {
        let mut resolver = resolver_without_embeddings();
        let mut chunk = zero_chunk("anything");
        chunk.base_relevance_score = 42.0;

        let result = resolver.resolve(&chunk, &ResolutionContext::default()).await;
        assert!(result.skipped);
        assert!(!result.resolved);
        assert!(result.breakdown.is_none());
        // No analysis ran: the attempt counter stays untouched.
        assert_eq!(resolver.diagnostics().attempts, 0);
    }

    #[tokio::test]
    async fn test_structural_markdown_resolution() {
        // Three headers, one fenced code block and the "API" keyword:
        // 9 + 5 + 2 = 16, which alone clears the default threshold.
        let text = "# Alpha\n## Beta\n### Gamma\n\n```\nlet x = 1;\n```\n\nThe API surface.";
        let mut resolver = resolver_without_embeddings();

        let result = resolver
            .resolve(&zero_chunk(text), &ResolutionContext::default())
            .await;
        assert!(result.resolved);
        assert!(result.new_score >= 15 && result.new_score <= 45);
        assert_eq!(result.primary_signal.as_deref(), Some("structural"));

        let breakdown = result.breakdown.unwrap();
        assert!(breakdown.structural.score >= 15.0);
        assert_eq!(breakdown.semantic.score, 0.0);
        assert!(breakdown.semantic.reason.contains("unavailable")
            || breakdown.semantic.reason.contains("50 chars"));
    }

    #[tokio::test]
    async fn test_unresolvable_chunk() {
        let mut resolver = resolver_without_embeddings();
        let result = resolver
            .resolve(&zero_chunk("hi"), &ResolutionContext::default())
            .await;
        assert!(!result.resolved);
        assert!(!result.skipped);
        assert_eq!(result.new_score, 0);
        assert_eq!(result.recommendation.as_deref(), Some("likely low-value"));
    }

    #[tokio::test]
    async fn test_semantic_degrades_on_short_content() {
        let mut resolver = ZeroRelevanceResolver::new(
            Box::new(HashEmbeddingProvider),
            Box::new(FixedPrefixProvider::none()),
            15.0,
        );
        let result = resolver
            .resolve(&zero_chunk("short"), &ResolutionContext::default())
            .await;
        let breakdown = result.breakdown.unwrap();
        assert_eq!(breakdown.semantic.score, 0.0);
        assert!(breakdown.semantic.reason.contains("50 chars"));
    }

    #[tokio::test]
    async fn test_semantic_scores_with_working_provider() {
        let mut resolver = ZeroRelevanceResolver::new(
            Box::new(HashEmbeddingProvider),
            Box::new(FixedPrefixProvider::none()),
            15.0,
        );
        let text = "Technical documentation describing the implementation of the \
                    indexing pipeline, its configuration options and trade-offs.";
        let result = resolver
            .resolve(&zero_chunk(text), &ResolutionContext::default())
            .await;
        let breakdown = result.breakdown.unwrap();
        assert!(breakdown.semantic.score > 0.0);
        assert!(breakdown.semantic.score <= 50.0);
    }

    #[tokio::test]
    async fn test_prefix_rescaling() {
        let mut resolver = ZeroRelevanceResolver::new(
            Box::new(UnavailableEmbeddingProvider),
            Box::new(FixedPrefixProvider {
                enhancement: 0.2,
                confidence: 0.9,
            }),
            15.0,
        );
        let result = resolver
            .resolve(&zero_chunk("hi"), &ResolutionContext::default())
            .await;
        let breakdown = result.breakdown.unwrap();
        assert!((breakdown.prefix.score - 25.0).abs() < 1e-9);
        // Prefix alone (25) renormalizes to 25 and resolves the chunk.
        assert!(result.resolved);
        assert_eq!(result.new_score, 25);
        assert_eq!(result.primary_signal.as_deref(), Some("prefix"));
    }

    #[tokio::test]
    async fn test_contextual_signal() {
        let mut resolver = resolver_without_embeddings();
        let context = ResolutionContext {
            file_name: Some("2024-03-01-decision-analysis.md".to_string()),
            folder_path: Some("projects/docs/decisions".to_string()),
            file_size_bytes: Some(4_096),
            file_modified: Some(Utc::now()),
            query_terms: Vec::new(),
        };
        let result = resolver.resolve(&zero_chunk("hi"), &context).await;
        let breakdown = result.breakdown.unwrap();
        // Filename 8 + folder 8 + metadata 6.
        assert!((breakdown.contextual.score - 22.0).abs() < 1e-9);
        assert!(result.resolved);
    }

    #[tokio::test]
    async fn test_threshold_clamped_to_tunable_range() {
        let low = ZeroRelevanceResolver::new(
            Box::new(UnavailableEmbeddingProvider),
            Box::new(FixedPrefixProvider::none()),
            1.0,
        );
        assert_eq!(low.threshold(), 5.0);
        let high = ZeroRelevanceResolver::new(
            Box::new(UnavailableEmbeddingProvider),
            Box::new(FixedPrefixProvider::none()),
            99.0,
        );
        assert_eq!(high.threshold(), 50.0);
    }

    #[tokio::test]
    async fn test_diagnostics_counters() {
        let mut resolver = resolver_without_embeddings();
        let structured = "# Alpha\n## Beta\n### Gamma\n\n```\nlet x = 1;\n```\n\nThe API surface.";

        resolver
            .resolve(&zero_chunk(structured), &ResolutionContext::default())
            .await;
        resolver
            .resolve(&zero_chunk("hi"), &ResolutionContext::default())
            .await;

        let diag = resolver.diagnostics();
        assert_eq!(diag.attempts, 2);
        assert_eq!(diag.successes, 1);
        assert_eq!(diag.failures, 1);
        assert_eq!(diag.resolved_by_signal.get("structural"), Some(&1));
        assert!(diag.average_resolved_score() >= 15.0);
    }
}
