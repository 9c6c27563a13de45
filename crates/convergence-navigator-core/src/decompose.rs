//! Intention decomposition: free text → [`DimensionSet`].
//!
//! Splits an intention into its four interpretive dimensions using
//! fixed lookup tables, so decomposition is fully deterministic:
//!
//! 1. **Temporal** — relative-window phrases, `last N <unit>` patterns,
//!    or an explicit 4-digit year. First match wins.
//! 2. **Semantic** — tokenized keywords ranked by frequency then first
//!    occurrence, plus category-table bigrams. Top 10, deduplicated.
//! 3. **Categorical** — vocabulary → category lookup with three coarse
//!    substring fallbacks.
//! 4. **Analytical** — six label definitions scored by trigger-word
//!    occurrence, with ordered substring fallbacks and a default label.
//!
//! The lookup tables carry both English and Portuguese vocabulary;
//! the corpora this engine was built against are mixed-language, and
//! normalization strips diacritics so `"técnico"` and `"tecnico"`
//! land on the same entry.

use chrono::{DateTime, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::error::{EngineError, Result};
use crate::models::{
    DimensionSet, Intention, TemporalDimension, TemporalKind, DEFAULT_ANALYTICAL_LABEL,
};

/// Maximum number of semantic keywords kept per intention.
const MAX_KEYWORDS: usize = 10;

/// Fixed relative-window phrases, matched as substrings in order.
const RELATIVE_WINDOWS: &[(&str, i64)] = &[
    ("today", 1),
    ("hoje", 1),
    ("yesterday", 2),
    ("ontem", 2),
    ("this week", 7),
    ("esta semana", 7),
    ("this month", 30),
    ("este mes", 30),
    ("recent", 30),
    ("recente", 30),
    ("latest", 14),
];

/// `last N days/weeks/months/years`, English and Portuguese.
static QUANTIFIED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:last|past|ultim[oa]s?)\s+(\d{1,4})\s*(days?|dias?|weeks?|semanas?|months?|mes(?:es)?|years?|anos?)")
        .expect("quantified temporal regex")
});

/// Explicit 4-digit year, 1900–2099.
static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("year regex"));

/// Stop words excluded from semantic keywords.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "with", "that", "this", "from", "have", "has", "was", "were", "are",
        "what", "when", "where", "which", "who", "about", "into", "over", "under", "all", "any",
        "can", "how", "you", "your", "not", "but", "its", "out", "get", "last", "past", "days",
        "weeks", "months", "years", "que", "com", "para", "por", "uma", "dos", "das", "los",
        "sobre", "como", "mais", "nos", "nas", "ultimos",
    ]
    .into_iter()
    .collect()
});

/// Vocabulary → category lookup. Single words and bigrams; bigram keys
/// also feed the semantic extractor.
const CATEGORY_TABLE: &[(&str, &[&str])] = &[
    ("breakthrough", &["Technical"]),
    ("api", &["Technical"]),
    ("code", &["Technical"]),
    ("architecture", &["Technical"]),
    ("performance", &["Technical"]),
    ("machine learning", &["Technical", "Learning"]),
    ("data pipeline", &["Technical"]),
    ("strategy", &["Strategic"]),
    ("estrategia", &["Strategic"]),
    ("decision", &["Strategic"]),
    ("decisao", &["Strategic"]),
    ("roadmap", &["Strategic"]),
    ("business plan", &["Strategic"]),
    ("insight", &["Insight"]),
    ("discovery", &["Insight"]),
    ("learning", &["Learning"]),
    ("aprendizado", &["Learning"]),
    ("course", &["Learning"]),
    ("study notes", &["Learning"]),
    ("project", &["Project"]),
    ("projeto", &["Project"]),
];

/// Coarse substring fallbacks applied when the table yields nothing.
const CATEGORY_FALLBACKS: &[(&[&str], &str)] = &[
    (&["tech", "system", "data", "engine"], "Technical"),
    (&["plan", "goal", "strateg", "decis"], "Strategic"),
    (&["learn", "aprend", "study", "tutorial"], "Learning"),
];

/// One of the six analytical label definitions.
struct AnalyticalLabel {
    label: &'static str,
    triggers: &'static [&'static str],
}

/// Label definitions in tie-break order. Trigger words are stored in
/// normalized (diacritic-free) form.
const ANALYTICAL_LABELS: &[AnalyticalLabel] = &[
    AnalyticalLabel {
        label: "Breakthrough Técnico",
        triggers: &["breakthrough", "solved", "solution", "tecnico", "fix", "working"],
    },
    AnalyticalLabel {
        label: "Evolução Conceitual",
        triggers: &["evolution", "evolucao", "concept", "conceitual", "understanding", "theory"],
    },
    AnalyticalLabel {
        label: "Momento Decisivo",
        triggers: &["decision", "decisivo", "turning", "pivotal", "choice", "momento"],
    },
    AnalyticalLabel {
        label: "Insight Estratégico",
        triggers: &["insight", "strategic", "estrategico", "vision", "opportunity"],
    },
    AnalyticalLabel {
        label: "Aprendizado Geral",
        triggers: &["learning", "aprendizado", "lesson", "study", "practice", "skill"],
    },
    AnalyticalLabel {
        label: DEFAULT_ANALYTICAL_LABEL,
        triggers: &["analysis", "analise", "review", "overview"],
    },
];

/// Ordered substring fallbacks when no trigger word scores.
const ANALYTICAL_FALLBACKS: &[(&str, &str)] = &[
    ("break", "Breakthrough Técnico"),
    ("decis", "Momento Decisivo"),
    ("insight", "Insight Estratégico"),
    ("learn", "Aprendizado Geral"),
];

/// Build an [`Intention`] from raw text.
///
/// Fails with [`EngineError::InvalidInput`] when the text is empty or
/// whitespace-only; this is the only failure mode of decomposition.
pub fn intention(raw: &str) -> Result<Intention> {
    if raw.trim().is_empty() {
        return Err(EngineError::InvalidInput(
            "intention text is empty".to_string(),
        ));
    }
    Ok(Intention {
        raw: raw.to_string(),
        normalized: normalize_text(raw),
    })
}

/// Decompose an intention into its dimension set.
///
/// Deterministic for fixed lookup tables and a fixed `now`. Never fails
/// after input validation: a dimension with no signal comes back as
/// `None`/empty.
pub fn decompose(raw: &str, now: DateTime<Utc>) -> Result<DimensionSet> {
    let intention = intention(raw)?;
    Ok(decompose_intention(&intention, now))
}

/// Decompose an already-validated intention.
pub fn decompose_intention(intention: &Intention, now: DateTime<Utc>) -> DimensionSet {
    let text = &intention.normalized;

    let temporal = extract_temporal(text, now);
    let semantic = extract_semantic(text);
    let categorical = extract_categorical(text);
    let analytical = extract_analytical(text);

    let confidence = decomposition_confidence(&temporal, &semantic, &categorical, &analytical);

    DimensionSet {
        temporal,
        semantic,
        categorical,
        analytical: Some(analytical),
        confidence,
    }
}

/// Lowercase, fold diacritics, strip punctuation, collapse whitespace.
pub fn normalize_text(raw: &str) -> String {
    let folded: String = raw
        .chars()
        .flat_map(|c| c.to_lowercase())
        .map(fold_diacritic)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fold common Latin diacritics to their ASCII base letter.
fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// Try the three temporal extractors in order; first match wins.
fn extract_temporal(text: &str, now: DateTime<Utc>) -> Option<TemporalDimension> {
    for (phrase, days) in RELATIVE_WINDOWS {
        if text.contains(phrase) {
            return Some(window_ending_now(TemporalKind::Relative, *days, now));
        }
    }

    if let Some(caps) = QUANTIFIED_RE.captures(text) {
        let n: i64 = caps[1].parse().unwrap_or(1);
        let unit = &caps[2];
        let multiplier = if unit.starts_with("day") || unit.starts_with("dia") {
            1
        } else if unit.starts_with("week") || unit.starts_with("semana") {
            7
        } else if unit.starts_with("month") || unit.starts_with("mes") {
            30
        } else {
            365
        };
        return Some(window_ending_now(
            TemporalKind::Quantified,
            n * multiplier,
            now,
        ));
    }

    if let Some(caps) = YEAR_RE.captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
        let end = Utc.with_ymd_and_hms(year, 12, 31, 23, 59, 59).single()?;
        return Some(TemporalDimension {
            kind: TemporalKind::Specific,
            start_date: start,
            end_date: end,
            day_window: (end - start).num_days() + 1,
        });
    }

    None
}

fn window_ending_now(kind: TemporalKind, days: i64, now: DateTime<Utc>) -> TemporalDimension {
    TemporalDimension {
        kind,
        start_date: now - Duration::days(days),
        end_date: now,
        day_window: days,
    }
}

/// Rank keyword candidates by (frequency desc, first position asc) and
/// keep the top 10, plus any category-table bigrams present.
fn extract_semantic(text: &str) -> Vec<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    struct Candidate {
        word: String,
        frequency: usize,
        first_position: usize,
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for (position, token) in tokens.iter().enumerate() {
        if token.len() <= 2 || STOP_WORDS.contains(token) {
            continue;
        }
        match candidates.iter_mut().find(|c| c.word == *token) {
            Some(c) => c.frequency += 1,
            None => candidates.push(Candidate {
                word: token.to_string(),
                frequency: 1,
                first_position: position,
            }),
        }
    }

    // Category-table bigrams count as keyword candidates too.
    for window in tokens.windows(2) {
        let bigram = format!("{} {}", window[0], window[1]);
        if CATEGORY_TABLE.iter().any(|(key, _)| *key == bigram)
            && !candidates.iter().any(|c| c.word == bigram)
        {
            candidates.push(Candidate {
                word: bigram,
                frequency: 1,
                first_position: tokens.len(),
            });
        }
    }

    candidates.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then(a.first_position.cmp(&b.first_position))
    });

    let mut keywords = Vec::new();
    for c in candidates {
        if !keywords.contains(&c.word) {
            keywords.push(c.word);
        }
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }
    keywords
}

/// Union of categories from the lookup table, with coarse fallbacks.
fn extract_categorical(text: &str) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();

    for (key, cats) in CATEGORY_TABLE {
        let hit = if key.contains(' ') {
            text.contains(key)
        } else {
            text.split_whitespace().any(|t| t == *key)
        };
        if hit {
            for cat in *cats {
                if !categories.iter().any(|c| c == cat) {
                    categories.push((*cat).to_string());
                }
            }
        }
    }

    if categories.is_empty() {
        for (roots, category) in CATEGORY_FALLBACKS {
            if roots.iter().any(|root| text.contains(root)) {
                categories.push((*category).to_string());
            }
        }
    }

    categories
}

/// Score the six label definitions by trigger occurrence; ties break by
/// definition order. Falls back to ordered substring checks, then the
/// default label.
fn extract_analytical(text: &str) -> String {
    let mut best: Option<(&str, usize)> = None;
    for def in ANALYTICAL_LABELS {
        let hits: usize = def
            .triggers
            .iter()
            .filter(|t| text.contains(*(*t)))
            .count();
        if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
            best = Some((def.label, hits));
        }
    }
    if let Some((label, _)) = best {
        return label.to_string();
    }

    for (root, label) in ANALYTICAL_FALLBACKS {
        if text.contains(root) {
            return (*label).to_string();
        }
    }

    DEFAULT_ANALYTICAL_LABEL.to_string()
}

/// Confidence = populated dimensions / 4, plus a 0.5 bonus for a rich
/// semantic dimension and another for a rich categorical one, capped
/// at 1.
fn decomposition_confidence(
    temporal: &Option<TemporalDimension>,
    semantic: &[String],
    categorical: &[String],
    analytical: &str,
) -> f64 {
    let mut populated: f64 = 0.0;
    if temporal.is_some() {
        populated += 1.0;
    }
    if !semantic.is_empty() {
        populated += 1.0;
    }
    if !categorical.is_empty() {
        populated += 1.0;
    }
    if analytical != DEFAULT_ANALYTICAL_LABEL {
        populated += 1.0;
    }

    let mut confidence = populated / 4.0;
    if semantic.len() > 3 {
        confidence += 0.5;
    }
    if categorical.len() > 2 {
        confidence += 0.5;
    }
    confidence.min(1.0)
}
