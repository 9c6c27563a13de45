//! Score normalization across the three numeric conventions the engine
//! touches: cosine similarity (`-1..1`), native vector-store score
//! (`0..1`), and the canonical percentage scale (`0..100`).
//!
//! Everything here is pure arithmetic with no dependencies; the
//! intersection calculator, resolver, and CLI output all route their
//! scale conversions through this module so the conversions happen in
//! exactly one place.

use serde::Serialize;
use std::collections::HashMap;

/// Linearly remap `value` from one range to another.
///
/// `normalize(x, r, r) == x` for any non-degenerate range `r`. A
/// degenerate source range maps everything to the target minimum.
pub fn normalize(value: f64, from: (f64, f64), to: (f64, f64)) -> f64 {
    let (from_min, from_max) = from;
    let (to_min, to_max) = to;
    if (from_max - from_min).abs() < f64::EPSILON {
        return to_min;
    }
    to_min + (value - from_min) / (from_max - from_min) * (to_max - to_min)
}

/// Coerce a score of unknown convention onto the `0..100` percentage
/// scale.
///
/// Values inside `[-1, 1]` are treated as similarity / native-store
/// scores: negative values remap from `(-1, 1)`, non-negative ones
/// scale by 100. Anything else is assumed to already be a percentage
/// and is clamped to `[0, 100]`.
///
/// The two conventions overlap on `(0, 1]`: a percentage that small is
/// indistinguishable from a raw similarity score and a second pass
/// would rescale it, so callers coerce each raw score exactly once.
/// Re-application is a no-op for every output above 1.
pub fn ensure_percentage(value: f64) -> f64 {
    if (-1.0..=1.0).contains(&value) {
        if value < 0.0 {
            normalize(value, (-1.0, 1.0), (0.0, 100.0))
        } else {
            value * 100.0
        }
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Categorical band for a percentage score.
///
/// Band edges sit at 30 / 50 / 70 / 90.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreBand {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ScoreBand {
    /// Classify a percentage score into its band.
    pub fn of(percentage: f64) -> Self {
        match percentage {
            p if p >= 90.0 => ScoreBand::VeryHigh,
            p if p >= 70.0 => ScoreBand::High,
            p if p >= 50.0 => ScoreBand::Medium,
            p if p >= 30.0 => ScoreBand::Low,
            _ => ScoreBand::VeryLow,
        }
    }

    /// Human-readable label for CLI output.
    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::VeryLow => "very low",
            ScoreBand::Low => "low",
            ScoreBand::Medium => "medium",
            ScoreBand::High => "high",
            ScoreBand::VeryHigh => "very high",
        }
    }

    /// ANSI color name used when rendering to a terminal.
    pub fn color(self) -> &'static str {
        match self {
            ScoreBand::VeryLow => "red",
            ScoreBand::Low => "yellow",
            ScoreBand::Medium => "white",
            ScoreBand::High => "green",
            ScoreBand::VeryHigh => "cyan",
        }
    }
}

/// Weighted composite over a field→score map.
///
/// Fields named in `weights` but absent from `fields` are skipped, and
/// the result renormalizes by the weight actually used, so a composite
/// over a single present field equals that field's score.
///
/// Returns `0.0` when no weighted field is present.
pub fn weighted_composite(fields: &HashMap<&str, f64>, weights: &[(&str, f64)]) -> f64 {
    let mut total = 0.0;
    let mut used_weight = 0.0;
    for (name, weight) in weights {
        if let Some(value) = fields.get(name) {
            total += value * weight;
            used_weight += weight;
        }
    }
    if used_weight < f64::EPSILON {
        return 0.0;
    }
    total / used_weight
}

/// Descriptive statistics over a batch of scores.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

/// Compute min/max/mean/median/population-stddev for a batch.
///
/// Returns `None` for an empty batch.
pub fn batch_stats(values: &[f64]) -> Option<ScoreStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / sorted.len() as f64;

    Some(ScoreStats {
        min,
        max,
        mean,
        median,
        std_dev: variance.sqrt(),
    })
}

/// Rescale a batch so it has the target mean and standard deviation.
///
/// Values are z-scored against the batch's own statistics, then shifted
/// onto the target distribution. A batch with zero spread collapses to
/// the target mean.
pub fn z_rescale(values: &[f64], target_mean: f64, target_std: f64) -> Vec<f64> {
    let Some(stats) = batch_stats(values) else {
        return Vec::new();
    };
    if stats.std_dev < f64::EPSILON {
        return vec![target_mean; values.len()];
    }
    values
        .iter()
        .map(|v| (v - stats.mean) / stats.std_dev * target_std + target_mean)
        .collect()
}

/// Strategy for collapsing several scores into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombineStrategy {
    Max,
    Min,
    Mean,
    /// Earlier scores weigh more: `weight_i = 1/(i+1)`.
    PositionWeighted,
    /// Harmonic mean; punishes any low score in the set.
    Harmonic,
}

/// Combine a set of scores using the given strategy.
///
/// Returns `0.0` for an empty input.
pub fn combine(values: &[f64], strategy: CombineStrategy) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    match strategy {
        CombineStrategy::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        CombineStrategy::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        CombineStrategy::Mean => values.iter().sum::<f64>() / values.len() as f64,
        CombineStrategy::PositionWeighted => {
            let mut total = 0.0;
            let mut weight_sum = 0.0;
            for (i, v) in values.iter().enumerate() {
                let w = 1.0 / (i as f64 + 1.0);
                total += v * w;
                weight_sum += w;
            }
            total / weight_sum
        }
        CombineStrategy::Harmonic => {
            if values.iter().any(|v| *v <= 0.0) {
                return 0.0;
            }
            values.len() as f64 / values.iter().map(|v| 1.0 / v).sum::<f64>()
        }
    }
}
