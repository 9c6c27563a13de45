//! TOML configuration parsing and validation.
//!
//! All tunables ship with defaults, so an empty file (or one with only a
//! `[corpus]` section) is a valid configuration. Validation happens once
//! in [`load_config`]; the rest of the crate trusts the loaded values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use convergence_navigator_core::converge::ConvergenceConfig;
use convergence_navigator_core::navigate::EngineConfig;
use convergence_navigator_core::paths::PathConfig;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub resolver: ResolverSection,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorpusConfig {
    /// Path to a JSON file holding the chunk corpus. `cnav decompose`
    /// works without one.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// `[engine]` — convergence and path-synthesis tuning.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineSection {
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,
    #[serde(default = "default_max_convergences")]
    pub max_convergences: usize,
    #[serde(default = "default_max_paths")]
    pub max_paths: usize,
    #[serde(default = "default_min_path_density")]
    pub min_path_density: f64,
}

fn default_convergence_threshold() -> f64 {
    0.3
}
fn default_max_convergences() -> usize {
    10
}
fn default_max_paths() -> usize {
    5
}
fn default_min_path_density() -> f64 {
    0.5
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            convergence_threshold: default_convergence_threshold(),
            max_convergences: default_max_convergences(),
            max_paths: default_max_paths(),
            min_path_density: default_min_path_density(),
        }
    }
}

impl EngineSection {
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            convergence: ConvergenceConfig {
                threshold: self.convergence_threshold,
                max_convergences: self.max_convergences,
            },
            paths: PathConfig {
                max_paths: self.max_paths,
                min_density: self.min_path_density,
            },
        }
    }
}

/// `[resolver]` — zero-relevance resolution tuning.
#[derive(Debug, Deserialize, Clone)]
pub struct ResolverSection {
    /// Combined-score threshold for a successful resolution. Clamped to
    /// `5..=50` by the engine.
    #[serde(default = "default_resolver_threshold")]
    pub threshold: f64,
    /// Domain vocabulary for the prefix-match signal.
    #[serde(default)]
    pub vocabulary: Vec<String>,
}

fn default_resolver_threshold() -> f64 {
    15.0
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            threshold: default_resolver_threshold(),
            vocabulary: Vec::new(),
        }
    }
}

/// `[embedding]` — provider settings for the resolver's semantic signal.
#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if !(0.0..=1.0).contains(&config.engine.convergence_threshold) {
        anyhow::bail!("engine.convergence_threshold must be in [0.0, 1.0]");
    }
    if config.engine.max_convergences == 0 {
        anyhow::bail!("engine.max_convergences must be >= 1");
    }
    if config.engine.max_paths == 0 {
        anyhow::bail!("engine.max_paths must be >= 1");
    }
    if !(0.0..=1.0).contains(&config.engine.min_path_density) {
        anyhow::bail!("engine.min_path_density must be in [0.0, 1.0]");
    }
    if !(5.0..=50.0).contains(&config.resolver.threshold) {
        anyhow::bail!("resolver.threshold must be in [5.0, 50.0]");
    }

    if config.embedding.is_enabled() && config.embedding.model.is_none() {
        anyhow::bail!(
            "embedding.model must be specified when provider is '{}'",
            config.embedding.provider
        );
    }
    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.engine.convergence_threshold, 0.3);
        assert_eq!(config.engine.max_convergences, 10);
        assert_eq!(config.engine.max_paths, 5);
        assert_eq!(config.resolver.threshold, 15.0);
        assert!(!config.embedding.is_enabled());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let file = write_config("[engine]\nconvergence_threshold = 1.5\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_openai_requires_model() {
        let file = write_config("[embedding]\nprovider = \"openai\"\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_full_config_parses() {
        let file = write_config(
            r#"[corpus]
path = "./data/corpus.json"

[engine]
convergence_threshold = 0.4
max_paths = 3

[resolver]
threshold = 20.0
vocabulary = ["pipeline", "deployment"]

[embedding]
provider = "openai"
model = "text-embedding-3-small"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert!(config.corpus.path.is_some());
        assert_eq!(config.engine.to_engine_config().paths.max_paths, 3);
        assert_eq!(config.resolver.vocabulary.len(), 2);
        assert_eq!(
            config.embedding.model.as_deref(),
            Some("text-embedding-3-small")
        );
    }
}
