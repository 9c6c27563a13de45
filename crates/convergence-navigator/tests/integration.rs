use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{Duration, Utc};
use tempfile::TempDir;

fn cnav_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("cnav");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let recent = (Utc::now() - Duration::days(5)).to_rfc3339();
    let stale = (Utc::now() - Duration::days(400)).to_rfc3339();

    let corpus = format!(
        r##"[
  {{
    "id": "alpha-1",
    "source_document_id": "alpha",
    "text": "Breakthrough results on the new ingestion pipeline.",
    "keywords": ["breakthrough", "pipeline"],
    "categories": ["Technical"],
    "analysis_type_label": "Breakthrough Técnico",
    "last_modified": "{recent}",
    "base_relevance_score": 40.0
  }},
  {{
    "id": "beta-1",
    "source_document_id": "beta",
    "text": "Quarterly revenue strategy meeting notes.",
    "keywords": ["strategy"],
    "categories": ["Strategic"],
    "last_modified": "{stale}",
    "base_relevance_score": 25.0
  }},
  {{
    "id": "gamma-1",
    "source_document_id": "gamma",
    "text": "# Setup\n## Install\n### Configure\n\n```\ncargo run\n```\n\nThe API surface.",
    "base_relevance_score": 0.0
  }}
]"##
    );
    let corpus_path = root.join("corpus.json");
    fs::write(&corpus_path, corpus).unwrap();

    let config_content = format!(
        r#"[corpus]
path = "{}"

[engine]
convergence_threshold = 0.3
max_paths = 5

[resolver]
threshold = 15.0
vocabulary = ["pipeline", "deployment"]
"#,
        corpus_path.display()
    );
    let config_path = root.join("cnav.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_cnav(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = cnav_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run cnav binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_navigate_finds_primary_path() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_cnav(
        &config,
        &["navigate", "breakthrough results from last 30 days"],
    );
    assert!(ok, "navigate failed: {stderr}");
    assert!(stdout.contains("PRIMARY"), "no primary path in: {stdout}");
    assert!(stdout.contains("alpha"), "expected alpha evidence: {stdout}");
}

#[test]
fn test_navigate_json_output() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_cnav(
        &config,
        &[
            "navigate",
            "breakthrough results from last 30 days",
            "--json",
        ],
    );
    assert!(ok, "navigate --json failed: {stderr}");

    let outcome: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(outcome["total_chunks"], 3);
    let paths = outcome["paths"].as_array().unwrap();
    assert!(!paths.is_empty());
    assert_eq!(paths[0]["type"], "primary");
    assert_eq!(
        outcome["convergences"][0]["source_document_id"],
        "alpha"
    );
}

#[test]
fn test_navigate_no_convergence_sentinel() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_cnav(
        &config,
        &["navigate", "quantum chromodynamics from 1997", "--json"],
    );
    assert!(ok, "navigate failed: {stderr}");

    let outcome: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(outcome["convergences"].as_array().unwrap().is_empty());
    let paths = outcome["paths"].as_array().unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0]["tag"], "no-convergence");
}

#[test]
fn test_navigate_threshold_override() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_cnav(
        &config,
        &[
            "navigate",
            "breakthrough results from last 30 days",
            "--threshold",
            "0.99",
            "--json",
        ],
    );
    assert!(ok, "navigate failed: {stderr}");
    let outcome: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(outcome["convergences"].as_array().unwrap().is_empty());
}

#[test]
fn test_decompose_without_config() {
    let (_tmp, _config) = setup_test_env();
    // Decompose must work with a config path that does not exist.
    let missing = Path::new("/nonexistent/cnav.toml");
    let (stdout, stderr, ok) = run_cnav(
        missing,
        &["decompose", "ultimos 7 dias de aprendizado", "--json"],
    );
    assert!(ok, "decompose failed: {stderr}");

    let dimensions: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(dimensions["temporal"]["day_window"], 7);
    assert!(!dimensions["semantic"].as_array().unwrap().is_empty());
}

#[test]
fn test_decompose_rejects_empty_intention() {
    let (_tmp, config) = setup_test_env();
    let (_stdout, _stderr, ok) = run_cnav(&config, &["decompose", "   "]);
    assert!(!ok);
}

#[test]
fn test_resolve_zero_relevance_chunk() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_cnav(&config, &["resolve", "--json"]);
    assert!(ok, "resolve failed: {stderr}");

    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = report["results"].as_array().unwrap();
    // Only the zero-scored gamma chunk is attempted.
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["chunk_id"], "gamma-1");
    assert_eq!(results[0]["resolved"], true);
    let new_score = results[0]["new_score"].as_u64().unwrap();
    assert!((15..=45).contains(&new_score));
    assert_eq!(report["diagnostics"]["attempts"], 1);
    assert_eq!(report["diagnostics"]["successes"], 1);
}

#[test]
fn test_resolve_specific_chunk_with_score_is_skipped() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_cnav(&config, &["resolve", "alpha-1", "--json"]);
    assert!(ok, "resolve failed: {stderr}");

    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["skipped"], true);
    assert_eq!(report["diagnostics"]["attempts"], 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_tmp, config) = setup_test_env();
    let bad = config.parent().unwrap().join("bad.toml");
    fs::write(&bad, "[engine]\nconvergence_threshold = 2.0\n").unwrap();
    let (_stdout, stderr, ok) = run_cnav(&bad, &["navigate", "anything"]);
    assert!(!ok);
    assert!(stderr.contains("convergence_threshold"), "stderr: {stderr}");
}
