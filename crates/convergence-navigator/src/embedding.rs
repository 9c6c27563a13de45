//! Embedding backends for the resolver's semantic signal.
//!
//! Two implementations of the core
//! [`EmbeddingProvider`](convergence_navigator_core::providers::EmbeddingProvider)
//! trait:
//! - **[`DisabledEmbedding`]** — always reports "unavailable"; the
//!   resolver degrades its semantic signal to zero with a reason.
//! - **[`OpenAiEmbedding`]** — calls the OpenAI embeddings API with
//!   retry and exponential backoff.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use convergence_navigator_core::providers::EmbeddingProvider;

use crate::config::EmbeddingConfig;
use crate::retry::{retry_with_backoff, Attempt};

/// Instantiate the provider selected in `[embedding]`.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledEmbedding)),
        "openai" => Ok(Box::new(OpenAiEmbedding::new(config)?)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}

/// Provider used when embeddings are not configured. Reports
/// unavailability rather than erroring, so resolution still runs on the
/// remaining signals.
pub struct DisabledEmbedding;

#[async_trait]
impl EmbeddingProvider for DisabledEmbedding {
    async fn embed(&self, _text: &str) -> Result<Option<Vec<f32>>> {
        Ok(None)
    }
}

/// Embedding provider backed by the OpenAI API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiEmbedding {
    model: String,
    max_retries: u32,
    client: reqwest::Client,
    api_key: String,
}

impl OpenAiEmbedding {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            max_retries: config.max_retries,
            client,
            api_key,
        })
    }

    async fn attempt(&self, body: &serde_json::Value) -> Result<Attempt<Vec<f32>>> {
        let resp = self
            .client
            .post("https://api.openai.com/v1/embeddings")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await;

        let response = match resp {
            Ok(response) => response,
            // Network error — retry.
            Err(e) => return Ok(Attempt::Retry(e.into())),
        };

        let status = response.status();
        if status.is_success() {
            let json: serde_json::Value = response.json().await?;
            return Ok(Attempt::Done(parse_embedding_response(&json)?));
        }

        let body_text = response.text().await.unwrap_or_default();
        if status.as_u16() == 429 || status.is_server_error() {
            return Ok(Attempt::Retry(anyhow::anyhow!(
                "OpenAI API error {}: {}",
                status,
                body_text
            )));
        }

        // Client error (not 429) — don't retry.
        bail!("OpenAI API error {}: {}", status, body_text)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Option<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": [text],
        });
        let vector = retry_with_backoff(self.max_retries, || self.attempt(&body)).await?;
        Ok(Some(vector))
    }
}

/// Extract the first `data[].embedding` array from the API response.
fn parse_embedding_response(json: &serde_json::Value) -> Result<Vec<f32>> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing data[0].embedding"))?;

    embedding
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: non-numeric component"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_reports_unavailable() {
        let provider = DisabledEmbedding;
        assert!(provider.embed("anything").await.unwrap().is_none());
    }

    #[test]
    fn test_parse_embedding_response() {
        let json = serde_json::json!({
            "data": [{"embedding": [0.1, 0.2, 0.3]}]
        });
        let vector = parse_embedding_response(&json).unwrap();
        assert_eq!(vector.len(), 3);
        assert!((vector[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_parse_rejects_missing_data() {
        assert!(parse_embedding_response(&serde_json::json!({})).is_err());
    }
}
