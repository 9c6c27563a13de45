//! Engine error types.
//!
//! Two categories cover every failure the engine can produce:
//!
//! - [`EngineError::InvalidInput`] — the intention text is unusable.
//!   Raised before any scoring happens.
//! - [`EngineError::ProviderUnavailable`] — an external capability
//!   (corpus, embedding, prefix match) could not be reached.
//!   [`Navigator::navigate`](crate::navigate::Navigator::navigate)
//!   records it as a warning and degrades to an empty corpus slice
//!   instead of failing the request.

use thiserror::Error;

/// Errors produced by the convergence engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The intention text is empty or otherwise unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An external provider could not be reached.
    ///
    /// `provider` names the capability ("corpus", "embedding",
    /// "prefix"); `reason` carries the transport-level detail.
    #[error("provider '{provider}' unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },
}

impl EngineError {
    /// Shorthand for a provider-unavailable error.
    pub fn provider(provider: &str, reason: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, EngineError>;
