//! # Convergence Navigator
//!
//! **An intention-driven navigation engine over a pre-indexed knowledge
//! corpus.**
//!
//! Instead of returning a flat ranked list, the engine decomposes a
//! navigation intention into dimensions, finds where those dimensions
//! intersect in the corpus, aggregates intersections into per-document
//! convergences, and synthesizes annotated navigation paths. A separate
//! multi-signal resolver gives zero-scored chunks a second chance.
//!
//! ## Data Flow
//!
//! 1. **Decomposition** splits the intention into temporal, semantic,
//!    categorical, and analytical dimensions.
//! 2. The **corpus provider** ([`corpus`]) loads pre-indexed chunks
//!    from a JSON file, pre-filtered by the temporal window.
//! 3. The core engine scores every chunk per dimension, forms all
//!    multi-dimension **intersections**, aggregates them into
//!    per-document **convergences**, and synthesizes **navigation
//!    paths** with narratives, steps, questions, and cross-links.
//! 4. **Zero-relevance resolution** ([`resolve`]) re-scores chunks the
//!    primary scorer rejected, using embedding similarity
//!    ([`embedding`]), structure, context, and prefix matching
//!    ([`prefix`]).
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`corpus`] | JSON-file corpus provider |
//! | [`embedding`] | Embedding backends: disabled, OpenAI with retry |
//! | [`prefix`] | Vocabulary-backed prefix-match provider |
//! | [`retry`] | Exponential-backoff retry helper |
//! | [`navigate`] | `cnav navigate` command |
//! | [`decompose`] | `cnav decompose` command |
//! | [`resolve`] | `cnav resolve` command |
//!
//! The pipeline itself lives in the `convergence-navigator-core` crate.
//!
//! ## Configuration
//!
//! Configured via a TOML file (default: `config/cnav.toml`). Every
//! setting has a default; see [`config`] for options and
//! [`config::load_config`] for validation rules.

pub mod config;
pub mod corpus;
pub mod decompose;
pub mod embedding;
pub mod navigate;
pub mod prefix;
pub mod resolve;
pub mod retry;
