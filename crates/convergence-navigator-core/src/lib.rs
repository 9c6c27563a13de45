//! # Convergence Navigator Core
//!
//! The convergence engine: intention decomposition, multi-dimensional
//! chunk scoring, combinatorial intersection, convergence aggregation,
//! navigation path synthesis, and zero-relevance resolution.
//!
//! This crate holds the pure pipeline plus the provider traits it is
//! parameterized over. Corpus loading, embedding backends, CLI and
//! configuration live in the `convergence-navigator` application crate;
//! in-memory providers for tests ship in [`providers::memory`].

pub mod converge;
pub mod decompose;
pub mod error;
pub mod intersect;
pub mod models;
pub mod navigate;
pub mod paths;
pub mod providers;
pub mod resolver;
pub mod score;
