//! # Convergence Navigator CLI (`cnav`)
//!
//! The `cnav` binary exposes the convergence engine for exploring a
//! pre-indexed knowledge corpus by intention.
//!
//! ## Usage
//!
//! ```bash
//! cnav --config ./config/cnav.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cnav navigate "<intention>"` | Decompose, intersect, converge, and print navigation paths |
//! | `cnav decompose "<intention>"` | Show the dimension decomposition without touching the corpus |
//! | `cnav resolve` | Run zero-relevance resolution over the corpus |
//!
//! ## Examples
//!
//! ```bash
//! # Navigate with human-readable output
//! cnav navigate "breakthrough results from last 30 days"
//!
//! # Full machine-readable outcome, including intersections
//! cnav navigate "decisoes estrategicas deste mes" --json
//!
//! # Inspect scoring detail per intersection
//! cnav navigate "machine learning insights" --explain
//!
//! # Check how an intention decomposes before running it
//! cnav decompose "recent project learnings"
//!
//! # Give zero-scored chunks a second chance
//! cnav resolve --verbose
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use convergence_navigator::{config, decompose, navigate, resolve};

/// Convergence Navigator CLI — intention-driven navigation over a
/// pre-indexed knowledge corpus.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file. See `config/cnav.example.toml` for a full
/// example.
#[derive(Parser)]
#[command(
    name = "cnav",
    about = "Convergence Navigator — intention-driven navigation over a knowledge corpus",
    version,
    long_about = "Convergence Navigator decomposes a navigation intention into temporal, \
    semantic, categorical, and analytical dimensions, finds where they intersect in a \
    pre-indexed chunk corpus, and synthesizes ranked navigation paths with narratives, \
    suggested steps, and cross-links."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/cnav.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the full navigation pipeline for an intention.
    ///
    /// Decomposes the intention, scores the corpus across dimensions,
    /// identifies convergences, and prints ranked navigation paths.
    /// When nothing converges, an exploratory path with refinement
    /// suggestions is printed instead.
    Navigate {
        /// The navigation intention, in English or Portuguese.
        intention: String,

        /// Override the convergence density threshold from config
        /// (clamped to [0.0, 1.0]).
        #[arg(long)]
        threshold: Option<f64>,

        /// Emit the full outcome as pretty-printed JSON.
        #[arg(long)]
        json: bool,

        /// Also print per-intersection scoring detail.
        #[arg(long)]
        explain: bool,
    },

    /// Show how an intention decomposes into dimensions.
    ///
    /// Runs only the decomposition stage; no corpus is required.
    Decompose {
        /// The navigation intention.
        intention: String,

        /// Emit the dimension set as pretty-printed JSON.
        #[arg(long)]
        json: bool,
    },

    /// Re-score zero-relevance chunks with the multi-signal resolver.
    ///
    /// Walks every chunk the primary scorer left at zero, combines
    /// semantic, structural, contextual, and prefix signals, and prints
    /// which chunks were resolved. Resolution failure is a normal
    /// outcome, not an error.
    Resolve {
        /// Resolve only this chunk id (skipped if its base score is
        /// non-zero). By default every zero-scored chunk is attempted.
        chunk_id: Option<String>,

        /// Emit per-chunk results and diagnostics as JSON.
        #[arg(long)]
        json: bool,

        /// Print the per-signal breakdown for every chunk.
        #[arg(long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Decompose needs no configuration at all.
    if let Commands::Decompose { intention, json } = &cli.command {
        decompose::run_decompose(intention, *json)?;
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Navigate {
            intention,
            threshold,
            json,
            explain,
        } => {
            navigate::run_navigate(&cfg, &intention, threshold, json, explain).await?;
        }
        Commands::Resolve {
            chunk_id,
            json,
            verbose,
        } => {
            resolve::run_resolve(&cfg, chunk_id.as_deref(), json, verbose).await?;
        }
        Commands::Decompose { .. } => unreachable!(),
    }

    Ok(())
}
