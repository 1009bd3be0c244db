//! lore - batch entity resolution over JSON files.
//!
//! Reads extracted candidates and existing graph entities from a request
//! file and writes decisions as JSON to stdout. Logs go to stderr.
//!
//! # Configuration
//!
//! - `--config <file>` (TOML, JSON or YAML), otherwise `~/.lore/resolution.toml`
//! - `LORE_AUTO_MERGE_THRESHOLD`, `LORE_REVIEW_THRESHOLD`,
//!   `LORE_WITHIN_SEGMENT_THRESHOLD`, `LORE_VETO_THRESHOLD`,
//!   `LORE_USE_LLM_REFINEMENT` override individual settings
//! - `RUST_LOG` controls log verbosity (default `info`)
//!
//! # Request format
//!
//! ```json
//! {
//!   "candidates": [
//!     {"name": "Harry", "type": "character", "segmentId": "s1", "embedding": [0.1, 0.2]}
//!   ],
//!   "existing": [{"id": "e1", "name": "Harry Potter", "type": "character"}],
//!   "options": {"documentId": "doc-1", "userId": "user-1"},
//!   "graphContext": {"e1": {"segmentIds": ["s0"], "neighborEntityIds": []}}
//! }
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lore_core::GraphContextProvider;
use lore_resolution::aliases::{
    extract_epithet, extract_title, get_name_tokens, normalize_name_for_matching,
};
use lore_resolution::phonetic::phonetic_code;
use lore_resolution::{cluster_across_segments, BlockingIndex, EntityResolver, ScoredCandidate};

mod request;

use request::{select_config, ResolveOutput, ResolveRequest};

#[derive(Parser, Debug)]
#[command(name = "lore", version, about = "Entity resolution for narrative knowledge graphs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve candidates against existing entities.
    Resolve {
        /// Request file (JSON).
        #[arg(long, short)]
        input: PathBuf,
        /// Resolution config file.
        #[arg(long, short, env = "LORE_CONFIG")]
        config: Option<PathBuf>,
        /// Pretty-print the output.
        #[arg(long)]
        pretty: bool,
    },
    /// List ranked merge targets per cluster without deciding.
    Candidates {
        /// Request file (JSON).
        #[arg(long, short)]
        input: PathBuf,
        /// Resolution config file.
        #[arg(long, short, env = "LORE_CONFIG")]
        config: Option<PathBuf>,
        /// Maximum targets listed per cluster.
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Show how names are normalized, tokenized and phonetically coded.
    Normalize {
        /// Names to inspect.
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClusterCandidates {
    primary_name: String,
    #[serde(rename = "type")]
    entity_type: String,
    aliases: Vec<String>,
    candidates: Vec<ScoredCandidate>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NameAnalysis {
    name: String,
    normalized: String,
    title: Option<String>,
    epithet: Option<String>,
    tokens: Vec<String>,
    phonetic_code: Option<String>,
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn run_resolve(input: PathBuf, config: Option<PathBuf>, pretty: bool) -> Result<()> {
    let request = ResolveRequest::from_file(&input)?;
    let config = select_config(config.as_deref(), &request.options)?;
    info!(
        document_id = %request.options.document_id,
        candidates = request.candidates.len(),
        existing = request.existing.len(),
        "Resolving"
    );

    let graph_context: Option<&dyn GraphContextProvider> = if request.graph_context.is_empty() {
        None
    } else {
        Some(&request.graph_context)
    };

    let resolved =
        EntityResolver::new(config).resolve(request.candidates, &request.existing, graph_context);
    print_json(&ResolveOutput::from(resolved), pretty)
}

fn run_candidates(input: PathBuf, config: Option<PathBuf>, limit: usize) -> Result<()> {
    let request = ResolveRequest::from_file(&input)?;
    let config = select_config(config.as_deref(), &request.options)?;

    let graph_context: Option<&dyn GraphContextProvider> = if request.graph_context.is_empty() {
        None
    } else {
        Some(&request.graph_context)
    };

    let clusters = cluster_across_segments(request.candidates, &config.thresholds);
    let index = BlockingIndex::build(&request.existing);
    let resolver = EntityResolver::new(config);

    let listing: Vec<ClusterCandidates> = clusters
        .into_iter()
        .map(|cluster| {
            let mut candidates = resolver.resolution_candidates(&cluster, &index, graph_context);
            candidates.truncate(limit);
            ClusterCandidates {
                primary_name: cluster.primary_name,
                entity_type: cluster.entity_type.to_string(),
                aliases: cluster.aliases,
                candidates,
            }
        })
        .collect();

    print_json(&listing, true)
}

fn run_normalize(names: Vec<String>) -> Result<()> {
    let analyses: Vec<NameAnalysis> = names
        .into_iter()
        .map(|name| {
            let normalized = normalize_name_for_matching(&name);
            NameAnalysis {
                title: extract_title(&name),
                epithet: extract_epithet(&name),
                tokens: get_name_tokens(&name),
                phonetic_code: phonetic_code(&normalized),
                normalized,
                name,
            }
        })
        .collect();

    print_json(&analyses, true)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs to stderr; stdout carries the JSON output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    lore_resolution::ensure_loaded()
        .await
        .context("failed to load phonetic coder")?;

    match cli.command {
        Command::Resolve { input, config, pretty } => run_resolve(input, config, pretty),
        Command::Candidates { input, config, limit } => run_candidates(input, config, limit),
        Command::Normalize { names } => run_normalize(names),
    }
}
