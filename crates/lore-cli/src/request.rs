//! Request files and configuration selection for the `lore` binary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lore_core::{EntityCandidate, ExistingEntity, GraphContext, ResolutionConfig, ResolverOptions};
use lore_resolution::{
    map_to_legacy_decision, ClusterResolutionResult, LegacyDecision, ResolutionStats,
    ResolveResult,
};

/// Contents of a `--input` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub candidates: Vec<EntityCandidate>,
    #[serde(default)]
    pub existing: Vec<ExistingEntity>,
    #[serde(default)]
    pub options: ResolverOptions,
    /// Graph context per existing entity id.
    #[serde(default)]
    pub graph_context: HashMap<String, GraphContext>,
}

impl ResolveRequest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request file {}", path.display()))?;
        let request: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid request JSON in {}", path.display()))?;
        debug!(
            candidates = request.candidates.len(),
            existing = request.existing.len(),
            "Loaded resolution request"
        );
        Ok(request)
    }
}

/// Pick the configuration for a run.
///
/// Precedence for the base: `--config` file, then the request's own
/// `options.config`, then `~/.lore/resolution.toml` if present, then the
/// defaults. `LORE_*` environment variables are applied on top and the
/// result is validated.
pub fn select_config(
    config_path: Option<&Path>,
    options: &ResolverOptions,
) -> Result<ResolutionConfig> {
    let base = if let Some(path) = config_path {
        info!(path = %path.display(), "Loading resolution config");
        ResolutionConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?
    } else if let Some(config) = &options.config {
        config.clone()
    } else {
        let default_path: PathBuf = ResolutionConfig::default_path();
        if default_path.exists() {
            info!(path = %default_path.display(), "Loading resolution config");
            ResolutionConfig::from_file(&default_path)
                .with_context(|| format!("failed to load config {}", default_path.display()))?
        } else {
            ResolutionConfig::default()
        }
    };

    let config = base.with_env_overrides();
    config.validate().context("invalid resolution config")?;
    Ok(config)
}

/// A cluster result with its legacy-pipeline decision.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEntry {
    #[serde(flatten)]
    pub result: ClusterResolutionResult,
    pub legacy_decision: LegacyDecision,
}

/// Output of `lore resolve`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOutput {
    pub results: Vec<ResolvedEntry>,
    pub stats: ResolutionStats,
}

impl From<ResolveResult> for ResolveOutput {
    fn from(resolved: ResolveResult) -> Self {
        let results = resolved
            .results
            .into_iter()
            .map(|result| ResolvedEntry {
                legacy_decision: map_to_legacy_decision(&result),
                result,
            })
            .collect();
        Self {
            results,
            stats: resolved.stats,
        }
    }
}
