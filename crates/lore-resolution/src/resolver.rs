//! End-to-end resolution pipeline.
//!
//! cluster -> build blocking index -> filter per cluster -> score -> decide.
//! A resolution call owns all of its intermediate state; the only shared
//! resource is the phonetic coder.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use lore_core::config::{ResolutionConfig, ResolverOptions};
use lore_core::error::LoreResult;
use lore_core::traits::GraphContextProvider;
use lore_core::types::{EntityCandidate, ExistingEntity};

use crate::blocking::BlockingIndex;
use crate::clustering::{cluster_across_segments, EntityCluster};
use crate::phonetic;
use crate::scoring::{score_candidates, ScoredCandidate};
use crate::thresholds::{needs_llm_refinement, resolve_cluster, ClusterResolutionResult, Decision};

/// Aggregate counts for one resolution call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionStats {
    pub total_candidates: usize,
    pub total_clusters: usize,
    pub existing_entities: usize,
    /// Scoring calls made after blocking.
    pub comparisons: usize,
    pub merged: usize,
    pub review: usize,
    pub created: usize,
    /// REVIEW results flagged for external refinement.
    pub needs_refinement: usize,
}

impl ResolutionStats {
    fn record(&mut self, result: &ClusterResolutionResult) {
        match result.decision() {
            Decision::Merge => self.merged += 1,
            Decision::Review => self.review += 1,
            Decision::Create => self.created += 1,
        }
        if result.needs_refinement {
            self.needs_refinement += 1;
        }
    }
}

/// Per-cluster results plus aggregate statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResult {
    pub results: Vec<ClusterResolutionResult>,
    pub stats: ResolutionStats,
}

/// Synchronous resolution engine.
///
/// Phonetic matching only contributes once the shared coder is loaded
/// (see [`phonetic::ensure_loaded`]); [`resolve_entities`] takes care of
/// that before resolving.
#[derive(Debug, Clone, Default)]
pub struct EntityResolver {
    config: ResolutionConfig,
}

impl EntityResolver {
    pub fn new(config: ResolutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    /// Resolve extracted candidates against existing entities.
    pub fn resolve(
        &self,
        candidates: Vec<EntityCandidate>,
        existing: &[ExistingEntity],
        graph_context: Option<&dyn GraphContextProvider>,
    ) -> ResolveResult {
        if !phonetic::is_loaded() {
            debug!("Phonetic coder not loaded, resolving without phonetic matching");
        }

        let total_candidates = candidates.len();
        let clusters = cluster_across_segments(candidates, &self.config.thresholds);
        let index = BlockingIndex::build(existing);

        let mut stats = ResolutionStats {
            total_candidates,
            total_clusters: clusters.len(),
            existing_entities: existing.len(),
            ..Default::default()
        };

        let mut results = Vec::with_capacity(clusters.len());
        for cluster in clusters {
            let ranked = self.resolution_candidates(&cluster, &index, graph_context);
            stats.comparisons += ranked.len();

            let mut result = resolve_cluster(cluster, &ranked, &self.config.thresholds);
            result.needs_refinement = self.config.use_llm_refinement
                && needs_llm_refinement(&result.resolution, &self.config.llm_score_range);

            stats.record(&result);
            results.push(result);
        }

        info!(
            candidates = stats.total_candidates,
            clusters = stats.total_clusters,
            existing = stats.existing_entities,
            comparisons = stats.comparisons,
            merged = stats.merged,
            review = stats.review,
            created = stats.created,
            needs_refinement = stats.needs_refinement,
            "Entity resolution complete"
        );

        ResolveResult { results, stats }
    }

    /// Ranked existing entities for one cluster, without a decision.
    pub fn resolution_candidates(
        &self,
        cluster: &EntityCluster,
        index: &BlockingIndex<'_>,
        graph_context: Option<&dyn GraphContextProvider>,
    ) -> Vec<ScoredCandidate> {
        let blocked = index.filter(cluster);
        debug!(
            name = %cluster.primary_name,
            blocked = blocked.len(),
            indexed = index.len(),
            "Blocking filtered candidates"
        );

        let candidate = cluster.to_candidate();
        score_candidates(&candidate, blocked, &self.config.weights, graph_context)
    }
}

/// Resolve a batch of extracted candidates.
///
/// Loads the phonetic coder if no caller has yet; a load failure is the
/// only error.
#[instrument(
    skip(candidates, existing, options, graph_context),
    fields(document_id = %options.document_id, user_id = %options.user_id)
)]
pub async fn resolve_entities(
    candidates: Vec<EntityCandidate>,
    existing: &[ExistingEntity],
    options: &ResolverOptions,
    graph_context: Option<&dyn GraphContextProvider>,
) -> LoreResult<ResolveResult> {
    phonetic::ensure_loaded().await?;
    let resolver = EntityResolver::new(options.effective_config());
    Ok(resolver.resolve(candidates, existing, graph_context))
}

/// Ranked merge targets for a single cluster, for interactive review.
pub fn get_resolution_candidates(
    cluster: &EntityCluster,
    existing: &[ExistingEntity],
    options: &ResolverOptions,
    graph_context: Option<&dyn GraphContextProvider>,
) -> Vec<ScoredCandidate> {
    let index = BlockingIndex::build(existing);
    EntityResolver::new(options.effective_config())
        .resolution_candidates(cluster, &index, graph_context)
}
