//! Merge decisions from ranked scores.
//!
//! The best-scored existing entity decides between three outcomes:
//!
//! 1. below `review` (or no candidate at all): CREATE
//! 2. strong aggregate score but a disagreeing name or type signal: CREATE (veto)
//! 3. at or above `auto_merge`: MERGE
//! 4. moderate score with high signal agreement: MERGE (promotion)
//! 5. anything else: REVIEW

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use tracing::debug;

use lore_core::config::{ScoreRange, Thresholds};
use lore_core::types::Facet;

use crate::clustering::EntityCluster;
use crate::scoring::{ScoredCandidate, SignalBreakdown};

/// Aggregate score from which the signal veto is evaluated.
pub const VETO_MIN_SCORE: f32 = 0.7;
/// Confidence above which a moderate score is promoted to MERGE.
pub const PROMOTION_CONFIDENCE: f32 = 0.7;
/// Score above which a confident result is promoted to MERGE.
pub const PROMOTION_SCORE: f32 = 0.65;
/// REVIEW results below this confidence are flagged for refinement.
pub const REFINEMENT_CONFIDENCE: f32 = 0.6;

/// Outcome of resolving one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Same entity as the target; merge into it.
    Merge,
    /// Possibly the same entity; a reviewer should decide.
    Review,
    /// A new entity.
    Create,
}

/// Decision vocabulary of the older extraction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LegacyDecision {
    Merge,
    Update,
    AddFacet,
    New,
}

/// Decision for one candidate (or cluster) against its best match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub decision: Decision,
    /// Existing entity to merge into or review against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<SignalBreakdown>,
    pub confidence: f32,
    pub reason: String,
}

impl ResolutionResult {
    fn create(reason: impl Into<String>, best: Option<&ScoredCandidate>) -> Self {
        Self {
            decision: Decision::Create,
            target_id: None,
            score: best.map(|b| b.score).unwrap_or(0.0),
            signals: best.map(|b| b.signals),
            confidence: best.map(|b| b.confidence).unwrap_or(0.0),
            reason: reason.into(),
        }
    }

    fn against(decision: Decision, best: &ScoredCandidate, reason: impl Into<String>) -> Self {
        Self {
            decision,
            target_id: Some(best.entity.id.clone()),
            score: best.score,
            signals: Some(best.signals),
            confidence: best.confidence,
            reason: reason.into(),
        }
    }
}

/// Resolution of one cluster, with the facets to attach to the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResolutionResult {
    #[serde(flatten)]
    pub resolution: ResolutionResult,
    pub cluster: EntityCluster,
    /// Merged cluster facets; present for MERGE and REVIEW.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_facets: Option<Vec<Facet>>,
    /// Whether an external decision-maker should arbitrate this result.
    #[serde(default)]
    pub needs_refinement: bool,
}

impl ClusterResolutionResult {
    pub fn decision(&self) -> Decision {
        self.resolution.decision
    }
}

/// Name of the signal that vetoes a strong aggregate score, if any.
fn veto_signal(signals: &SignalBreakdown, thresholds: &Thresholds) -> Option<&'static str> {
    if signals.name < thresholds.veto {
        Some("name")
    } else if signals.type_match > 0.0 && signals.type_match < thresholds.veto {
        Some("type")
    } else {
        None
    }
}

/// Decide against the best-scored candidate.
pub fn decide(best: Option<&ScoredCandidate>, thresholds: &Thresholds) -> ResolutionResult {
    let Some(best) = best else {
        return ResolutionResult::create("no candidates above review threshold", None);
    };

    if best.score < thresholds.review {
        return ResolutionResult::create("no candidates above review threshold", Some(best));
    }

    if best.score >= VETO_MIN_SCORE {
        if let Some(signal) = veto_signal(&best.signals, thresholds) {
            return ResolutionResult::create(
                format!(
                    "{} signal vetoed merge with {} (score {:.2})",
                    signal, best.entity.name, best.score
                ),
                Some(best),
            );
        }
    }

    if best.score >= thresholds.auto_merge {
        return ResolutionResult::against(
            Decision::Merge,
            best,
            format!("score {:.2} above auto-merge threshold", best.score),
        );
    }

    if best.confidence > PROMOTION_CONFIDENCE && best.score > PROMOTION_SCORE {
        return ResolutionResult::against(
            Decision::Merge,
            best,
            "moderate score promoted by high confidence",
        );
    }

    ResolutionResult::against(
        Decision::Review,
        best,
        format!(
            "score {:.2} between review and auto-merge thresholds",
            best.score
        ),
    )
}

/// Resolve a cluster against its ranked candidates (best first).
pub fn resolve_cluster(
    cluster: EntityCluster,
    ranked: &[ScoredCandidate],
    thresholds: &Thresholds,
) -> ClusterResolutionResult {
    let resolution = decide(ranked.first(), thresholds);
    debug!(
        name = %cluster.primary_name,
        decision = %resolution.decision,
        score = resolution.score,
        target = ?resolution.target_id,
        "Resolved cluster"
    );

    let new_facets = match resolution.decision {
        Decision::Merge | Decision::Review => Some(cluster.merged_facets.clone()),
        Decision::Create => None,
    };

    ClusterResolutionResult {
        resolution,
        cluster,
        new_facets,
        needs_refinement: false,
    }
}

/// Resolve many clusters, each paired with its ranked candidates.
pub fn batch_resolve(
    items: impl IntoIterator<Item = (EntityCluster, Vec<ScoredCandidate>)>,
    thresholds: &Thresholds,
) -> Vec<ClusterResolutionResult> {
    items
        .into_iter()
        .map(|(cluster, ranked)| resolve_cluster(cluster, &ranked, thresholds))
        .collect()
}

/// Whether a result is ambiguous enough for an external decision-maker.
///
/// Only REVIEW results with a score inside `range` and low confidence
/// qualify. This is a recommendation; nothing is invoked.
pub fn needs_llm_refinement(result: &ResolutionResult, range: &ScoreRange) -> bool {
    result.decision == Decision::Review
        && range.contains(result.score)
        && result.confidence < REFINEMENT_CONFIDENCE
}

/// Map to the older pipeline's vocabulary.
///
/// REVIEW maps to NEW until a review queue consumes it.
pub fn map_to_legacy_decision(result: &ClusterResolutionResult) -> LegacyDecision {
    match result.resolution.decision {
        Decision::Merge => match &result.new_facets {
            Some(facets) if !facets.is_empty() => LegacyDecision::AddFacet,
            _ => LegacyDecision::Merge,
        },
        Decision::Review | Decision::Create => LegacyDecision::New,
    }
}
