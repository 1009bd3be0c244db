//! Multi-signal similarity scoring.
//!
//! A candidate is compared to an existing entity through four independent
//! signals, each in `[0, 1]`:
//!
//! - **embedding**: cosine similarity of the embeddings
//! - **name**: best alias/phonetic/edit-distance match against the entity's names
//! - **type**: exact or compatible entity types
//! - **graph**: graph-context overlap (currently always 0)
//!
//! Signals are combined with per-type weights. Confidence measures how much
//! the non-zero signals agree with each other.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use lore_core::config::WeightTable;
use lore_core::traits::{GraphContext, GraphContextProvider};
use lore_core::types::{EntityCandidate, EntityType, ExistingEntity};

use crate::aliases::{
    compute_alias_pattern_score, is_substring_match, normalize_name_for_matching, token_overlap,
};
use crate::phonetic::phonetic_match;

/// Largest possible variance of values in `[0, 1]`.
const MAX_SIGNAL_VARIANCE: f32 = 0.25;

/// Type pairs that may refer to the same entity across narrative time.
const COMPATIBLE_TYPES: &[(&str, &str)] = &[("character", "character_state")];
const COMPATIBLE_TYPE_SCORE: f32 = 0.8;

/// The four similarity signals between a candidate and an existing entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalBreakdown {
    pub embedding: f32,
    pub name: f32,
    #[serde(rename = "type")]
    pub type_match: f32,
    pub graph: f32,
}

impl SignalBreakdown {
    fn values(&self) -> [f32; 4] {
        [self.embedding, self.name, self.type_match, self.graph]
    }
}

/// An existing entity scored against a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub entity: ExistingEntity,
    /// Weighted score.
    pub score: f32,
    pub signals: SignalBreakdown,
    /// Agreement among the non-zero signals.
    pub confidence: f32,
}

/// Calculate cosine similarity between two vectors.
///
/// Returns 0.0 if lengths differ, either vector is empty, or either has
/// zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > f32::EPSILON && norm_b > f32::EPSILON {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

/// Embedding signal in `[0, 1]`. Negative similarity counts as none.
pub fn score_embedding_similarity(candidate: &[f32], existing: Option<&[f32]>) -> f32 {
    match existing {
        Some(embedding) => cosine_similarity(candidate, embedding).clamp(0.0, 1.0),
        None => 0.0,
    }
}

/// `1 - edit_distance / max_length`; 1.0 for two empty strings.
pub fn levenshtein_similarity(a: &str, b: &str) -> f32 {
    strsim::normalized_levenshtein(a, b) as f32
}

/// Name signal: the best match of `candidate_name` against the entity's
/// name and aliases.
pub fn score_name_similarity(
    candidate_name: &str,
    existing_name: &str,
    existing_aliases: &[String],
) -> f32 {
    let normalized_candidate = normalize_name_for_matching(candidate_name);
    let mut best: f32 = 0.0;

    let names = std::iter::once(existing_name).chain(existing_aliases.iter().map(String::as_str));
    for name in names {
        let normalized = normalize_name_for_matching(name);
        if normalized_candidate == normalized {
            return 1.0;
        }

        let mut score = compute_alias_pattern_score(candidate_name, name);
        if is_substring_match(candidate_name, name) {
            score = score.max(0.9);
        }
        if phonetic_match(candidate_name, name) {
            score = score.max(0.85);
        }
        score = score.max(token_overlap(candidate_name, name) * 0.8);
        score = score.max(levenshtein_similarity(&normalized_candidate, &normalized) * 0.7);

        best = best.max(score);
    }

    best.min(1.0)
}

/// Type signal: 1.0 for identical types, 0.8 for compatible ones.
pub fn score_type_match(candidate_type: &str, existing_type: &str) -> f32 {
    if candidate_type == existing_type {
        return 1.0;
    }

    let compatible = COMPATIBLE_TYPES.iter().any(|(a, b)| {
        (candidate_type == *a && existing_type == *b)
            || (candidate_type == *b && existing_type == *a)
    });
    if compatible {
        COMPATIBLE_TYPE_SCORE
    } else {
        0.0
    }
}

/// Graph-context signal.
///
/// Always 0.0. Segment and neighbor overlap are not scored until graph
/// edges exist at resolution time; the context is accepted so the call
/// shape stays stable.
pub fn score_graph_context(_candidate: &EntityCandidate, _context: Option<&GraphContext>) -> f32 {
    0.0
}

/// Compute all four signals for one pair.
pub fn compute_signal_breakdown(
    candidate: &EntityCandidate,
    entity: &ExistingEntity,
    context: Option<&GraphContext>,
) -> SignalBreakdown {
    SignalBreakdown {
        embedding: score_embedding_similarity(&candidate.embedding, entity.embedding.as_deref()),
        name: score_name_similarity(&candidate.name, &entity.name, &entity.aliases),
        type_match: score_type_match(candidate.entity_type.as_str(), &entity.entity_type),
        graph: score_graph_context(candidate, context),
    }
}

/// Weighted sum of the signals using the weights of `entity_type`.
pub fn compute_weighted_score(
    signals: &SignalBreakdown,
    entity_type: EntityType,
    weights: &WeightTable,
) -> f32 {
    let w = weights.weights_for(entity_type);
    signals.embedding * w.embedding
        + signals.name * w.name
        + signals.type_match * w.type_match
        + signals.graph * w.graph
}

/// Agreement of the non-zero signals: `1 - variance / 0.25`, clamped.
///
/// Returns 0.0 when every signal is zero.
pub fn compute_confidence(signals: &SignalBreakdown) -> f32 {
    let active: Vec<f32> = signals.values().into_iter().filter(|v| *v != 0.0).collect();
    if active.is_empty() {
        return 0.0;
    }

    let n = active.len() as f32;
    let mean = active.iter().sum::<f32>() / n;
    let variance = active.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    let normalized = (variance / MAX_SIGNAL_VARIANCE).clamp(0.0, 1.0);

    1.0 - normalized
}

/// Score one candidate against one existing entity.
pub fn score_candidate(
    candidate: &EntityCandidate,
    entity: &ExistingEntity,
    weights: &WeightTable,
    context: Option<&GraphContext>,
) -> ScoredCandidate {
    let signals = compute_signal_breakdown(candidate, entity, context);
    ScoredCandidate {
        entity: entity.clone(),
        score: compute_weighted_score(&signals, candidate.entity_type, weights),
        confidence: compute_confidence(&signals),
        signals,
    }
}

/// Score a candidate against many entities, best first.
///
/// Graph context is looked up per entity. A lookup that is still pending
/// is not awaited and counts as no context for this round.
pub fn score_candidates<'a>(
    candidate: &EntityCandidate,
    entities: impl IntoIterator<Item = &'a ExistingEntity>,
    weights: &WeightTable,
    graph_context: Option<&dyn GraphContextProvider>,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = entities
        .into_iter()
        .map(|entity| {
            let context = graph_context.and_then(|provider| {
                let lookup = provider.graph_context(&entity.id);
                if lookup.is_pending() {
                    debug!(entity_id = %entity.id, "Graph context pending, scoring without it");
                }
                lookup.into_ready()
            });
            score_candidate(candidate, entity, weights, context.as_ref())
        })
        .collect();

    scored.sort_by(|a, b| OrderedFloat(b.score).cmp(&OrderedFloat(a.score)));
    scored
}
