//! lore-resolution - Entity resolution engine for lore.
//!
//! Decides, for every entity proposed by extraction, whether it is an
//! entity already in the graph (MERGE), a possible duplicate that needs a
//! reviewer (REVIEW), or something new (CREATE).
//!
//! # Components
//!
//! - `aliases`: name normalization and alias pattern scoring
//! - `phonetic`: shared Double Metaphone coder
//! - `scoring`: embedding, name, type and graph signals with per-type weights
//! - `clustering`: greedy first-fit merging of candidates within and across segments
//! - `blocking`: token/phonetic/type indices that limit which entities are scored
//! - `thresholds`: MERGE / REVIEW / CREATE decisions with signal veto
//! - `resolver`: the end-to-end pipeline
//!
//! # Example
//!
//! ```ignore
//! use lore_core::{EntityCandidate, EntityType, ExistingEntity, ResolverOptions};
//! use lore_resolution::resolve_entities;
//!
//! let candidates = vec![EntityCandidate::new("Harry Potter", EntityType::Character, "seg-1")];
//! let existing = vec![ExistingEntity::new("e1", "Harry", "character")];
//! let options = ResolverOptions::new("doc-1", "user-1");
//!
//! let resolved = resolve_entities(candidates, &existing, &options, None).await?;
//! for result in &resolved.results {
//!     println!("{} -> {}", result.cluster.primary_name, result.decision());
//! }
//! ```

pub mod aliases;
pub mod blocking;
pub mod clustering;
pub mod phonetic;
pub mod resolver;
pub mod scoring;
pub mod thresholds;

pub use aliases::{compute_alias_pattern_score, get_name_tokens, normalize_name_for_matching};
pub use blocking::{
    blocking_tokens, build_blocking_index, filter_by_blocking, get_candidate_ids, BlockingIndex,
};
pub use clustering::{
    cluster_across_segments, cluster_by_segment, cluster_to_candidate, cluster_within_segment,
    EntityCluster,
};
pub use phonetic::{ensure_loaded, phonetic_match, PhoneticCoder};
pub use resolver::{
    get_resolution_candidates, resolve_entities, EntityResolver, ResolutionStats, ResolveResult,
};
pub use scoring::{score_candidate, score_candidates, ScoredCandidate, SignalBreakdown};
pub use thresholds::{
    batch_resolve, decide, map_to_legacy_decision, needs_llm_refinement, resolve_cluster,
    ClusterResolutionResult, Decision, LegacyDecision, ResolutionResult,
};
