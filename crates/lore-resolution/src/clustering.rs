//! Agglomerative clustering of extracted candidates.
//!
//! Candidates are merged greedily: each one joins the FIRST earlier cluster
//! of the same type whose average similarity exceeds the threshold, or
//! starts a new cluster. The result depends on input order and is not a
//! globally optimal partition, but it is deterministic and reproducible.
//! Keep the first-fit traversal; switching to best-fit changes the clusters
//! produced for ambiguous inputs.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use lore_core::config::Thresholds;
use lore_core::types::{EntityCandidate, EntityType, Facet, Mention};

use crate::scoring::{cosine_similarity, score_name_similarity};

const EMBEDDING_WEIGHT: f32 = 0.4;
const NAME_WEIGHT: f32 = 0.6;

/// A provisional merge of candidates believed to denote one entity.
///
/// Every member shares the cluster's type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCluster {
    /// Longest member name; the first member at that length wins ties.
    pub primary_name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Distinct member names, in member order.
    pub aliases: Vec<String>,
    pub members: Vec<EntityCandidate>,
    /// Componentwise mean of member embeddings.
    pub merged_embedding: Vec<f32>,
    /// Member facets deduplicated by `type:content`, first occurrence wins.
    pub merged_facets: Vec<Facet>,
    pub mentions: Vec<Mention>,
    pub segment_ids: Vec<String>,
}

impl EntityCluster {
    /// A cluster holding a single candidate.
    pub fn singleton(candidate: EntityCandidate) -> Self {
        let mut cluster = Self {
            primary_name: String::new(),
            entity_type: candidate.entity_type,
            aliases: Vec::new(),
            members: vec![candidate],
            merged_embedding: Vec::new(),
            merged_facets: Vec::new(),
            mentions: Vec::new(),
            segment_ids: Vec::new(),
        };
        cluster.finalize();
        cluster
    }

    /// Add a candidate of the same type.
    pub fn absorb(&mut self, candidate: EntityCandidate) {
        debug_assert_eq!(candidate.entity_type, self.entity_type);
        self.members.push(candidate);
        self.finalize();
    }

    /// Add all members of another cluster of the same type.
    pub fn absorb_cluster(&mut self, other: EntityCluster) {
        debug_assert_eq!(other.entity_type, self.entity_type);
        self.members.extend(other.members);
        self.finalize();
    }

    /// Primary name followed by every other alias.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_name.as_str()).chain(
            self.aliases
                .iter()
                .map(String::as_str)
                .filter(move |alias| *alias != self.primary_name),
        )
    }

    /// Whether this cluster has a member from any segment of `other`.
    pub fn shares_segment(&self, other: &EntityCluster) -> bool {
        other.segment_ids.iter().any(|s| self.segment_ids.contains(s))
    }

    /// Recompute every derived field from the members.
    fn finalize(&mut self) {
        let mut primary = "";
        for member in &self.members {
            if member.name.chars().count() > primary.chars().count() {
                primary = &member.name;
            }
        }
        self.primary_name = primary.to_string();

        let aliases: IndexSet<&str> = self.members.iter().map(|m| m.name.as_str()).collect();
        self.aliases = aliases.into_iter().map(str::to_string).collect();

        self.merged_embedding = mean_embedding(&self.members);

        let mut facets: IndexMap<String, Facet> = IndexMap::new();
        for facet in self.members.iter().flat_map(|m| &m.facets) {
            facets.entry(facet.dedup_key()).or_insert_with(|| facet.clone());
        }
        self.merged_facets = facets.into_values().collect();

        self.mentions = self
            .members
            .iter()
            .flat_map(|m| m.mentions.iter().cloned())
            .collect();

        let segments: IndexSet<&str> = self.members.iter().map(|m| m.segment_id.as_str()).collect();
        self.segment_ids = segments.into_iter().map(str::to_string).collect();
    }

    /// Project the cluster onto a single candidate for scoring.
    pub fn to_candidate(&self) -> EntityCandidate {
        EntityCandidate {
            name: self.primary_name.clone(),
            entity_type: self.entity_type,
            embedding: self.merged_embedding.clone(),
            facets: self.merged_facets.clone(),
            mentions: self.mentions.clone(),
            segment_id: self.segment_ids.first().cloned().unwrap_or_default(),
            document_order: self.members.iter().filter_map(|m| m.document_order).min(),
        }
    }
}

/// Componentwise mean of the member embeddings.
///
/// The dimension is taken from the first non-empty embedding; members with
/// a different length are left out.
fn mean_embedding(members: &[EntityCandidate]) -> Vec<f32> {
    let Some(dims) = members
        .iter()
        .map(|m| m.embedding.len())
        .find(|len| *len > 0)
    else {
        return Vec::new();
    };

    let mut sum = vec![0.0f32; dims];
    let mut count = 0usize;
    for member in members.iter().filter(|m| m.embedding.len() == dims) {
        for (acc, value) in sum.iter_mut().zip(&member.embedding) {
            *acc += value;
        }
        count += 1;
    }

    sum.iter().map(|v| v / count as f32).collect()
}

/// Similarity of two candidates: `0.4 * cosine + 0.6 * name`.
pub fn candidate_similarity(a: &EntityCandidate, b: &EntityCandidate) -> f32 {
    EMBEDDING_WEIGHT * cosine_similarity(&a.embedding, &b.embedding)
        + NAME_WEIGHT * score_name_similarity(&a.name, &b.name, &[])
}

/// Mean similarity of a candidate to every member of a cluster.
fn average_similarity(candidate: &EntityCandidate, cluster: &EntityCluster) -> f32 {
    let total: f32 = cluster
        .members
        .iter()
        .map(|member| candidate_similarity(candidate, member))
        .sum();
    total / cluster.members.len() as f32
}

/// Name similarity between clusters, using every name of `a` against the
/// primary name and aliases of `b`.
fn cluster_name_similarity(a: &EntityCluster, b: &EntityCluster) -> f32 {
    a.all_names()
        .map(|name| score_name_similarity(name, &b.primary_name, &b.aliases))
        .fold(0.0, f32::max)
}

/// Similarity of two clusters from merged embeddings and names.
pub fn cluster_similarity(a: &EntityCluster, b: &EntityCluster) -> f32 {
    EMBEDDING_WEIGHT * cosine_similarity(&a.merged_embedding, &b.merged_embedding)
        + NAME_WEIGHT * cluster_name_similarity(a, b)
}

/// Greedy first-fit clustering in input order.
///
/// A candidate joins the first same-type cluster whose average similarity
/// to it is strictly above `thresholds.within_segment`.
pub fn cluster_within_segment(
    entities: impl IntoIterator<Item = EntityCandidate>,
    thresholds: &Thresholds,
) -> Vec<EntityCluster> {
    let mut clusters: Vec<EntityCluster> = Vec::new();

    for candidate in entities {
        let target = clusters.iter().position(|cluster| {
            cluster.entity_type == candidate.entity_type
                && average_similarity(&candidate, cluster) > thresholds.within_segment
        });

        match target {
            Some(index) => clusters[index].absorb(candidate),
            None => clusters.push(EntityCluster::singleton(candidate)),
        }
    }

    clusters
}

/// Cluster each segment independently. Segments keep their order of first
/// appearance.
pub fn cluster_by_segment(
    entities: impl IntoIterator<Item = EntityCandidate>,
    thresholds: &Thresholds,
) -> Vec<EntityCluster> {
    let mut by_segment: IndexMap<String, Vec<EntityCandidate>> = IndexMap::new();
    for candidate in entities {
        by_segment
            .entry(candidate.segment_id.clone())
            .or_default()
            .push(candidate);
    }

    by_segment
        .into_values()
        .flat_map(|segment| cluster_within_segment(segment, thresholds))
        .collect()
}

/// Cluster within segments, then merge clusters across segments.
///
/// The cross-segment pass uses the stricter `within_segment + 0.1`
/// threshold, is first-fit in segment order, and never merges two clusters
/// that already have members from a common segment (those were kept apart
/// by the within-segment pass).
pub fn cluster_across_segments(
    entities: impl IntoIterator<Item = EntityCandidate>,
    thresholds: &Thresholds,
) -> Vec<EntityCluster> {
    let per_segment = cluster_by_segment(entities, thresholds);
    let threshold = thresholds.cross_segment();
    let segment_clusters = per_segment.len();

    let mut merged: Vec<EntityCluster> = Vec::with_capacity(segment_clusters);
    for cluster in per_segment {
        let target = merged.iter().position(|existing| {
            existing.entity_type == cluster.entity_type
                && !existing.shares_segment(&cluster)
                && cluster_similarity(existing, &cluster) > threshold
        });

        match target {
            Some(index) => merged[index].absorb_cluster(cluster),
            None => merged.push(cluster),
        }
    }

    debug!(
        segment_clusters,
        clusters = merged.len(),
        "Merged clusters across segments"
    );
    merged
}

/// Free-function form of [`EntityCluster::to_candidate`].
pub fn cluster_to_candidate(cluster: &EntityCluster) -> EntityCandidate {
    cluster.to_candidate()
}
