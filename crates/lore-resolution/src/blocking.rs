//! Candidate blocking over existing entities.
//!
//! Scoring every cluster against every existing entity costs O(m * n).
//! The index is built once per resolution call (O(n * tokens per entity))
//! and narrows each cluster to the entities sharing its type and at least
//! one name token or phonetic code.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;

use lore_core::types::ExistingEntity;

use crate::aliases::get_name_tokens;
use crate::clustering::EntityCluster;
use crate::phonetic::phonetic_code;

/// Token keys of a name: every lowercase word with edge punctuation
/// trimmed, then the significant tokens of the normalized name.
///
/// The raw words keep names that normalize to nothing indexable ("K.",
/// "Q", "Doctor Who") reachable by an identical or title-sharing name.
pub fn blocking_tokens(name: &str) -> Vec<String> {
    let lowered = name.to_lowercase();
    let raw = lowered
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let keys: IndexSet<String> = raw.chain(get_name_tokens(name)).collect();
    keys.into_iter().collect()
}

/// Token, phonetic and type indices over existing entities.
///
/// Entities are referenced by their position in the indexed slice so that
/// filtered results come back in input order.
#[derive(Debug, Default)]
pub struct BlockingIndex<'a> {
    entities: &'a [ExistingEntity],
    /// Name/alias token -> entity positions.
    name_tokens: HashMap<String, HashSet<usize>>,
    /// Phonetic code of a name token -> entity positions.
    phonetic_codes: HashMap<String, HashSet<usize>>,
    /// Entity type -> entity positions.
    by_type: HashMap<String, HashSet<usize>>,
}

impl<'a> BlockingIndex<'a> {
    /// Index every existing entity.
    ///
    /// Tokens come from the name and every alias (see [`blocking_tokens`]);
    /// phonetic codes from the normalized tokens of the name only. Without
    /// a loaded phonetic coder the phonetic index stays empty.
    pub fn build(entities: &'a [ExistingEntity]) -> Self {
        let mut index = Self {
            entities,
            ..Default::default()
        };

        for (position, entity) in entities.iter().enumerate() {
            index
                .by_type
                .entry(entity.entity_type.clone())
                .or_default()
                .insert(position);

            for name in entity.all_names() {
                for token in blocking_tokens(name) {
                    index.name_tokens.entry(token).or_default().insert(position);
                }
            }

            for token in get_name_tokens(&entity.name) {
                if let Some(code) = phonetic_code(&token) {
                    index.phonetic_codes.entry(code).or_default().insert(position);
                }
            }
        }

        index
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the index holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of distinct name tokens indexed.
    pub fn token_count(&self) -> usize {
        self.name_tokens.len()
    }

    /// Sorted positions of the entities that share the cluster's type and a
    /// token (of the primary name or any alias) or a phonetic code (of the
    /// primary name).
    fn candidate_positions(&self, cluster: &EntityCluster) -> Vec<usize> {
        let Some(same_type) = self.by_type.get(cluster.entity_type.as_str()) else {
            return Vec::new();
        };

        let mut matched: HashSet<usize> = HashSet::new();
        for name in cluster.all_names() {
            for token in blocking_tokens(name) {
                if let Some(positions) = self.name_tokens.get(&token) {
                    matched.extend(positions);
                }
            }
        }
        for token in get_name_tokens(&cluster.primary_name) {
            let positions = phonetic_code(&token).and_then(|c| self.phonetic_codes.get(&c));
            if let Some(positions) = positions {
                matched.extend(positions);
            }
        }

        let mut positions: Vec<usize> = matched.intersection(same_type).copied().collect();
        positions.sort_unstable();
        positions
    }

    /// Ids of the entities worth scoring against `cluster`.
    pub fn candidate_ids(&self, cluster: &EntityCluster) -> HashSet<&'a str> {
        self.candidate_positions(cluster)
            .into_iter()
            .map(|p| self.entities[p].id.as_str())
            .collect()
    }

    /// The entities worth scoring against `cluster`, in input order.
    pub fn filter(&self, cluster: &EntityCluster) -> Vec<&'a ExistingEntity> {
        self.candidate_positions(cluster)
            .into_iter()
            .map(|p| &self.entities[p])
            .collect()
    }
}

/// Build the blocking index for one resolution call.
pub fn build_blocking_index(entities: &[ExistingEntity]) -> BlockingIndex<'_> {
    BlockingIndex::build(entities)
}

/// Ids of the existing entities that survive blocking for `cluster`.
pub fn get_candidate_ids<'a>(
    cluster: &EntityCluster,
    index: &BlockingIndex<'a>,
) -> HashSet<&'a str> {
    index.candidate_ids(cluster)
}

/// Existing entities that survive blocking for `cluster`.
pub fn filter_by_blocking<'a>(
    cluster: &EntityCluster,
    index: &BlockingIndex<'a>,
) -> Vec<&'a ExistingEntity> {
    index.filter(cluster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phonetic::ensure_loaded;
    use lore_core::types::{EntityCandidate, EntityType};

    fn cluster(name: &str, entity_type: EntityType) -> EntityCluster {
        EntityCluster::singleton(EntityCandidate::new(name, entity_type, "s1"))
    }

    fn existing() -> Vec<ExistingEntity> {
        vec![
            ExistingEntity::new("e1", "Harry", "character"),
            ExistingEntity::new("e2", "Hogwarts", "location"),
            ExistingEntity::new("e3", "Hermione Granger", "character").with_alias("Mione"),
            ExistingEntity::new("e4", "Harry", "concept"),
            ExistingEntity::new("e5", "Dracula", "character"),
        ]
    }

    #[test]
    fn test_token_match_same_type_only() {
        let entities = existing();
        let index = build_blocking_index(&entities);
        assert_eq!(index.len(), 5);

        let filtered = filter_by_blocking(&cluster("Harry Potter", EntityType::Character), &index);
        let ids: Vec<&str> = filtered.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1"]);
        assert!(filtered.iter().all(|e| e.entity_type == "character"));
    }

    #[test]
    fn test_alias_tokens_are_indexed() {
        let entities = existing();
        let index = build_blocking_index(&entities);

        let ids = get_candidate_ids(&cluster("Mione", EntityType::Character), &index);
        assert_eq!(ids, HashSet::from(["e3"]));
    }

    #[test]
    fn test_cluster_aliases_are_queried() {
        let entities = existing();
        let index = build_blocking_index(&entities);

        let mut c = cluster("The Brightest Witch", EntityType::Character);
        c.absorb(EntityCandidate::new("Hermione", EntityType::Character, "s1"));
        let ids = get_candidate_ids(&c, &index);
        assert_eq!(ids, HashSet::from(["e3"]));
    }

    #[test]
    fn test_blocking_tokens_keep_raw_words() {
        assert_eq!(blocking_tokens("K."), vec!["k"]);
        assert_eq!(blocking_tokens("Doctor Who"), vec!["doctor", "who"]);
        assert_eq!(blocking_tokens("The Boy Who Lived"), vec!["the", "boy", "who", "lived"]);
        assert!(blocking_tokens("  ").is_empty());
    }

    #[test]
    fn test_short_and_title_names_survive_blocking() {
        let entities = vec![
            ExistingEntity::new("e1", "K.", "character"),
            ExistingEntity::new("e2", "Q", "character"),
            ExistingEntity::new("e3", "Doctor Who", "character"),
        ];
        let index = build_blocking_index(&entities);

        let k = get_candidate_ids(&cluster("K.", EntityType::Character), &index);
        assert_eq!(k, HashSet::from(["e1"]));
        let q = get_candidate_ids(&cluster("Q", EntityType::Character), &index);
        assert_eq!(q, HashSet::from(["e2"]));
        let doctor = get_candidate_ids(&cluster("The Doctor", EntityType::Character), &index);
        assert!(doctor.contains("e3"));
    }

    #[test]
    fn test_missing_type_returns_empty() {
        let entities = existing();
        let index = build_blocking_index(&entities);

        assert!(filter_by_blocking(&cluster("Harry", EntityType::Event), &index).is_empty());
    }

    #[tokio::test]
    async fn test_phonetic_codes_bridge_spellings() {
        ensure_loaded().await.unwrap();
        let entities = existing();
        let index = build_blocking_index(&entities);

        let ids = get_candidate_ids(&cluster("Drakula", EntityType::Character), &index);
        assert_eq!(ids, HashSet::from(["e5"]));
    }

    #[test]
    fn test_never_returns_other_types() {
        let entities = existing();
        let index = build_blocking_index(&entities);

        for entity_type in EntityType::all() {
            for name in ["Harry", "Hogwarts", "Hermione Granger", "Dracula"] {
                let c = cluster(name, entity_type);
                for entity in filter_by_blocking(&c, &index) {
                    assert_eq!(entity.entity_type, entity_type.as_str());
                }
            }
        }
    }
}
