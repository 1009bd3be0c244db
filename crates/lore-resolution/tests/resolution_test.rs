//! End-to-end resolution scenarios.

use std::collections::HashMap;

use lore_core::config::{ResolutionConfig, SignalWeights, Thresholds, WeightTable};
use lore_core::traits::{ContextLookup, GraphContext, GraphContextProvider};
use lore_core::types::{EntityCandidate, EntityType, ExistingEntity, Mention};
use lore_core::ResolverOptions;
use lore_resolution::{
    build_blocking_index, cluster_across_segments, cluster_within_segment, decide,
    filter_by_blocking, map_to_legacy_decision, resolve_entities, score_candidate, Decision,
    EntityCluster, EntityResolver, LegacyDecision,
};

fn options() -> ResolverOptions {
    ResolverOptions::new("doc-1", "user-1")
}

#[tokio::test]
async fn test_alias_with_shared_embedding_merges() {
    let embedding = vec![0.12, 0.48, 0.33, 0.71];
    let candidates = vec![
        EntityCandidate::new("Harry Potter", EntityType::Character, "s1")
            .with_embedding(embedding.clone()),
    ];
    let existing = vec![ExistingEntity::new("e1", "Harry", "character").with_embedding(embedding)];

    let resolved = resolve_entities(candidates, &existing, &options(), None).await.unwrap();
    let result = &resolved.results[0];

    let signals = result.resolution.signals.unwrap();
    assert!((signals.embedding - 1.0).abs() < 1e-4);
    assert!((signals.name - 0.9).abs() < 1e-6);
    assert_eq!(signals.type_match, 1.0);
    assert_eq!(signals.graph, 0.0);
    assert!((result.resolution.score - 0.87).abs() < 1e-4);
    assert_eq!(result.decision(), Decision::Merge);
    assert_eq!(result.resolution.target_id.as_deref(), Some("e1"));
    assert_eq!(map_to_legacy_decision(result), LegacyDecision::Merge);
}

#[tokio::test]
async fn test_phonetic_alias_without_embeddings_creates() {
    let candidates = vec![EntityCandidate::new("Drakula", EntityType::Character, "s1")];
    let existing = vec![ExistingEntity::new("e2", "Dracula", "character")];

    let resolved = resolve_entities(candidates, &existing, &options(), None).await.unwrap();
    let result = &resolved.results[0];

    // Reached through the phonetic index; no token is shared
    assert_eq!(resolved.stats.comparisons, 1);
    let signals = result.resolution.signals.unwrap();
    assert_eq!(signals.embedding, 0.0);
    assert!((signals.name - 0.85).abs() < 1e-6);
    assert!((result.resolution.score - 0.355).abs() < 1e-4);
    assert_eq!(result.decision(), Decision::Create);
    assert!(result.resolution.target_id.is_none());
    assert_eq!(resolved.stats.created, 1);
}

#[tokio::test]
async fn test_single_letter_name_reaches_identical_entity() {
    let embedding = vec![0.3, 0.1, 0.9];
    let candidates = vec![
        EntityCandidate::new("K.", EntityType::Character, "s1").with_embedding(embedding.clone()),
    ];
    let existing = vec![ExistingEntity::new("e1", "K.", "character").with_embedding(embedding)];

    let resolved = resolve_entities(candidates, &existing, &options(), None).await.unwrap();
    let result = &resolved.results[0];

    assert_eq!(resolved.stats.comparisons, 1);
    assert_eq!(result.resolution.signals.unwrap().name, 1.0);
    assert_eq!(result.decision(), Decision::Merge);
    assert_eq!(result.resolution.target_id.as_deref(), Some("e1"));
}

#[test]
fn test_embedding_dominated_match_is_vetoed() {
    let weights = WeightTable::default()
        .with_type(EntityType::Character, SignalWeights::new(0.8, 0.1, 0.1, 0.0));
    let embedding = vec![0.5, 0.5, 0.5];
    let candidate = EntityCandidate::new("Hermione", EntityType::Character, "s1")
        .with_embedding(embedding.clone());
    let entity = ExistingEntity::new("e3", "Voldemort", "character").with_embedding(embedding);

    let scored = score_candidate(&candidate, &entity, &weights, None);
    assert!(scored.score >= 0.85);
    assert!(scored.signals.name < 0.3);

    let result = decide(Some(&scored), &Thresholds::default());
    assert_eq!(result.decision, Decision::Create);
    assert!(result.reason.contains("vetoed"));
}

#[test]
fn test_clusters_partition_input() {
    let harry = vec![1.0, 0.0, 0.0];
    let hogwarts = vec![0.0, 1.0, 0.0];
    let names = [
        ("Harry Potter", EntityType::Character, "s1", harry.clone()),
        ("Harry Potter", EntityType::Character, "s1", harry.clone()),
        ("Hogwarts", EntityType::Location, "s1", hogwarts.clone()),
        ("Ron Weasley", EntityType::Character, "s2", vec![0.0, 0.0, 1.0]),
        ("Harry Potter", EntityType::Character, "s2", harry),
        ("Hogwarts", EntityType::Location, "s3", hogwarts),
        ("Quidditch", EntityType::Concept, "s3", vec![0.5, 0.5, 0.7]),
    ];
    let candidates: Vec<EntityCandidate> = names
        .iter()
        .enumerate()
        .map(|(i, (name, entity_type, segment, embedding))| {
            EntityCandidate::new(*name, *entity_type, *segment)
                .with_embedding(embedding.clone())
                .with_mention(Mention::new(format!("m{}", i)))
        })
        .collect();

    let clusters = cluster_across_segments(candidates, &Thresholds::default());

    let mut seen: Vec<String> = clusters
        .iter()
        .flat_map(|c| c.members.iter())
        .flat_map(|m| m.mentions.iter().map(|mention| mention.text.clone()))
        .collect();
    seen.sort();
    let expected: Vec<String> = (0..names.len()).map(|i| format!("m{}", i)).collect();
    assert_eq!(seen, expected);

    for cluster in &clusters {
        assert!(cluster.members.iter().all(|m| m.entity_type == cluster.entity_type));
    }

    // Harry Potter (s1, s2), Hogwarts (s1, s3), Ron Weasley, Quidditch
    assert_eq!(clusters.len(), 4);
    assert_eq!(clusters[0].members.len(), 3);
    assert_eq!(clusters[0].segment_ids, vec!["s1", "s2"]);
}

#[test]
fn test_within_segment_never_mixes_types() {
    let candidates: Vec<EntityCandidate> = EntityType::all()
        .into_iter()
        .flat_map(|t| {
            vec![
                EntityCandidate::new("Phoenix", t, "s1").with_embedding(vec![1.0, 0.0]),
                EntityCandidate::new("The Phoenix", t, "s1").with_embedding(vec![1.0, 0.0]),
            ]
        })
        .collect();

    let clusters = cluster_within_segment(candidates, &Thresholds::default());
    assert_eq!(clusters.len(), EntityType::all().len());
    for cluster in &clusters {
        assert_eq!(cluster.members.len(), 2);
        assert!(cluster.members.iter().all(|m| m.entity_type == cluster.entity_type));
    }
}

#[tokio::test]
async fn test_blocking_respects_type() {
    lore_resolution::ensure_loaded().await.unwrap();
    let existing = vec![
        ExistingEntity::new("e1", "Phoenix", "character"),
        ExistingEntity::new("e2", "Phoenix", "concept"),
        ExistingEntity::new("e3", "Order of the Phoenix", "concept"),
        ExistingEntity::new("e4", "Phoenix", "location"),
    ];
    let index = build_blocking_index(&existing);

    for entity_type in EntityType::all() {
        let cluster = EntityCluster::singleton(EntityCandidate::new("Phoenix", entity_type, "s1"));
        for entity in filter_by_blocking(&cluster, &index) {
            assert_eq!(entity.entity_type, entity_type.as_str());
        }
    }

    let concept =
        EntityCluster::singleton(EntityCandidate::new("Phoenix", EntityType::Concept, "s1"));
    let ids: Vec<&str> = filter_by_blocking(&concept, &index)
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(ids, vec!["e2", "e3"]);
}

#[test]
fn test_pending_graph_context_is_not_awaited() {
    let provider = |_: &str| ContextLookup::Pending(Box::pin(async { None::<GraphContext> }));
    let provider: &dyn GraphContextProvider = &provider;

    let candidates = vec![EntityCandidate::new("Harry", EntityType::Character, "s1")];
    let existing = vec![ExistingEntity::new("e1", "Harry", "character")];

    let resolver = EntityResolver::new(ResolutionConfig::default());
    let resolved = resolver.resolve(candidates, &existing, Some(provider));
    let signals = resolved.results[0].resolution.signals.unwrap();
    assert_eq!(signals.graph, 0.0);
    assert_eq!(signals.name, 1.0);
}

#[test]
fn test_ready_graph_context_keeps_graph_signal_zero() {
    let mut contexts: HashMap<String, GraphContext> = HashMap::new();
    contexts.insert(
        "e1".to_string(),
        GraphContext {
            segment_ids: vec!["s1".to_string()],
            neighbor_entity_ids: vec!["e9".to_string()],
        },
    );

    let candidates = vec![EntityCandidate::new("Harry", EntityType::Character, "s1")];
    let existing = vec![ExistingEntity::new("e1", "Harry", "character")];

    let resolved = EntityResolver::default().resolve(candidates, &existing, Some(&contexts));
    assert_eq!(resolved.results[0].resolution.signals.unwrap().graph, 0.0);
}

#[tokio::test]
async fn test_result_json_shape() {
    let candidates = vec![EntityCandidate::new("Harry", EntityType::Character, "s1")];
    let resolved = resolve_entities(candidates, &[], &options(), None).await.unwrap();

    let json = serde_json::to_value(&resolved).unwrap();
    assert_eq!(json["stats"]["totalCandidates"], 1);
    assert_eq!(json["stats"]["created"], 1);
    assert_eq!(json["results"][0]["decision"], "CREATE");
    assert_eq!(json["results"][0]["cluster"]["type"], "character");
    assert!(json["results"][0].get("targetId").is_none());
}
