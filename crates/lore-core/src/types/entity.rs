//! Candidate and graph-resident entity records.

use serde::{Deserialize, Serialize};

use super::entity_type::EntityType;

/// A free-form attribute attached to an entity (e.g. `appearance: "tall"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    /// Facet kind, e.g. "appearance", "role", "trait".
    #[serde(rename = "type")]
    pub facet_type: String,
    /// Facet text.
    pub content: String,
}

impl Facet {
    /// Create a new facet.
    pub fn new(facet_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            facet_type: facet_type.into(),
            content: content.into(),
        }
    }

    /// Deduplication key: `type:content`.
    pub fn dedup_key(&self) -> String {
        format!("{}:{}", self.facet_type, self.content)
    }
}

/// A textual mention of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    /// The mention text as it appears in the source.
    pub text: String,
    /// Segment the mention was found in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
}

impl Mention {
    /// Create a mention without a segment.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            segment_id: None,
        }
    }

    /// Attach a segment id.
    pub fn in_segment(mut self, segment_id: impl Into<String>) -> Self {
        self.segment_id = Some(segment_id.into());
        self
    }
}

/// One proposed entity from extraction, scoped to a segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCandidate {
    /// Proposed name.
    pub name: String,
    /// Proposed type.
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Embedding of the candidate; may be empty.
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// Attributes extracted alongside the name.
    #[serde(default)]
    pub facets: Vec<Facet>,
    /// Mentions backing this candidate.
    #[serde(default)]
    pub mentions: Vec<Mention>,
    /// Segment the candidate was extracted from.
    pub segment_id: String,
    /// Position hint within the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_order: Option<u32>,
}

impl EntityCandidate {
    /// Create a candidate with no embedding, facets or mentions.
    pub fn new(
        name: impl Into<String>,
        entity_type: EntityType,
        segment_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entity_type,
            embedding: Vec::new(),
            facets: Vec::new(),
            mentions: Vec::new(),
            segment_id: segment_id.into(),
            document_order: None,
        }
    }

    /// Set the embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    /// Add a facet.
    pub fn with_facet(mut self, facet: Facet) -> Self {
        self.facets.push(facet);
        self
    }

    /// Add a mention.
    pub fn with_mention(mut self, mention: Mention) -> Self {
        self.mentions.push(mention);
        self
    }

    /// Set the document order hint.
    pub fn with_document_order(mut self, order: u32) -> Self {
        self.document_order = Some(order);
        self
    }
}

/// A graph-resident entity that candidates are resolved against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingEntity {
    /// Stable identifier owned by the graph store.
    pub id: String,
    /// Canonical name.
    pub name: String,
    /// Type label as stored in the graph.
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub facets: Vec<Facet>,
    #[serde(default)]
    pub mention_count: u32,
}

impl ExistingEntity {
    /// Create an existing entity with no embedding or aliases.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entity_type: entity_type.into(),
            embedding: None,
            aliases: Vec::new(),
            facets: Vec::new(),
            mention_count: 0,
        }
    }

    /// Set the embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Add an alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// The canonical name followed by every alias.
    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_from_extractor_json() {
        let json = r#"{
            "name": "Harry Potter",
            "type": "character",
            "embedding": [0.1, 0.2],
            "facets": [{"type": "role", "content": "student"}],
            "mentions": [{"text": "Harry", "segmentId": "s1"}],
            "segmentId": "s1",
            "documentOrder": 3
        }"#;

        let candidate: EntityCandidate = serde_json::from_str(json).unwrap();
        assert_eq!(candidate.name, "Harry Potter");
        assert_eq!(candidate.entity_type, EntityType::Character);
        assert_eq!(candidate.facets[0].dedup_key(), "role:student");
        assert_eq!(candidate.mentions[0].segment_id.as_deref(), Some("s1"));
        assert_eq!(candidate.document_order, Some(3));
    }

    #[test]
    fn test_existing_entity_defaults() {
        let json = r#"{"id": "e1", "name": "Dracula", "type": "character"}"#;
        let entity: ExistingEntity = serde_json::from_str(json).unwrap();
        assert!(entity.embedding.is_none());
        assert!(entity.aliases.is_empty());
        assert_eq!(entity.mention_count, 0);
    }

    #[test]
    fn test_all_names() {
        let entity = ExistingEntity::new("e1", "Harry Potter", "character")
            .with_alias("Harry")
            .with_alias("The Boy Who Lived");
        let names: Vec<&str> = entity.all_names().collect();
        assert_eq!(names, vec!["Harry Potter", "Harry", "The Boy Who Lived"]);
    }
}
