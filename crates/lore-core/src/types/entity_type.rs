//! Narrative entity type definitions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

/// Entity types proposed by the upstream extractor.
///
/// Serializes to snake_case. Deserialization is lenient: spelling variants
/// are accepted and anything unrecognized becomes [`EntityType::Other`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(from = "String", into = "&'static str")]
pub enum EntityType {
    /// A person or person-like agent (e.g., "Harry Potter").
    Character,
    /// A place (e.g., "Hogwarts", "the Forbidden Forest").
    Location,
    /// Something that happens (e.g., "the Triwizard Tournament").
    Event,
    /// An abstract idea, object or theme (e.g., "the Elder Wand", "loyalty").
    Concept,
    /// Catch-all for anything the extractor could not classify.
    Other,
    /// A character at a particular point of the narrative.
    CharacterState,
    /// A storyline spanning several segments.
    Arc,
}

impl EntityType {
    /// Parse entity type from string with flexible matching.
    ///
    /// Handles variations in extractor output like "CHARACTER", "person",
    /// "place", "character-state", etc.
    pub fn from_str_flexible(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");

        match normalized.as_str() {
            "character" | "char" | "person" | "people" | "individual" | "human"
            | "protagonist" | "antagonist" | "creature" => Some(Self::Character),

            "location" | "loc" | "place" | "setting" | "city" | "country" | "region"
            | "building" | "realm" => Some(Self::Location),

            "event" | "evt" | "scene" | "battle" | "incident" | "occurrence"
            | "happening" => Some(Self::Event),

            "concept" | "idea" | "theme" | "topic" | "notion" | "belief" | "object"
            | "item" | "artifact" => Some(Self::Concept),

            "character_state" | "characterstate" | "state" | "character_snapshot" => {
                Some(Self::CharacterState)
            }

            "arc" | "storyline" | "story_arc" | "plot" | "subplot" | "plot_arc" => Some(Self::Arc),

            "other" | "misc" | "unknown" | "thing" => Some(Self::Other),

            _ => None,
        }
    }

    /// Get all entity type variants.
    pub fn all() -> Vec<EntityType> {
        Self::iter().collect()
    }

    /// Stable snake_case name, as stored on graph entities.
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_flexible(s).ok_or_else(|| format!("Unknown entity type: {}", s))
    }
}

impl From<String> for EntityType {
    fn from(s: String) -> Self {
        Self::from_str_flexible(&s).unwrap_or(Self::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_from_str_flexible() {
        assert_eq!(EntityType::from_str_flexible("character"), Some(EntityType::Character));
        assert_eq!(EntityType::from_str_flexible("location"), Some(EntityType::Location));
        assert_eq!(EntityType::from_str_flexible("event"), Some(EntityType::Event));
        assert_eq!(EntityType::from_str_flexible("concept"), Some(EntityType::Concept));
        assert_eq!(EntityType::from_str_flexible("arc"), Some(EntityType::Arc));

        // Case and separators
        assert_eq!(EntityType::from_str_flexible("CHARACTER"), Some(EntityType::Character));
        assert_eq!(
            EntityType::from_str_flexible("Character-State"),
            Some(EntityType::CharacterState)
        );
        assert_eq!(
            EntityType::from_str_flexible("character state"),
            Some(EntityType::CharacterState)
        );

        // Variants
        assert_eq!(EntityType::from_str_flexible("person"), Some(EntityType::Character));
        assert_eq!(EntityType::from_str_flexible("place"), Some(EntityType::Location));
        assert_eq!(EntityType::from_str_flexible("storyline"), Some(EntityType::Arc));

        assert_eq!(EntityType::from_str_flexible("spaceship"), None);
        assert_eq!(EntityType::from_str_flexible(""), None);
    }

    #[test]
    fn test_entity_type_display() {
        assert_eq!(EntityType::Character.to_string(), "character");
        assert_eq!(EntityType::CharacterState.to_string(), "character_state");
        assert_eq!(EntityType::CharacterState.as_str(), "character_state");
    }

    #[test]
    fn test_entity_type_all() {
        let all = EntityType::all();
        assert_eq!(all.len(), 7);
        assert!(all.contains(&EntityType::CharacterState));
        assert!(all.contains(&EntityType::Arc));
    }

    #[test]
    fn test_entity_type_serde() {
        let json = serde_json::to_string(&EntityType::CharacterState).unwrap();
        assert_eq!(json, "\"character_state\"");

        let parsed: EntityType = serde_json::from_str("\"character_state\"").unwrap();
        assert_eq!(parsed, EntityType::CharacterState);

        // Unknown extractor output degrades to Other
        let parsed: EntityType = serde_json::from_str("\"spaceship\"").unwrap();
        assert_eq!(parsed, EntityType::Other);
    }
}
