//! Data model shared by the resolution engine and its callers.

mod entity;
mod entity_type;

pub use entity::{EntityCandidate, ExistingEntity, Facet, Mention};
pub use entity_type::EntityType;
