//! lore-core - Core library for lore.
//!
//! This crate provides the data model, configuration, error types and
//! collaborator traits shared by the lore entity-resolution engine and the
//! pipeline stages around it.
//!
//! # Example
//!
//! ```ignore
//! use lore_core::{EntityCandidate, EntityType, ResolutionConfig, ResolverOptions};
//!
//! let candidate = EntityCandidate::new("Harry Potter", EntityType::Character, "seg-1");
//! let options = ResolverOptions::new("doc-1", "user-1")
//!     .with_config(ResolutionConfig::from_env());
//! ```

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{
    ResolutionConfig, ResolutionConfigBuilder, ResolverOptions, ScoreRange, SignalWeights,
    Thresholds, WeightTable,
};
pub use error::{ErrorCode, LoreError, LoreResult};
pub use traits::{ContextLookup, GraphContext, GraphContextProvider};
pub use types::{EntityCandidate, EntityType, ExistingEntity, Facet, Mention};
