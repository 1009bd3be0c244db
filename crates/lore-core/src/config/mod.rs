//! Configuration system for lore resolution.
//!
//! All values have working defaults. Callers may override any subset through
//! a config file, environment variables, the builder, or per-call
//! [`ResolverOptions`]. The engine trusts what it is given; [`ResolutionConfig::validate`]
//! is available to hosts that want to reject bad configuration up front.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ErrorCode, LoreError, LoreResult};
use crate::types::EntityType;

/// Weights applied to the four similarity signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub embedding: f32,
    pub name: f32,
    #[serde(rename = "type")]
    pub type_match: f32,
    pub graph: f32,
}

impl SignalWeights {
    /// Create a weight tuple.
    pub const fn new(embedding: f32, name: f32, type_match: f32, graph: f32) -> Self {
        Self {
            embedding,
            name,
            type_match,
            graph,
        }
    }
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self::new(0.5, 0.3, 0.1, 0.1)
    }
}

/// Per-type signal weights with a fallback tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeightTable {
    /// Used for any type without its own entry.
    pub default: SignalWeights,
    /// Type-specific weights.
    pub by_type: HashMap<EntityType, SignalWeights>,
}

impl Default for WeightTable {
    fn default() -> Self {
        let by_type = HashMap::from([
            (EntityType::Character, SignalWeights::new(0.5, 0.3, 0.1, 0.1)),
            (EntityType::CharacterState, SignalWeights::new(0.5, 0.3, 0.1, 0.1)),
            (EntityType::Location, SignalWeights::new(0.45, 0.35, 0.1, 0.1)),
            (EntityType::Event, SignalWeights::new(0.55, 0.25, 0.1, 0.1)),
            (EntityType::Concept, SignalWeights::new(0.6, 0.15, 0.1, 0.15)),
            (EntityType::Arc, SignalWeights::new(0.6, 0.2, 0.1, 0.1)),
        ]);

        Self {
            default: SignalWeights::default(),
            by_type,
        }
    }
}

impl WeightTable {
    /// Weights for an entity type, falling back to the default tuple.
    pub fn weights_for(&self, entity_type: EntityType) -> SignalWeights {
        self.by_type
            .get(&entity_type)
            .copied()
            .unwrap_or(self.default)
    }

    /// Override the weights of one type.
    pub fn with_type(mut self, entity_type: EntityType, weights: SignalWeights) -> Self {
        self.by_type.insert(entity_type, weights);
        self
    }
}

/// Decision thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Thresholds {
    /// Scores at or above this merge automatically.
    pub auto_merge: f32,
    /// Scores below this create a new entity.
    pub review: f32,
    /// Average similarity a candidate must exceed to join a cluster in its segment.
    pub within_segment: f32,
    /// Signal floor below which a strong aggregate score is vetoed.
    pub veto: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            auto_merge: 0.85,
            review: 0.5,
            within_segment: 0.75,
            veto: 0.3,
        }
    }
}

impl Thresholds {
    /// Threshold for merging clusters across segments.
    pub fn cross_segment(&self) -> f32 {
        self.within_segment + 0.1
    }
}

/// Inclusive score range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f32,
    pub max: f32,
}

impl ScoreRange {
    /// Whether `score` lies within the range, bounds included.
    pub fn contains(&self, score: f32) -> bool {
        score >= self.min && score <= self.max
    }
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self { min: 0.5, max: 0.85 }
    }
}

/// Main resolution configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolutionConfig {
    /// Signal weights per entity type.
    pub weights: WeightTable,
    /// Decision thresholds.
    pub thresholds: Thresholds,
    /// Whether ambiguous reviews are flagged for external refinement.
    #[serde(alias = "useLLMRefinement")]
    pub use_llm_refinement: bool,
    /// Score band in which low-confidence reviews are flagged.
    pub llm_score_range: ScoreRange,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            weights: WeightTable::default(),
            thresholds: Thresholds::default(),
            use_llm_refinement: true,
            llm_score_range: ScoreRange::default(),
        }
    }
}

impl ResolutionConfig {
    /// Default config file location: `~/.lore/resolution.toml`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".lore"))
            .unwrap_or_else(|| PathBuf::from(".lore"))
            .join("resolution.toml")
    }

    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> LoreResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| LoreError::Configuration(e.to_string()))
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| LoreError::Configuration(e.to_string()))
            }
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| LoreError::Configuration(e.to_string()))
            }
            _ => Err(LoreError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Overlay `LORE_*` environment variables onto this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_f32("LORE_AUTO_MERGE_THRESHOLD") {
            self.thresholds.auto_merge = v;
        }
        if let Some(v) = env_f32("LORE_REVIEW_THRESHOLD") {
            self.thresholds.review = v;
        }
        if let Some(v) = env_f32("LORE_WITHIN_SEGMENT_THRESHOLD") {
            self.thresholds.within_segment = v;
        }
        if let Some(v) = env_f32("LORE_VETO_THRESHOLD") {
            self.thresholds.veto = v;
        }
        if let Ok(flag) = std::env::var("LORE_USE_LLM_REFINEMENT") {
            self.use_llm_refinement = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        self
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> ResolutionConfigBuilder {
        ResolutionConfigBuilder::default()
    }

    /// Validate threshold ordering, ranges and weight signs.
    pub fn validate(&self) -> LoreResult<()> {
        let t = &self.thresholds;
        for (name, value) in [
            ("autoMerge", t.auto_merge),
            ("review", t.review),
            ("withinSegment", t.within_segment),
            ("veto", t.veto),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(LoreError::validation(
                    format!("{} threshold must be between 0.0 and 1.0, got {}", name, value),
                    ErrorCode::ValInvalidThreshold,
                ));
            }
        }
        if t.auto_merge < t.review {
            return Err(LoreError::validation_with_suggestion(
                format!(
                    "autoMerge threshold ({}) is below review threshold ({})",
                    t.auto_merge, t.review
                ),
                ErrorCode::ValInvalidThreshold,
                "Raise autoMerge or lower review so that autoMerge >= review",
            ));
        }

        let tuples = std::iter::once(("default".to_string(), self.weights.default)).chain(
            self.weights
                .by_type
                .iter()
                .map(|(t, w)| (t.to_string(), *w)),
        );
        for (label, w) in tuples {
            if [w.embedding, w.name, w.type_match, w.graph]
                .iter()
                .any(|v| *v < 0.0)
            {
                return Err(LoreError::validation(
                    format!("weights for '{}' must be non-negative", label),
                    ErrorCode::ValInvalidWeight,
                ));
            }
        }

        let range = &self.llm_score_range;
        if range.min > range.max {
            return Err(LoreError::validation(
                format!("llmScoreRange min ({}) exceeds max ({})", range.min, range.max),
                ErrorCode::ValInvalidRange,
            ));
        }

        Ok(())
    }
}

fn env_f32(key: &str) -> Option<f32> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<f32>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring non-numeric threshold override");
            None
        }
    }
}

/// Builder for ResolutionConfig.
#[derive(Default)]
pub struct ResolutionConfigBuilder {
    config: ResolutionConfig,
}

impl ResolutionConfigBuilder {
    /// Set the weight table.
    pub fn weights(mut self, weights: WeightTable) -> Self {
        self.config.weights = weights;
        self
    }

    /// Override the weights of one entity type.
    pub fn type_weights(mut self, entity_type: EntityType, weights: SignalWeights) -> Self {
        self.config.weights.by_type.insert(entity_type, weights);
        self
    }

    /// Set all thresholds.
    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Set the auto-merge threshold.
    pub fn auto_merge(mut self, value: f32) -> Self {
        self.config.thresholds.auto_merge = value;
        self
    }

    /// Set the review threshold.
    pub fn review(mut self, value: f32) -> Self {
        self.config.thresholds.review = value;
        self
    }

    /// Set the within-segment clustering threshold.
    pub fn within_segment(mut self, value: f32) -> Self {
        self.config.thresholds.within_segment = value;
        self
    }

    /// Enable or disable refinement flagging.
    pub fn use_llm_refinement(mut self, enabled: bool) -> Self {
        self.config.use_llm_refinement = enabled;
        self
    }

    /// Set the refinement score band.
    pub fn llm_score_range(mut self, min: f32, max: f32) -> Self {
        self.config.llm_score_range = ScoreRange { min, max };
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ResolutionConfig {
        self.config
    }
}

/// Per-call options supplied by the pipeline stage invoking resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverOptions {
    /// Document being processed.
    pub document_id: String,
    /// Owner of the document.
    pub user_id: String,
    /// Overrides for this call; defaults apply when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ResolutionConfig>,
}

impl ResolverOptions {
    /// Create options with default configuration.
    pub fn new(document_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            user_id: user_id.into(),
            config: None,
        }
    }

    /// Attach a configuration override.
    pub fn with_config(mut self, config: ResolutionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// The configuration to use for this call.
    pub fn effective_config(&self) -> ResolutionConfig {
        self.config.clone().unwrap_or_default()
    }
}
