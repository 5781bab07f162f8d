use crate::error::{ConnectionError, Result};
use serde::{Deserialize, Serialize};
use wings_relevance::{ScoringWeights, DEFAULT_MAX_SUMMARY_CHARS};

/// Thresholds and budgets for connection discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Minimum combined score for a pair to become a connection
    pub accept_threshold: f32,

    /// Minimum similarity requested from the batch prompt
    pub batch_semantic_threshold: f32,

    /// Score at or above which a connection counts as highly relevant
    pub high_score_threshold: f32,

    /// Taxonomy weight in the batch structural score
    pub batch_taxonomy_weight: f32,

    /// Locality weight in the batch structural score
    pub batch_locality_weight: f32,

    /// Token budget for a pairwise similarity reply
    pub semantic_max_tokens: u32,

    /// Token budget for a batch similarity reply
    pub batch_max_tokens: u32,

    /// Per-field character cap inside prompts
    pub max_summary_chars: usize,

    /// Signal weights for the per-item score
    pub weights: ScoringWeights,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.3,
            batch_semantic_threshold: 0.4,
            high_score_threshold: 0.7,
            batch_taxonomy_weight: 0.6,
            batch_locality_weight: 0.4,
            semantic_max_tokens: 10,
            batch_max_tokens: 1000,
            max_summary_chars: DEFAULT_MAX_SUMMARY_CHARS,
            weights: ScoringWeights::default(),
        }
    }
}

impl ConnectionConfig {
    /// Parse a `[connections]`-shaped TOML table; missing keys keep defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| ConnectionError::InvalidConfig(e.to_string()))?;
        config.validate().map_err(ConnectionError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, value) in [
            ("accept_threshold", self.accept_threshold),
            ("batch_semantic_threshold", self.batch_semantic_threshold),
            ("high_score_threshold", self.high_score_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be within [0, 1] (got {value})"));
            }
        }

        for (name, value) in [
            ("batch_taxonomy_weight", self.batch_taxonomy_weight),
            ("batch_locality_weight", self.batch_locality_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a finite value >= 0 (got {value})"));
            }
        }

        if self.semantic_max_tokens == 0 || self.batch_max_tokens == 0 {
            return Err("token budgets must be > 0".to_string());
        }

        if self.max_summary_chars == 0 {
            return Err("max_summary_chars must be > 0".to_string());
        }

        self.weights.validate()
    }
}
