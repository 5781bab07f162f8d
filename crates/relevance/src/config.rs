use serde::{Deserialize, Serialize};

/// Signal weights for the combined relevance score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Shared collection membership
    pub taxonomy: f32,

    /// Shared host / root domain
    pub locality: f32,

    /// Language-model judgment over both summaries
    pub semantic: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            taxonomy: 0.20,
            locality: 0.15,
            semantic: 0.65,
        }
    }
}

impl ScoringWeights {
    /// Weights used when the semantic signal cannot apply (a summary is
    /// missing): taxonomy and locality count double.
    pub fn without_semantic(&self) -> Self {
        Self {
            taxonomy: self.taxonomy * 2.0,
            locality: self.locality * 2.0,
            semantic: 0.0,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("taxonomy", self.taxonomy),
            ("locality", self.locality),
            ("semantic", self.semantic),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("weights.{name} must be a finite value >= 0 (got {value})"));
            }
        }
        Ok(())
    }
}
