//! Configuration for the Normalizer

use serde::{Deserialize, Serialize};

/// Configuration for the Normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Scores strictly below this force human review
    pub confidence_threshold: f64,
}

impl NormalizerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err("confidence_threshold must be between 0.0 and 1.0".to_string());
        }
        Ok(())
    }

    /// Config with a specific threshold
    pub fn with_threshold(confidence_threshold: f64) -> Self {
        Self { confidence_threshold }
    }

    /// Strict preset: more results routed to review
    pub fn strict() -> Self {
        Self {
            confidence_threshold: 0.85,
        }
    }

    /// Lenient preset: only low-confidence results routed to review
    pub fn lenient() -> Self {
        Self {
            confidence_threshold: 0.5,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
        }
    }
}
