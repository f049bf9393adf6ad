//! Configuration for the Classifier

use carbonlens_llm::{OllamaConfig, OpenAiConfig};
use carbonlens_normalizer::NormalizerConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the Classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Scores strictly below this force human review
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,

    /// Input longer than this many characters is truncated before prompting
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,

    /// Local model tier (disabled when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<OllamaConfig>,

    /// Cloud model tier (disabled when absent or without a credential)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<OpenAiConfig>,
}

fn default_threshold() -> f64 {
    0.7
}

fn default_max_text_length() -> usize {
    4_000
}

impl ClassifierConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err("confidence_threshold must be between 0.0 and 1.0".to_string());
        }
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if let Some(local) = &self.local {
            local.validate()?;
        }
        if let Some(cloud) = &self.cloud {
            cloud.validate()?;
        }
        Ok(())
    }

    /// Patterns only: no model tiers
    pub fn offline() -> Self {
        Self {
            local: None,
            cloud: None,
            ..Self::default()
        }
    }

    /// Local and cloud tiers with a cloud credential
    pub fn with_cloud_key(api_key: impl Into<String>) -> Self {
        Self {
            cloud: Some(OpenAiConfig::with_api_key(api_key)),
            ..Self::default()
        }
    }

    /// Normalizer settings derived from this config
    pub fn normalizer(&self) -> NormalizerConfig {
        NormalizerConfig::with_threshold(self.confidence_threshold)
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

impl Default for ClassifierConfig {
    /// Local tier enabled, cloud tier disabled
    fn default() -> Self {
        Self {
            confidence_threshold: default_threshold(),
            max_text_length: default_max_text_length(),
            local: Some(OllamaConfig::default()),
            cloud: None,
        }
    }
}
