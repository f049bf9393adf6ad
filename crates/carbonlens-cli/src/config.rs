//! Configuration management for the CLI.

use crate::cli::Overrides;
use crate::error::{CliError, Result};
use carbonlens_calculator::UncertaintyConfig;
use carbonlens_classifier::ClassifierConfig;
use carbonlens_factors::ResolverConfig;
use carbonlens_llm::{OllamaConfig, OpenAiConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Factor catalog database; defaults to `~/.carbonlens/factors.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    /// Classification tiers and thresholds
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Factor cache lifetimes
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Monte Carlo sampling
    #[serde(default)]
    pub uncertainty: UncertaintyConfig,

    /// Output settings
    #[serde(default)]
    pub settings: Settings,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Directory holding the config file and the default catalog.
    pub fn dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".carbonlens"))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::dir()?.join("config.toml"))
    }

    /// Load configuration from `path`, or the default location.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::path()?,
        };

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Apply command-line and environment overrides.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.ollama_url {
            let local = self.classifier.local.get_or_insert_with(OllamaConfig::default);
            local.endpoint = url.clone();
        }
        if let Some(key) = overrides.openai_api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            let cloud = self.classifier.cloud.get_or_insert_with(OpenAiConfig::default);
            cloud.api_key = Some(key.clone());
        }
        if let Some(threshold) = overrides.confidence_threshold {
            self.classifier.confidence_threshold = threshold;
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.classifier.validate().map_err(CliError::Config)?;
        self.resolver.validate().map_err(CliError::Config)?;
        self.uncertainty.validate().map_err(CliError::Config)?;
        Ok(())
    }

    /// Catalog database path.
    pub fn catalog_path(&self) -> Result<PathBuf> {
        match &self.catalog_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::dir()?.join("factors.db")),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Table);
        assert!(config.classifier.local.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.catalog_path = Some(dir.path().join("factors.db"));
        config.settings.format = OutputFormat::Json;
        config.resolver.grid_ttl_secs = 60;
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[classifier]\nconfidence_threshold = 0.8\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.classifier.confidence_threshold, 0.8);
        assert_eq!(config.uncertainty.iterations, 1000);
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(&Overrides {
            ollama_url: Some("http://gpu-box:11434".to_string()),
            openai_api_key: Some("sk-test".to_string()),
            confidence_threshold: Some(0.9),
        });

        assert_eq!(config.classifier.local.as_ref().unwrap().endpoint, "http://gpu-box:11434");
        assert!(config.classifier.cloud.as_ref().unwrap().has_credential());
        assert_eq!(config.classifier.confidence_threshold, 0.9);
    }

    #[test]
    fn test_blank_key_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(&Overrides {
            openai_api_key: Some("  ".to_string()),
            ..Overrides::default()
        });
        assert!(config.classifier.cloud.is_none());
    }

    #[test]
    fn test_invalid_threshold_fails_validation() {
        let mut config = Config::default();
        config.classifier.confidence_threshold = 1.5;
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }
}
