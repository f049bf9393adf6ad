//! Configuration for the FactorResolver

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache lifetimes for resolved factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// TTL of fuel factors in seconds
    pub fuel_ttl_secs: u64,
    /// TTL of grid factors in seconds
    pub grid_ttl_secs: u64,
    /// TTL of catalog lookups (hits and misses) in seconds
    pub catalog_ttl_secs: u64,
}

impl ResolverConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        // Zero disables caching for that family
        const MAX_TTL_SECS: u64 = 24 * 60 * 60;
        for (name, value) in [
            ("fuel_ttl_secs", self.fuel_ttl_secs),
            ("grid_ttl_secs", self.grid_ttl_secs),
            ("catalog_ttl_secs", self.catalog_ttl_secs),
        ] {
            if value > MAX_TTL_SECS {
                return Err(format!("{} must be at most {} seconds", name, MAX_TTL_SECS));
            }
        }
        Ok(())
    }

    /// Config that never serves a cached value
    pub fn uncached() -> Self {
        Self {
            fuel_ttl_secs: 0,
            grid_ttl_secs: 0,
            catalog_ttl_secs: 0,
        }
    }

    /// Fuel TTL as a duration
    pub fn fuel_ttl(&self) -> Duration {
        Duration::from_secs(self.fuel_ttl_secs)
    }

    /// Grid TTL as a duration
    pub fn grid_ttl(&self) -> Duration {
        Duration::from_secs(self.grid_ttl_secs)
    }

    /// Catalog TTL as a duration
    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
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

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuel_ttl_secs: 3600,
            grid_ttl_secs: 1800,
            catalog_ttl_secs: 600,
        }
    }
}
