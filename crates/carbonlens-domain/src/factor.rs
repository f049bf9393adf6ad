//! Emission factor module

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::Scope;

/// A catalog row converting spend or activity into kg CO2e
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactor {
    /// Activity category the factor applies to (shipping, electricity, ...)
    pub activity_category: String,
    /// GHG scope
    pub scope: Scope,
    /// Region code; `None` means global
    #[serde(default)]
    pub region: Option<String>,
    /// Free description, used for sub-matches such as fuel type
    #[serde(default)]
    pub description: Option<String>,
    /// Factor value
    pub value: f64,
    /// Unit, e.g. `kg CO2e/kWh`
    pub unit: String,
    /// Declared uncertainty in percent
    #[serde(default)]
    pub uncertainty_pct: f64,
    /// Publishing body (EPA, IMO, DEFRA, ...)
    pub source: String,
    /// Dataset version
    #[serde(default)]
    pub version: Option<String>,
}

/// Criteria for a catalog lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactorQuery {
    /// Category matched case-insensitively
    pub activity_category: String,
    /// Scope matched exactly
    pub scope: Scope,
    /// Preferred region
    pub region: Option<String>,
    /// Activity-specific hint matched against the description (e.g. fuel)
    pub description_hint: Option<String>,
}

impl FactorQuery {
    /// Query by category and scope only
    pub fn new(activity_category: impl Into<String>, scope: Scope) -> Self {
        Self {
            activity_category: activity_category.into(),
            scope,
            region: None,
            description_hint: None,
        }
    }

    /// Restrict to a region
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region.filter(|r| !r.trim().is_empty());
        self
    }

    /// Prefer rows whose description mentions the hint
    pub fn with_description_hint(mut self, hint: Option<String>) -> Self {
        self.description_hint = hint.filter(|h| !h.trim().is_empty());
        self
    }

    /// Stable key for caching
    pub fn cache_key(&self) -> String {
        format!(
            "catalog_{}_{}_{}_{}",
            self.activity_category.to_lowercase(),
            self.scope,
            self.region.as_deref().unwrap_or("global"),
            self.description_hint.as_deref().unwrap_or("-"),
        )
    }
}

/// Where a resolved factor came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorOrigin {
    /// Attached to the record by the caller
    Record,
    /// Matched in the persistent catalog
    Catalog,
    /// Built-in default table
    Default,
    /// Last-resort generic value
    Generic,
}

impl FactorOrigin {
    /// Stable identifier for metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            FactorOrigin::Record => "record",
            FactorOrigin::Catalog => "catalog",
            FactorOrigin::Default => "default",
            FactorOrigin::Generic => "generic",
        }
    }
}

impl fmt::Display for FactorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A factor chosen for one calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFactor {
    /// Factor value
    pub value: f64,
    /// Unit
    pub unit: String,
    /// Declared uncertainty in percent
    pub uncertainty_pct: f64,
    /// Publishing body or table name
    pub source: String,
    /// Provenance
    pub origin: FactorOrigin,
    /// Set when accuracy is known to be limited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ResolvedFactor {
    /// A factor taken from a catalog row
    pub fn from_catalog(factor: &EmissionFactor) -> Self {
        Self {
            value: factor.value,
            unit: factor.unit.clone(),
            uncertainty_pct: factor.uncertainty_pct,
            source: factor.source.clone(),
            origin: FactorOrigin::Catalog,
            warning: None,
        }
    }

    /// A factor supplied with the record
    pub fn from_record(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
            uncertainty_pct: 0.0,
            source: "record".to_string(),
            origin: FactorOrigin::Record,
            warning: None,
        }
    }
}
