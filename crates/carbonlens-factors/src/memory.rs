//! In-memory factor catalog

use crate::plan::{lookup_plan, matches, RegionFilter};
use carbonlens_domain::traits::FactorCatalog;
use carbonlens_domain::{EmissionFactor, FactorQuery};
use std::convert::Infallible;

/// A catalog held in a `Vec`, answering queries with the shared lookup plan
///
/// Useful for tests and for callers that load factors from JSON.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    factors: Vec<EmissionFactor>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factor
    pub fn with_factor(mut self, factor: EmissionFactor) -> Self {
        self.factors.push(factor);
        self
    }

    /// Add a factor in place
    pub fn push(&mut self, factor: EmissionFactor) {
        self.factors.push(factor);
    }

    /// All factors in insertion order
    pub fn factors(&self) -> &[EmissionFactor] {
        &self.factors
    }
}

impl From<Vec<EmissionFactor>> for MemoryCatalog {
    fn from(factors: Vec<EmissionFactor>) -> Self {
        Self { factors }
    }
}

impl FactorCatalog for MemoryCatalog {
    type Error = Infallible;

    fn find(&self, query: &FactorQuery) -> Result<Option<EmissionFactor>, Self::Error> {
        for step in lookup_plan(query) {
            let mut candidates = self.factors.iter().filter(|f| matches(f, query, &step));
            let found = if step.region == RegionFilter::Any {
                // Global rows first, then insertion order
                let all: Vec<_> = candidates.collect();
                all.iter()
                    .find(|f| f.region.is_none())
                    .or_else(|| all.first())
                    .map(|f| (*f).clone())
            } else {
                candidates.next().cloned()
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbonlens_domain::Scope;

    fn factor(region: Option<&str>, description: Option<&str>, value: f64) -> EmissionFactor {
        EmissionFactor {
            activity_category: "shipping".to_string(),
            scope: Scope::Three,
            region: region.map(str::to_string),
            description: description.map(str::to_string),
            value,
            unit: "kg CO2e/kg fuel".to_string(),
            uncertainty_pct: 2.0,
            source: "IMO".to_string(),
            version: None,
        }
    }

    #[test]
    fn test_lookup_order() {
        let catalog = MemoryCatalog::from(vec![
            factor(Some("Asia"), None, 4.0),
            factor(None, None, 3.0),
            factor(Some("EU"), None, 2.0),
            factor(Some("EU"), Some("HFO"), 1.0),
        ]);
        let base = FactorQuery::new("SHIPPING", Scope::Three);

        let hinted = base.clone().with_description_hint(Some("hfo".to_string()));
        assert_eq!(catalog.find(&hinted).unwrap().unwrap().value, 1.0);

        let regional = base.clone().with_region(Some("EU".to_string()));
        assert_eq!(catalog.find(&regional).unwrap().unwrap().value, 2.0);

        assert_eq!(catalog.find(&base).unwrap().unwrap().value, 3.0);
    }

    #[test]
    fn test_any_region_when_no_global_row() {
        let catalog = MemoryCatalog::new().with_factor(factor(Some("Asia"), None, 4.0));
        let query = FactorQuery::new("shipping", Scope::Three).with_region(Some("EU".to_string()));
        assert_eq!(catalog.find(&query).unwrap().unwrap().value, 4.0);
    }

    #[test]
    fn test_no_match() {
        let catalog = MemoryCatalog::new().with_factor(factor(None, None, 3.0));
        let query = FactorQuery::new("refinery", Scope::Three);
        assert_eq!(catalog.find(&query).unwrap(), None);
    }
}
