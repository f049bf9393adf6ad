//! Factor resolution: catalog first, then built-in tables, then generic values

use crate::cache::FactorCache;
use crate::config::ResolverConfig;
use crate::defaults::{self, GLOBAL_REGION};
use crate::error::FactorError;
use crate::memory::MemoryCatalog;
use carbonlens_domain::traits::FactorCatalog;
use carbonlens_domain::{FactorOrigin, FactorQuery, ResolvedFactor, Scope};
use std::fmt::Display;
use tracing::{debug, warn};

/// Picks the factor for a spend or activity calculation
///
/// Resolution never reports "no factor": when nothing better matches, a
/// generic value flagged with a warning is returned. Only a failing catalog
/// is an error.
///
/// # Example
///
/// ```
/// use carbonlens_domain::{FactorOrigin, Scope};
/// use carbonlens_factors::FactorResolver;
///
/// let resolver = FactorResolver::with_defaults();
/// let factor = resolver.resolve_spend("USD", None, Scope::Three).unwrap();
/// assert_eq!(factor.value, 0.5);
/// assert_eq!(factor.origin, FactorOrigin::Default);
/// ```
pub struct FactorResolver<C> {
    catalog: C,
    cache: FactorCache,
    config: ResolverConfig,
}

impl FactorResolver<MemoryCatalog> {
    /// Resolver backed only by the built-in tables
    pub fn with_defaults() -> Self {
        Self::new(MemoryCatalog::new(), ResolverConfig::default())
    }
}

impl<C> FactorResolver<C>
where
    C: FactorCatalog,
    C::Error: Display,
{
    /// Create a resolver over a catalog
    pub fn new(catalog: C, config: ResolverConfig) -> Self {
        Self {
            catalog,
            cache: FactorCache::new(),
            config,
        }
    }

    /// The underlying catalog
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// The configuration in use
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Drop every cached factor
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Factor for spend in `currency`
    ///
    /// A catalog row is used only when `category` is known and the row's unit
    /// names the currency. Otherwise the currency table applies; currencies
    /// missing from it get the generic USD value.
    pub fn resolve_spend(
        &self,
        currency: &str,
        category: Option<&str>,
        scope: Scope,
    ) -> Result<ResolvedFactor, FactorError> {
        let code = currency.trim().to_uppercase();

        if let Some(category) = category.filter(|c| !c.trim().is_empty()) {
            let query = FactorQuery::new(category, scope).with_description_hint(Some(code.clone()));
            if let Some(factor) = self.lookup(&query)? {
                if factor.unit.to_uppercase().contains(&code) {
                    return Ok(factor);
                }
                debug!("catalog factor for {} is not priced in {}", category, code);
            }
        }

        if let Some(factor) = defaults::currency_factor(&code) {
            return Ok(factor);
        }

        warn!("no spend factor for currency {}, using generic value", code);
        Ok(defaults::generic_spend_factor(&code))
    }

    /// Factor for an activity quantity
    ///
    /// Order: catalog (category derived from the activity, fuel as hint),
    /// fuel table, grid table for electricity, activity table, generic.
    pub fn resolve_activity(
        &self,
        activity_type: &str,
        fuel_type: Option<&str>,
        region: Option<&str>,
        scope: Scope,
    ) -> Result<ResolvedFactor, FactorError> {
        let query = FactorQuery::new(defaults::catalog_category(activity_type), scope)
            .with_region(region.map(str::to_string))
            .with_description_hint(fuel_type.map(str::to_string));
        if let Some(factor) = self.lookup(&query)? {
            return Ok(factor);
        }

        if let Some(fuel) = fuel_type.and_then(defaults::fuel) {
            return Ok(self.fuel_from_table(fuel, region.unwrap_or(GLOBAL_REGION)));
        }

        if defaults::is_grid_activity(activity_type) {
            return Ok(self.electricity_factor(region));
        }

        if let Some(factor) = defaults::activity_factor(activity_type) {
            return Ok(factor);
        }

        warn!("no activity factor for {:?}, using generic value", activity_type);
        Ok(defaults::generic_activity_factor())
    }

    /// Combustion factor for a fuel, adjusted for region
    ///
    /// Unknown fuels are looked up in the catalog under category `fuel`
    /// (scope 1), where the row's description must name the fuel, then fall
    /// back to the generic fuel factor.
    pub fn fuel_factor(&self, fuel: &str, region: Option<&str>) -> Result<ResolvedFactor, FactorError> {
        let region = region.unwrap_or(GLOBAL_REGION);
        let key = format!("fuel_{}_{}", defaults::normalize_fuel(fuel), region);

        if let Some(Some(factor)) = self.cache.get(&key) {
            debug!("fuel factor cache hit: {}", key);
            return Ok(factor);
        }

        let factor = match defaults::fuel(fuel) {
            Some(entry) => self.fuel_from_table(entry, region),
            None => {
                let query = FactorQuery::new("fuel", Scope::One)
                    .with_region(Some(region.to_string()))
                    .with_description_hint(Some(fuel.to_string()));
                let needle = fuel.trim().to_lowercase();
                let row = self
                    .catalog
                    .find(&query)
                    .map_err(|e| FactorError::Catalog(e.to_string()))?
                    .filter(|row| {
                        row.description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(&needle))
                    });
                match row {
                    Some(row) => ResolvedFactor::from_catalog(&row),
                    None => {
                        warn!("unknown fuel {:?}, using generic factor", fuel);
                        defaults::generic_fuel_factor()
                    }
                }
            }
        };

        self.cache.insert(key, Some(factor.clone()), self.config.fuel_ttl());
        Ok(factor)
    }

    /// Grid intensity for a region; unknown regions use the global average
    pub fn electricity_factor(&self, region: Option<&str>) -> ResolvedFactor {
        let region = region.unwrap_or(GLOBAL_REGION);
        let key = format!("grid_{}", region.to_uppercase());

        if let Some(Some(factor)) = self.cache.get(&key) {
            debug!("grid factor cache hit: {}", key);
            return factor;
        }

        let (grid, warning) = match defaults::grid(region) {
            Some(grid) => (grid, None),
            None => {
                warn!("no grid factor for region {}, using global average", region);
                (
                    defaults::global_grid(),
                    Some(format!("No grid factor for region {}; using global average", region)),
                )
            }
        };

        let factor = ResolvedFactor {
            value: grid.value,
            unit: "kg CO2e/kWh".to_string(),
            uncertainty_pct: grid.uncertainty_pct,
            source: grid.source.to_string(),
            origin: FactorOrigin::Default,
            warning,
        };

        self.cache.insert(key, Some(factor.clone()), self.config.grid_ttl());
        factor
    }

    fn fuel_from_table(&self, fuel: &defaults::FuelFactor, region: &str) -> ResolvedFactor {
        ResolvedFactor {
            value: fuel.value * defaults::regional_adjustment(region),
            unit: "kg CO2e/kg fuel".to_string(),
            uncertainty_pct: fuel.uncertainty_pct,
            source: fuel.source.to_string(),
            origin: FactorOrigin::Default,
            warning: None,
        }
    }

    fn lookup(&self, query: &FactorQuery) -> Result<Option<ResolvedFactor>, FactorError> {
        let key = query.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            debug!("catalog cache hit: {}", key);
            return Ok(cached);
        }

        let found = self
            .catalog
            .find(query)
            .map_err(|e| FactorError::Catalog(e.to_string()))?
            .map(|row| ResolvedFactor::from_catalog(&row));

        self.cache.insert(key, found.clone(), self.config.catalog_ttl());
        Ok(found)
    }
}
