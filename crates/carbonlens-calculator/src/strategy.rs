//! Structured calculation strategies
//!
//! Each strategy either applies to a record and yields a result, or says why
//! it does not apply. Only a failing factor catalog is an error.

use carbonlens_domain::traits::FactorCatalog;
use carbonlens_domain::{
    ActivityRecord, CalculationMethod, CalculationResult, FactorOrigin, ResolvedFactor, Scope,
};
use carbonlens_factors::{FactorError, FactorResolver};
use serde_json::{json, Value};
use std::fmt::Display;

/// Result of trying one strategy
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    /// The strategy produced a result
    Applied(CalculationResult),
    /// The record lacks what the strategy needs
    NotApplicable(String),
}

impl StrategyOutcome {
    fn skip(reason: impl Into<String>) -> Self {
        StrategyOutcome::NotApplicable(reason.into())
    }
}

/// Spend × factor
///
/// Uses the record's `spend_factor` when it is a positive number, otherwise
/// resolves one from the currency and category.
pub fn spend_based<C>(
    record: &ActivityRecord,
    factors: &FactorResolver<C>,
) -> Result<StrategyOutcome, FactorError>
where
    C: FactorCatalog,
    C::Error: Display,
{
    if !record.has_spend_data() {
        return Ok(StrategyOutcome::skip("spend: no amount and currency"));
    }
    let (Some(amount), Some(currency)) = (record.amount, record.currency.as_deref()) else {
        return Ok(StrategyOutcome::skip("spend: no amount and currency"));
    };
    if amount < 0.0 {
        return Ok(StrategyOutcome::skip("spend: negative amount"));
    }
    let currency = currency.trim().to_uppercase();

    let factor = match usable_factor(record.spend_factor) {
        Some(value) => ResolvedFactor::from_record(value, format!("kg CO2e/{}", currency)),
        None => factors.resolve_spend(&currency, record.category.as_deref(), record.scope_or_default())?,
    };

    let emissions = amount * factor.value;
    let method = if is_specific(&factor) {
        CalculationMethod::SpendBased
    } else {
        CalculationMethod::SpendBasedDefaultFactor
    };

    Ok(StrategyOutcome::Applied(CalculationResult {
        emissions_kgco2e: emissions,
        method,
        details: format!("{} {} × {} = {:.2} kg CO2e", amount, currency, factor.value, emissions),
        metadata: json!({
            "type": "spend_based",
            "inputs": {
                "amount": amount,
                "currency": currency,
                "category": record.category,
                "scope": record.scope_or_default(),
            },
            "factor": factor_metadata(&factor),
        }),
    }))
}

/// Uncertainty added to a factor applied to distance without a mass
pub const DISTANCE_ONLY_UNCERTAINTY_PCT: f64 = 15.0;

/// The quantity an activity calculation multiplies
#[derive(Debug, Clone, Copy, PartialEq)]
enum Quantity {
    /// Explicit `activity_amount` in the record's own unit
    Activity(f64),
    /// `energy_kwh`, priced against the grid
    Energy(f64),
    /// `distance_km × mass_tonnes`
    TonneKm { distance_km: f64, mass_tonnes: f64 },
    /// `distance_km` with no mass
    Distance(f64),
}

impl Quantity {
    /// First usable quantity: activity amount, energy, tonne-km, distance
    fn of(record: &ActivityRecord) -> Option<Self> {
        if let Some(amount) = nonzero(record.activity_amount) {
            return Some(Quantity::Activity(amount));
        }
        if let Some(kwh) = nonzero(record.energy_kwh) {
            return Some(Quantity::Energy(kwh));
        }
        let distance_km = nonzero(record.distance_km)?;
        Some(match nonzero(record.mass_tonnes) {
            Some(mass_tonnes) => Quantity::TonneKm { distance_km, mass_tonnes },
            None => Quantity::Distance(distance_km),
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Quantity::Activity(_) => "activity_amount",
            Quantity::Energy(_) => "energy_kwh",
            Quantity::TonneKm { .. } => "tonne_km",
            Quantity::Distance(_) => "distance_km",
        }
    }

    fn value(&self) -> f64 {
        match *self {
            Quantity::Activity(v) | Quantity::Energy(v) | Quantity::Distance(v) => v,
            Quantity::TonneKm { distance_km, mass_tonnes } => distance_km * mass_tonnes,
        }
    }

    fn is_negative(&self) -> bool {
        match *self {
            Quantity::Activity(v) | Quantity::Energy(v) | Quantity::Distance(v) => v < 0.0,
            Quantity::TonneKm { distance_km, mass_tonnes } => distance_km < 0.0 || mass_tonnes < 0.0,
        }
    }

    /// Unit of `value`; an explicit amount takes the record's unit
    fn unit<'a>(&self, record_unit: Option<&'a str>) -> Option<&'a str> {
        match self {
            Quantity::Activity(_) => record_unit,
            Quantity::Energy(_) => Some("kWh"),
            Quantity::TonneKm { .. } => Some("tonne.km"),
            Quantity::Distance(_) => Some("km"),
        }
    }

    fn describe(&self, unit: Option<&str>) -> String {
        match (self, unit) {
            (Quantity::TonneKm { distance_km, mass_tonnes }, _) => {
                format!("{} km × {} t = {} tonne.km", distance_km, mass_tonnes, self.value())
            }
            (_, Some(unit)) => format!("{} {}", self.value(), unit),
            (_, None) => self.value().to_string(),
        }
    }
}

/// Activity quantity × factor
///
/// The quantity is `activity_amount` when present, otherwise derived from
/// the physical fields: `energy_kwh` against the grid factor,
/// `distance_km × mass_tonnes` as tonne-km, or `distance_km` alone with
/// [`DISTANCE_ONLY_UNCERTAINTY_PCT`] added to the factor's uncertainty.
/// Uses the record's `activity_factor` when it is a positive number,
/// otherwise resolves one from activity type, fuel and region.
pub fn activity_based<C>(
    record: &ActivityRecord,
    factors: &FactorResolver<C>,
) -> Result<StrategyOutcome, FactorError>
where
    C: FactorCatalog,
    C::Error: Display,
{
    let Some(quantity) = Quantity::of(record).filter(|_| record.has_activity_data()) else {
        return Ok(StrategyOutcome::skip(
            "activity: no activity_amount, energy_kwh or distance_km",
        ));
    };
    if quantity.is_negative() {
        return Ok(StrategyOutcome::skip(format!("activity: negative {}", quantity.name())));
    }

    let record_unit = record.activity_unit.as_deref().filter(|u| !u.trim().is_empty());
    let unit = quantity.unit(record_unit);
    let activity_type = record.activity_type.as_deref().unwrap_or("other");
    let amount = quantity.value();
    let scope = match quantity {
        Quantity::Energy(_) => record.scope.unwrap_or(Scope::Two),
        _ => record.scope_or_default(),
    };

    let mut factor = match (usable_factor(record.activity_factor), quantity) {
        (Some(value), _) => ResolvedFactor::from_record(value, format!("kg CO2e/{}", unit.unwrap_or("unit"))),
        (None, Quantity::Energy(_)) => factors.resolve_activity(
            "electricity",
            None,
            record.region.as_deref(),
            scope,
        )?,
        (None, _) => factors.resolve_activity(
            activity_type,
            record.fuel_type.as_deref(),
            record.region.as_deref(),
            scope,
        )?,
    };
    if let Quantity::Distance(_) = quantity {
        factor.uncertainty_pct += DISTANCE_ONLY_UNCERTAINTY_PCT;
        let note = "No mass_tonnes; distance-only estimate";
        factor.warning = Some(match factor.warning.take() {
            Some(warning) => format!("{}; {}", warning, note),
            None => note.to_string(),
        });
    }

    let emissions = amount * factor.value;
    let method = if is_specific(&factor) {
        CalculationMethod::ActivityBased
    } else {
        CalculationMethod::ActivityBasedDefaultFactor
    };

    let mut inputs = json!({
        "quantity": quantity.name(),
        "activity_amount": amount,
        "activity_type": activity_type,
        "unit": unit,
        "fuel_type": record.fuel_type,
        "region": record.region,
        "scope": scope,
    });
    match quantity {
        Quantity::Activity(_) => {}
        Quantity::Energy(kwh) => inputs["energy_kwh"] = json!(kwh),
        Quantity::TonneKm { distance_km, mass_tonnes } => {
            inputs["distance_km"] = json!(distance_km);
            inputs["mass_tonnes"] = json!(mass_tonnes);
        }
        Quantity::Distance(km) => inputs["distance_km"] = json!(km),
    }

    Ok(StrategyOutcome::Applied(CalculationResult {
        emissions_kgco2e: emissions,
        method,
        details: format!("{} × {} = {:.2} kg CO2e", quantity.describe(unit), factor.value, emissions),
        metadata: json!({
            "type": "activity_based",
            "inputs": inputs,
            "factor": factor_metadata(&factor),
        }),
    }))
}

/// Factor provenance as stamped into calculation metadata
pub fn factor_metadata(factor: &ResolvedFactor) -> Value {
    let mut value = json!({
        "value": factor.value,
        "unit": factor.unit,
        "source": factor.source,
        "origin": factor.origin,
        "uncertainty_pct": factor.uncertainty_pct,
    });
    if let Some(warning) = &factor.warning {
        value["warning"] = json!(warning);
    }
    value
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

fn usable_factor(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn is_specific(factor: &ResolvedFactor) -> bool {
    matches!(factor.origin, FactorOrigin::Record | FactorOrigin::Catalog)
}
