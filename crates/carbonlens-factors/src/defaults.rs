//! Built-in factor tables used when no catalog row matches

use carbonlens_domain::{FactorOrigin, ResolvedFactor};

/// Warning attached to last-resort factors
pub const GENERIC_WARNING: &str = "Using generic emission factor - accuracy may be limited";

/// Uncertainty of the spend and activity default tables, in percent
pub const DEFAULT_TABLE_UNCERTAINTY_PCT: f64 = 50.0;

/// Generic fuel factor (kg CO2e/kg fuel)
pub const GENERIC_FUEL_FACTOR: f64 = 3.0;

/// Uncertainty of the generic fuel factor, in percent
pub const GENERIC_FUEL_UNCERTAINTY_PCT: f64 = 25.0;

/// Region used when a grid region is unknown
pub const GLOBAL_REGION: &str = "Global";

/// Spend factors in kg CO2e per currency unit
const CURRENCY_FACTORS: &[(&str, f64)] = &[
    ("USD", 0.5),
    ("EUR", 0.45),
    ("GBP", 0.55),
    ("CAD", 0.48),
    ("AUD", 0.52),
];

/// Activity factors in kg CO2e per activity unit
const ACTIVITY_FACTORS: &[(&str, f64)] = &[
    ("transportation", 0.2),
    ("energy", 0.4),
    ("waste", 0.1),
    ("materials", 0.3),
    ("other", 0.25),
];

/// A combustion factor for one fuel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelFactor {
    /// Normalised fuel key
    pub fuel: &'static str,
    /// kg CO2e per kg fuel
    pub value: f64,
    /// Uncertainty in percent
    pub uncertainty_pct: f64,
    /// Publishing body
    pub source: &'static str,
}

const FUEL_FACTORS: &[FuelFactor] = &[
    FuelFactor { fuel: "hfo", value: 3.114, uncertainty_pct: 2.0, source: "IMO" },
    FuelFactor { fuel: "vlsfo", value: 3.151, uncertainty_pct: 2.0, source: "IMO" },
    FuelFactor { fuel: "mgo", value: 3.206, uncertainty_pct: 2.0, source: "IMO" },
    FuelFactor { fuel: "lng", value: 2.750, uncertainty_pct: 3.0, source: "IMO" },
    FuelFactor { fuel: "methanol", value: 1.375, uncertainty_pct: 5.0, source: "IMO" },
    FuelFactor { fuel: "ammonia", value: 0.0, uncertainty_pct: 10.0, source: "IMO" },
    FuelFactor { fuel: "hydrogen", value: 0.0, uncertainty_pct: 15.0, source: "IMO" },
    FuelFactor { fuel: "gasoline", value: 2.331, uncertainty_pct: 1.5, source: "EPA" },
    FuelFactor { fuel: "diesel", value: 2.679, uncertainty_pct: 1.5, source: "EPA" },
    FuelFactor { fuel: "cng", value: 1.961, uncertainty_pct: 2.0, source: "EPA" },
    FuelFactor { fuel: "lpg", value: 1.700, uncertainty_pct: 2.0, source: "EPA" },
    FuelFactor { fuel: "jet_a", value: 3.150, uncertainty_pct: 2.0, source: "ICAO" },
    FuelFactor { fuel: "saf", value: 0.5, uncertainty_pct: 10.0, source: "ICAO" },
];

/// Grid intensity for one region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFactor {
    /// Region code
    pub region: &'static str,
    /// kg CO2e per kWh
    pub value: f64,
    /// Uncertainty in percent
    pub uncertainty_pct: f64,
    /// Publishing body
    pub source: &'static str,
    /// Renewable share of generation, in percent
    pub renewable_pct: f64,
}

const GRID_FACTORS: &[GridFactor] = &[
    GridFactor { region: "US", value: 0.409, uncertainty_pct: 5.0, source: "EIA", renewable_pct: 21.5 },
    GridFactor { region: "US-CA", value: 0.231, uncertainty_pct: 3.0, source: "CAISO", renewable_pct: 52.1 },
    GridFactor { region: "US-TX", value: 0.412, uncertainty_pct: 4.0, source: "ERCOT", renewable_pct: 25.8 },
    GridFactor { region: "US-NY", value: 0.201, uncertainty_pct: 3.0, source: "NYISO", renewable_pct: 28.9 },
    GridFactor { region: "EU", value: 0.254, uncertainty_pct: 4.0, source: "ENTSO-E", renewable_pct: 38.2 },
    GridFactor { region: GLOBAL_REGION, value: 0.475, uncertainty_pct: 8.0, source: "IEA", renewable_pct: 29.0 },
];

/// Default spend factor for a currency code (case-insensitive)
pub fn currency_factor(currency: &str) -> Option<ResolvedFactor> {
    let code = currency.trim().to_uppercase();
    CURRENCY_FACTORS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(c, value)| table_factor(*value, format!("kg CO2e/{}", c), "default_currency_table"))
}

/// Generic spend factor for currencies missing from the table
pub fn generic_spend_factor(currency: &str) -> ResolvedFactor {
    ResolvedFactor {
        value: 0.5,
        unit: format!("kg CO2e/{}", currency.trim().to_uppercase()),
        uncertainty_pct: DEFAULT_TABLE_UNCERTAINTY_PCT,
        source: "generic".to_string(),
        origin: FactorOrigin::Generic,
        warning: Some(GENERIC_WARNING.to_string()),
    }
}

/// Default activity factor for an activity type (case-insensitive)
pub fn activity_factor(activity_type: &str) -> Option<ResolvedFactor> {
    let key = activity_type.trim().to_lowercase();
    ACTIVITY_FACTORS
        .iter()
        .find(|(a, _)| *a == key)
        .map(|(_, value)| table_factor(*value, "kg CO2e/unit", "default_activity_table"))
}

/// Generic activity factor for unknown activity types
pub fn generic_activity_factor() -> ResolvedFactor {
    ResolvedFactor {
        value: 0.25,
        unit: "kg CO2e/unit".to_string(),
        uncertainty_pct: DEFAULT_TABLE_UNCERTAINTY_PCT,
        source: "generic".to_string(),
        origin: FactorOrigin::Generic,
        warning: Some(GENERIC_WARNING.to_string()),
    }
}

/// Generic fuel factor for unknown fuels
pub fn generic_fuel_factor() -> ResolvedFactor {
    ResolvedFactor {
        value: GENERIC_FUEL_FACTOR,
        unit: "kg CO2e/kg fuel".to_string(),
        uncertainty_pct: GENERIC_FUEL_UNCERTAINTY_PCT,
        source: "generic".to_string(),
        origin: FactorOrigin::Generic,
        warning: Some(GENERIC_WARNING.to_string()),
    }
}

fn table_factor(value: f64, unit: impl Into<String>, source: &str) -> ResolvedFactor {
    ResolvedFactor {
        value,
        unit: unit.into(),
        uncertainty_pct: DEFAULT_TABLE_UNCERTAINTY_PCT,
        source: source.to_string(),
        origin: FactorOrigin::Default,
        warning: None,
    }
}

/// Lowercase with `-` and spaces folded to `_` (`Jet-A` -> `jet_a`)
pub fn normalize_fuel(fuel: &str) -> String {
    fuel.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

/// Look up a fuel by any spelling `normalize_fuel` folds
pub fn fuel(fuel: &str) -> Option<&'static FuelFactor> {
    let key = normalize_fuel(fuel);
    FUEL_FACTORS.iter().find(|f| f.fuel == key)
}

/// Multiplier applied to fuel factors for a region
pub fn regional_adjustment(region: &str) -> f64 {
    match region.trim().to_uppercase().as_str() {
        "US" => 1.0,
        "EU" => 0.98,
        "ASIA" => 1.02,
        "GLOBAL" => 1.0,
        _ => 1.0,
    }
}

/// Grid factor for a region code (case-insensitive)
pub fn grid(region: &str) -> Option<&'static GridFactor> {
    let region = region.trim();
    GRID_FACTORS.iter().find(|g| g.region.eq_ignore_ascii_case(region))
}

/// The global grid row
pub fn global_grid() -> &'static GridFactor {
    &GRID_FACTORS[GRID_FACTORS.len() - 1]
}

/// Catalog category for an activity description
pub fn catalog_category(activity_type: &str) -> &'static str {
    let lowered = activity_type.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lowered.contains(w));

    if mentions(&["tanker", "shipping", "vessel"]) {
        "shipping"
    } else if mentions(&["electricity", "power"]) {
        "electricity"
    } else if mentions(&["refinery"]) {
        "refinery"
    } else {
        "general"
    }
}

/// Whether an activity type is priced off the electricity grid
pub fn is_grid_activity(activity_type: &str) -> bool {
    let lowered = activity_type.to_lowercase();
    lowered.contains("electricity") || lowered == "energy"
}
