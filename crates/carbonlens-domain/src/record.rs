//! Activity record module - the unit of work for classification and calculation

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::calculation::CalculationResult;
use crate::classification::ClassifiedFields;

/// Unique identifier for an activity record based on UUIDv7
///
/// UUIDv7 keeps identifiers chronologically sortable, which keeps batch
/// outputs in ingestion order when sorted by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(u128);

impl RecordId {
    /// Generate a new UUIDv7-based RecordId
    ///
    /// # Examples
    ///
    /// ```
    /// use carbonlens_domain::RecordId;
    ///
    /// let id = RecordId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a RecordId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a RecordId from its UUID string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid record id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl TryFrom<String> for RecordId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_string(&value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}

/// GHG Protocol emission scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Scope {
    /// Direct emissions from owned or controlled sources
    One,
    /// Indirect emissions from purchased energy
    Two,
    /// All other indirect emissions in the value chain
    Three,
}

impl Scope {
    /// Numeric form (1, 2 or 3)
    pub fn as_u8(&self) -> u8 {
        match self {
            Scope::One => 1,
            Scope::Two => 2,
            Scope::Three => 3,
        }
    }

    /// Parse from the numeric form
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Scope::One),
            2 => Some(Scope::Two),
            3 => Some(Scope::Three),
            _ => None,
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Three
    }
}

impl TryFrom<u8> for Scope {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Scope::from_u8(value).ok_or_else(|| format!("Invalid scope: {} (expected 1, 2 or 3)", value))
    }
}

impl From<Scope> for u8 {
    fn from(scope: Scope) -> Self {
        scope.as_u8()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// One emitting event
///
/// Records are created upstream (CSV import, manual entry, classification)
/// and enriched in place by the calculation resolver. Every descriptive field
/// is optional; which ones are present decides which calculation strategy
/// applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityRecord {
    /// Unique identifier
    pub id: RecordId,

    /// Supplier or vendor name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,

    /// Monetary spend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    /// ISO currency code of `amount`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Physical activity quantity (km, kWh, kg, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_amount: Option<f64>,

    /// Unit of `activity_amount`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_unit: Option<String>,

    /// Activity classification (transportation, energy, waste, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,

    /// Fuel type, when the activity burns fuel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,

    /// Vehicle type, for transportation activities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,

    /// Distance travelled in kilometres
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,

    /// Mass moved or consumed in tonnes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass_tonnes: Option<f64>,

    /// Energy consumed in kWh
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_kwh: Option<f64>,

    /// Region code used for factor matching (US, EU, US-CA, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// GHG scope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,

    /// Spend category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Spend subcategory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,

    /// Short description of the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Freeform notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Original unstructured text (invoice body, OCR output)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,

    /// Date the activity occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Record-attached spend factor (kg CO2e per currency unit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spend_factor: Option<f64>,

    /// Record-attached activity factor (kg CO2e per activity unit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_factor: Option<f64>,

    /// Calculated emissions in kg CO2e
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emissions_kgco2e: Option<f64>,

    /// Method that produced `emissions_kgco2e`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation_method: Option<String>,

    /// Human-readable formula
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation_details: Option<String>,

    /// Inputs and factor provenance for audit replay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation_metadata: Option<serde_json::Value>,

    /// Provenance written by external enrichers
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl ActivityRecord {
    /// Create an empty record with a fresh id
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a spend record
    ///
    /// # Examples
    ///
    /// ```
    /// use carbonlens_domain::ActivityRecord;
    ///
    /// let record = ActivityRecord::spend(100.0, "USD");
    /// assert!(record.has_spend_data());
    /// ```
    pub fn spend(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount: Some(amount),
            currency: Some(currency.into()),
            ..Self::default()
        }
    }

    /// Build an activity record
    pub fn activity(activity_amount: f64, activity_type: impl Into<String>) -> Self {
        Self {
            activity_amount: Some(activity_amount),
            activity_type: Some(activity_type.into()),
            ..Self::default()
        }
    }

    /// Build a record from classified fields
    ///
    /// Only extracted data is carried over; nothing from any prior record.
    pub fn from_classified(fields: &ClassifiedFields) -> Self {
        Self {
            supplier_name: Some(fields.supplier_name.clone()),
            amount: fields.amount,
            currency: Some(fields.currency.clone()),
            activity_amount: fields.activity_amount,
            activity_unit: fields.activity_unit.clone(),
            activity_type: Some(fields.activity_type.clone()),
            fuel_type: fields.fuel_type.clone(),
            vehicle_type: fields.vehicle_type.clone(),
            distance_km: fields.distance_km,
            mass_tonnes: fields.mass_tonnes,
            energy_kwh: fields.energy_kwh,
            scope: Some(fields.scope),
            category: Some(fields.category.clone()),
            subcategory: fields.subcategory.clone(),
            description: Some(fields.description.clone()).filter(|d| !d.is_empty()),
            date: fields.date,
            ..Self::default()
        }
    }

    /// Whether amount and currency are both usable
    pub fn has_spend_data(&self) -> bool {
        matches!(self.amount, Some(a) if a.is_finite() && a != 0.0)
            && self.currency.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    /// Whether an activity quantity is usable or derivable
    ///
    /// `energy_kwh` and `distance_km` stand in for a missing
    /// `activity_amount`; `mass_tonnes` alone does not.
    pub fn has_activity_data(&self) -> bool {
        [self.activity_amount, self.energy_kwh, self.distance_km]
            .into_iter()
            .any(|q| matches!(q, Some(q) if q.is_finite() && q != 0.0))
    }

    /// First non-empty free-text field (description, notes, source text)
    pub fn free_text(&self) -> Option<&str> {
        [&self.description, &self.notes, &self.source_text]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .find(|t| !t.trim().is_empty())
    }

    /// Effective scope (defaults to 3)
    pub fn scope_or_default(&self) -> Scope {
        self.scope.unwrap_or_default()
    }

    /// Whether emissions have already been stamped
    pub fn is_calculated(&self) -> bool {
        self.emissions_kgco2e.is_some()
    }

    /// Stamp a calculation result onto the record
    pub fn apply_calculation(&mut self, result: &CalculationResult) {
        self.emissions_kgco2e = Some(result.emissions_kgco2e);
        self.calculation_method = Some(result.method.as_str().to_string());
        self.calculation_details = Some(result.details.clone());
        self.calculation_metadata = Some(result.metadata.clone());
    }
}
