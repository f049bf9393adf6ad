//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use carbonlens_calculator::{BatchOutcome, CalculationSummary};
use carbonlens_classifier::TierAvailability;
use carbonlens_domain::{ClassificationResult, EmissionFactor, UncertaintyEstimate};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a classification result.
    pub fn format_classification(&self, result: &ClassificationResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
            OutputFormat::Table => Ok(self.format_classification_table(result)),
            OutputFormat::Quiet => Ok(self.format_classification_quiet(result)),
        }
    }

    fn format_classification_table(&self, result: &ClassificationResult) -> String {
        let Some(data) = result.data.as_ref().filter(|_| result.success) else {
            return self.error(result.error.as_deref().unwrap_or("Classification failed"));
        };

        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        builder.push_record(["Supplier", data.supplier_name.as_str()]);
        builder.push_record(["Activity", data.activity_type.as_str()]);
        builder.push_record(["Amount", &optional_number(data.amount)]);
        builder.push_record(["Currency", data.currency.as_str()]);
        builder.push_record(["Scope", &data.scope.to_string()]);
        builder.push_record(["Category", data.category.as_str()]);
        if let Some(quantity) = data.activity_amount {
            let unit = data.activity_unit.as_deref().unwrap_or("");
            builder.push_record(["Quantity", format!("{} {}", quantity, unit).trim()]);
        }
        if let Some(fuel) = &data.fuel_type {
            builder.push_record(["Fuel", fuel.as_str()]);
        }
        if let Some(date) = data.date {
            builder.push_record(["Date", &date.to_string()]);
        }
        builder.push_record(["Description", data.description.as_str()]);
        builder.push_record(["Confidence", &format!("{:.2}", result.confidence_score.value())]);
        builder.push_record(["Model", result.model_used.as_str()]);

        let mut output = styled(builder);
        if result.needs_human_review {
            output.push('\n');
            output.push_str(&self.warning("Low confidence: flagged for human review"));
        }
        output
    }

    fn format_classification_quiet(&self, result: &ClassificationResult) -> String {
        match &result.data {
            Some(data) if result.success => format!(
                "{}\t{}\t{}",
                data.supplier_name,
                data.activity_type,
                optional_number(data.amount)
            ),
            _ => String::new(),
        }
    }

    /// Format a calculated batch together with its summary.
    pub fn format_batch(&self, outcome: &BatchOutcome, summary: &CalculationSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "calculated": outcome.calculated,
                "failed": outcome.failed,
                "summary": summary,
            }))?),
            OutputFormat::Table => Ok(self.format_batch_table(outcome, summary)),
            OutputFormat::Quiet => Ok(format!("{:.2}", summary.total_emissions_kgco2e)),
        }
    }

    fn format_batch_table(&self, outcome: &BatchOutcome, summary: &CalculationSummary) -> String {
        if outcome.is_empty() {
            return self.colorize("No records found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Supplier", "Emissions (kg CO2e)", "Method", "Details"]);

        for record in &outcome.calculated {
            let id = record.id.to_string();
            builder.push_record([
                &id[..id.len().min(8)],
                record.supplier_name.as_deref().unwrap_or("-"),
                &optional_number(record.emissions_kgco2e),
                record.calculation_method.as_deref().unwrap_or("-"),
                record.calculation_details.as_deref().unwrap_or("-"),
            ]);
        }

        let mut output = styled(builder);

        for failed in &outcome.failed {
            output.push('\n');
            output.push_str(&self.error(&format!("{}: {}", failed.record.id, failed.error)));
        }

        output.push('\n');
        output.push_str(&self.info(&format!(
            "{} of {} record(s) calculated ({:.0}%), total {:.2} kg CO2e",
            summary.calculated_records,
            summary.total_records,
            summary.success_rate * 100.0,
            summary.total_emissions_kgco2e
        )));
        output
    }

    /// Format an uncertainty estimate.
    pub fn format_uncertainty(&self, estimate: &UncertaintyEstimate) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(estimate)?),
            OutputFormat::Quiet => Ok(format!("{:.2}\t{:.2}", estimate.lower_bound, estimate.upper_bound)),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Base (kg CO2e)", "Lower", "Upper", "Confidence", "Samples"]);
                builder.push_record([
                    format!("{:.2}", estimate.base_emissions),
                    format!("{:.2}", estimate.lower_bound),
                    format!("{:.2}", estimate.upper_bound),
                    format!("{:.0}%", estimate.confidence_level * 100.0),
                    estimate.iterations.to_string(),
                ]);
                Ok(styled(builder))
            }
        }
    }

    /// Format the factor catalog.
    pub fn format_factors(&self, factors: &[EmissionFactor]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(factors)?),
            OutputFormat::Quiet => Ok(factors
                .iter()
                .map(|f| format!("{}\t{}", f.activity_category, f.value))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if factors.is_empty() {
                    return Ok(self.colorize("No factors in catalog.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Category", "Scope", "Region", "Description", "Value", "Unit", "±%", "Source"]);
                for factor in factors {
                    builder.push_record([
                        factor.activity_category.clone(),
                        factor.scope.to_string(),
                        factor.region.clone().unwrap_or_else(|| "-".to_string()),
                        factor.description.clone().unwrap_or_else(|| "-".to_string()),
                        factor.value.to_string(),
                        factor.unit.clone(),
                        factor.uncertainty_pct.to_string(),
                        factor.source.clone(),
                    ]);
                }
                Ok(styled(builder))
            }
        }
    }

    /// Format tier availability.
    pub fn format_availability(&self, report: &[TierAvailability]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(report
                .iter()
                .filter(|t| t.available)
                .map(|t| t.tier.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Tier", "Backend", "Status", "Models"]);
                for tier in report {
                    let status = if tier.available {
                        self.colorize("available", "green")
                    } else {
                        let reason = tier.error.as_deref().unwrap_or("unavailable");
                        self.colorize(reason, "red")
                    };
                    builder.push_record([
                        tier.tier.to_string(),
                        tier.backend.clone(),
                        status,
                        tier.models.join(", "),
                    ]);
                }
                Ok(styled(builder))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn styled(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn optional_number(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use carbonlens_calculator::summarize;
    use carbonlens_domain::{
        ActivityRecord, ClassificationTier, ClassifiedFields, ConfidenceScore, Scope,
    };

    fn classified() -> ClassificationResult {
        ClassificationResult::success(
            ClassifiedFields {
                supplier_name: "Shell".to_string(),
                activity_type: "transportation".to_string(),
                amount: Some(85.5),
                currency: "EUR".to_string(),
                ..ClassifiedFields::default()
            },
            ConfidenceScore::new(0.4),
            true,
            "ollama:llama3.2",
            ClassificationTier::LocalModel,
        )
    }

    fn calculated(amount: f64) -> ActivityRecord {
        let mut record = ActivityRecord::spend(amount, "USD");
        record.emissions_kgco2e = Some(amount * 0.5);
        record.calculation_method = Some("spend_based_default_factor".to_string());
        record
    }

    #[test]
    fn test_classification_table_flags_review() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_classification(&classified()).unwrap();
        assert!(output.contains("Shell"));
        assert!(output.contains("85.50"));
        assert!(output.contains("human review"));
    }

    #[test]
    fn test_classification_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_classification(&classified()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["model_used"], "ollama:llama3.2");
        assert_eq!(value["data"]["supplier_name"], "Shell");
    }

    #[test]
    fn test_failed_classification_quiet_is_empty() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter
            .format_classification(&ClassificationResult::failure("no tiers"))
            .unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_batch_quiet_prints_total() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let outcome = BatchOutcome {
            calculated: vec![calculated(100.0), calculated(20.0)],
            failed: Vec::new(),
        };
        let summary = summarize(&outcome.calculated);
        assert_eq!(formatter.format_batch(&outcome, &summary).unwrap(), "60.00");
    }

    #[test]
    fn test_batch_table_lists_failures() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let outcome = BatchOutcome {
            calculated: vec![calculated(10.0)],
            failed: vec![carbonlens_calculator::FailedRecord {
                record: ActivityRecord::new(),
                error: "insufficient data".to_string(),
            }],
        };
        let summary = summarize(&outcome.calculated);
        let output = formatter.format_batch(&outcome, &summary).unwrap();
        assert!(output.contains("spend_based_default_factor"));
        assert!(output.contains("✗"));
        assert!(output.contains("insufficient data"));
    }

    #[test]
    fn test_empty_factor_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.format_factors(&[]).unwrap(), "No factors in catalog.");
    }

    #[test]
    fn test_factor_quiet() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let factor = EmissionFactor {
            activity_category: "waste".to_string(),
            scope: Scope::Three,
            region: None,
            description: None,
            value: 0.45,
            unit: "kg CO2e/kg".to_string(),
            uncertainty_pct: 20.0,
            source: "DEFRA".to_string(),
            version: None,
        };
        assert_eq!(formatter.format_factors(&[factor]).unwrap(), "waste\t0.45");
    }

    #[test]
    fn test_color_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("done"), "✓ done");
        assert_eq!(formatter.warning("careful"), "⚠ careful");
    }
}
