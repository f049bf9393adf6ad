//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// carbonlens - Classify activity text and calculate GHG emissions.
#[derive(Debug, Parser)]
#[command(name = "carbonlens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings that may come from the environment.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Local model service URL
    #[arg(long, env = "OLLAMA_BASE_URL", global = true)]
    pub ollama_url: Option<String>,

    /// Cloud model API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub openai_api_key: Option<String>,

    /// Review threshold for classification confidence
    #[arg(long, env = "AI_CONFIDENCE_THRESHOLD", global = true)]
    pub confidence_threshold: Option<f64>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (bare values)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify free text into a structured record
    Classify(ClassifyArgs),

    /// Calculate emissions for a batch of records
    Calculate(CalculateArgs),

    /// Put a confidence interval around an emissions estimate
    Uncertainty(UncertaintyArgs),

    /// Manage the emission factor catalog
    Factors(FactorsArgs),

    /// Show which classification tiers are available
    Backends,
}

/// Arguments for the classify command.
#[derive(Debug, Parser)]
pub struct ClassifyArgs {
    /// Text to classify
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(short = 'F', long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Read the text from stdin
    #[arg(long, conflicts_with_all = ["text", "file"])]
    pub stdin: bool,

    /// Known supplier name
    #[arg(short, long)]
    pub supplier: Option<String>,
}

/// Arguments for the calculate command.
#[derive(Debug, Parser)]
pub struct CalculateArgs {
    /// JSON file containing an array of records
    #[arg(short = 'F', long)]
    pub file: Option<PathBuf>,

    /// Read the JSON array from stdin
    #[arg(long, conflicts_with = "file")]
    pub stdin: bool,

    /// Skip text extraction for records without structured amounts
    #[arg(long)]
    pub no_extraction: bool,
}

/// Arguments for the uncertainty command.
#[derive(Debug, Parser)]
pub struct UncertaintyArgs {
    /// Activity amount (kg fuel, kWh, ...)
    #[arg(short, long)]
    pub amount: f64,

    /// Fuel whose factor and uncertainty are used
    #[arg(long, conflicts_with_all = ["factor", "uncertainty"], required_unless_present = "factor")]
    pub fuel: Option<String>,

    /// Region for the fuel factor adjustment
    #[arg(short, long, requires = "fuel")]
    pub region: Option<String>,

    /// Explicit emission factor
    #[arg(long, requires = "uncertainty")]
    pub factor: Option<f64>,

    /// Explicit factor uncertainty in percent
    #[arg(short, long, requires = "factor")]
    pub uncertainty: Option<f64>,

    /// Confidence level in (0, 1)
    #[arg(long, default_value = "0.95")]
    pub confidence: f64,
}

/// Arguments for the factors command.
#[derive(Debug, Parser)]
pub struct FactorsArgs {
    #[command(subcommand)]
    pub action: FactorsAction,
}

/// Factor catalog actions.
#[derive(Debug, Subcommand)]
pub enum FactorsAction {
    /// List every factor in the catalog
    List,

    /// Import factors from a JSON array
    Import {
        /// JSON file containing factors
        #[arg(short = 'F', long)]
        file: PathBuf,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
