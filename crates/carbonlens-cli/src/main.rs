//! carbonlens CLI - Classify activity text and calculate GHG emissions.

use carbonlens_cli::commands;
use carbonlens_cli::{Cli, Command, Config, Formatter};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> carbonlens_cli::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(&cli.overrides);
    config.validate()?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Classify(args) => commands::execute_classify(args, &config, &formatter)?,
        Command::Calculate(args) => commands::execute_calculate(args, &config, &formatter)?,
        Command::Uncertainty(args) => commands::execute_uncertainty(args, &config, &formatter)?,
        Command::Factors(args) => commands::execute_factors(args, &config, &formatter)?,
        Command::Backends => commands::execute_backends(&config, &formatter)?,
    }

    Ok(())
}
