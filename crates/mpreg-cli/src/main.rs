//! mpreg - upgradeable marketplace registry operator - Entry Point

use anyhow::Result;
use clap::Parser;
use mpreg_cli::{AppConfig, Application, Cli, CommandOutput};
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine config path: CLI arg > MPREG_CONFIG env var > default
    let config_path = AppConfig::resolve_path(cli.config.as_deref());
    let config = AppConfig::load(&config_path)?;

    mpreg_telemetry::init_logging(&config.telemetry.log_level)?;
    info!(config_path = %config_path, "mpreg v{}", env!("CARGO_PKG_VERSION"));

    let app = Application::new(config)?;
    match app.execute(cli.command)? {
        CommandOutput::Text(text) => print!("{text}"),
        output => println!("{}", serde_json::to_string_pretty(&output)?),
    }

    Ok(())
}
