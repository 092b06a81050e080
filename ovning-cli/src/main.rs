//! ## ovning-cli
//! **Operational interface for the training-scenario engine**
//!
//! Authors scenarios from YAML files and runs live rehearsal sessions,
//! printing the timeline as it unfolds and the debrief at the end.

use clap::Parser;

use ovning_config::OvningConfig;
use ovning_telemetry::logging::EventLogger;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = OvningConfig::load()?;
    EventLogger::init(&config.telemetry.log_level);
    let cli = Cli::parse();
    commands::run_command(cli, config).await
}
