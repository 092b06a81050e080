use std::collections::HashSet;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use ovning_config::OvningConfig;
use ovning_core::model::ScenarioInput;
use ovning_engine::SimulationEngine;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse and normalize a scenario file, printing the stored form
    Validate(ValidateArgs),
    /// Run one live session of a scenario and print the debrief
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Scenario YAML file
    #[arg(short, long)]
    pub scenario: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Scenario YAML file
    #[arg(short, long)]
    pub scenario: PathBuf,
    /// Tie the session to a live operation id (forwards dispatches to the sink)
    #[arg(long)]
    pub operation: Option<String>,
    /// Who is starting the session
    #[arg(long, default_value = "cli")]
    pub starter: String,
    /// Time-compression factor: scripted trigger delays are divided by this,
    /// so `--speed 2` fires a 60s cue after 30s of wall clock
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,
}

pub async fn run_command(
    cli: Cli,
    config: OvningConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match cli.command {
        Commands::Validate(args) => validate_scenario(args, config),
        Commands::Run(args) => run_session(args, config).await,
    }
}

fn load_input(path: &PathBuf) -> Result<ScenarioInput, Box<dyn std::error::Error + Send + Sync>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&raw)?)
}

fn validate_scenario(
    args: ValidateArgs,
    config: OvningConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let engine = SimulationEngine::new(config.engine);
    let scenario = engine.create_scenario(load_input(&args.scenario)?)?;
    println!("{}", serde_yaml::to_string(&scenario)?);
    Ok(())
}

/// Divides every scripted trigger offset by `speed`, rounding to whole
/// seconds. The scenario authored for the run is already compressed, so the
/// session timeline reports the compressed offsets it actually ran at.
fn compress_offsets(mut input: ScenarioInput, speed: f64) -> ScenarioInput {
    if speed == 1.0 {
        return input;
    }
    if let Some(triggers) = input.triggers.as_mut() {
        for trigger in triggers {
            trigger.offset_seconds = (trigger.offset_seconds as f64 / speed).round() as i64;
        }
    }
    input
}

async fn run_session(
    args: RunArgs,
    config: OvningConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !(args.speed.is_finite() && args.speed > 0.0) {
        return Err("--speed must be a positive number".into());
    }
    let engine = SimulationEngine::new(config.engine);
    let input = compress_offsets(load_input(&args.scenario)?, args.speed);
    let scenario = engine.create_scenario(input)?;
    info!(scenario_id = %scenario.id, triggers = scenario.triggers.len(), "Scenario authored");

    let mut snapshots = engine.subscribe();
    let session = engine.start_session(&scenario.id, args.operation, &args.starter)?;
    println!("session {} started on '{}'", session.id, scenario.title);

    if scenario.triggers.is_empty() {
        // Nothing scripted to wait for; produce the debrief immediately.
        engine.stop_session(&session.id, true)?;
    }

    let mut seen: HashSet<String> = HashSet::new();
    loop {
        let snapshot = match snapshots.recv().await {
            Ok(snapshot) => snapshot,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Snapshot receiver lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        for event in snapshot
            .timeline
            .iter()
            .filter(|e| e.session_id == session.id)
        {
            if seen.insert(event.id.clone()) {
                println!(
                    "[{:>5}s] {:?} {} - {}",
                    event.time_offset_seconds, event.severity, event.title, event.message
                );
            }
        }
        let done = snapshot
            .sessions
            .iter()
            .find(|s| s.id == session.id)
            .map(|s| s.status.is_terminal())
            .unwrap_or(false);
        if done {
            break;
        }
    }

    match engine.result_for(&session.id) {
        Some(result) => println!("{}", serde_yaml::to_string(&result)?),
        None => warn!(session_id = %session.id, "Session ended without a debrief"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use ovning_core::model::{ScenarioInput, TriggerInput};

    use super::{compress_offsets, Cli, Commands};

    fn input_with_offsets(offsets: &[i64]) -> ScenarioInput {
        ScenarioInput {
            triggers: Some(
                offsets
                    .iter()
                    .map(|&offset_seconds| TriggerInput {
                        offset_seconds,
                        event_type: "radio".into(),
                        title: "Check-in".into(),
                        message: "Routine".into(),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn speed_flag_parses_and_defaults_to_real_time() {
        let cli = Cli::parse_from(["ovning", "run", "--scenario", "s.yaml", "--speed", "4"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.speed, 4.0);

        let cli = Cli::parse_from(["ovning", "run", "--scenario", "s.yaml"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.speed, 1.0);
    }

    #[test]
    fn compress_offsets_divides_trigger_delays() {
        let compressed = compress_offsets(input_with_offsets(&[60, 25]), 2.0);
        let triggers = compressed.triggers.unwrap();
        assert_eq!(triggers[0].offset_seconds, 30);
        // 12.5 rounds to the nearest whole second.
        assert_eq!(triggers[1].offset_seconds, 13);
    }

    #[test]
    fn real_time_speed_leaves_offsets_untouched() {
        let unchanged = compress_offsets(input_with_offsets(&[10, 45]), 1.0);
        let triggers = unchanged.triggers.unwrap();
        assert_eq!(triggers[0].offset_seconds, 10);
        assert_eq!(triggers[1].offset_seconds, 45);
    }
}
