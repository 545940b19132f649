use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod config;
mod host;
mod scenario;
mod serve;
mod world;

use config::SimConfig;
use scenario::{ScenarioParams, Summary};
use serve::ServeArgs;

#[derive(Parser)]
#[command(
    name = "zonal-sim",
    version,
    about = "Zone handoff and scope simulation"
)]
struct Cli {
    /// JSON settings; fields left out keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Number of zones, overriding the settings file.
    #[arg(long, global = true)]
    zones: Option<u32>,
    /// Zone edge length, overriding the settings file.
    #[arg(long, global = true)]
    zone_width: Option<f32>,
    /// Handoff timeout, overriding the settings file.
    #[arg(long, global = true)]
    handoff_timeout_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs the authority, one server per zone and the players in-process.
    Scenario {
        #[arg(long, default_value_t = 2)]
        clients: u32,
        #[arg(long, default_value_t = 5000)]
        duration_ms: u64,
        #[arg(long, default_value_t = 10)]
        step_ms: u64,
        /// Walker speed in units per second.
        #[arg(long, default_value_t = 8.0)]
        speed: f32,
        /// Write the summary here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Fail if more handoffs than this were rolled back.
        #[arg(long)]
        max_rollbacks: Option<u32>,
    },
    /// Runs a single node over UDP.
    Serve(ServeArgs),
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut config = SimConfig::load(cli.config.as_deref())?;
    if let Some(zones) = cli.zones {
        config.layout.zones = zones;
    }
    if let Some(width) = cli.zone_width {
        config.layout.zone_width = width;
    }
    if let Some(timeout) = cli.handoff_timeout_ms {
        config.zone.handoff_timeout_ms = timeout;
    }

    match cli.command {
        Command::Scenario {
            clients,
            duration_ms,
            step_ms,
            speed,
            out,
            max_rollbacks,
        } => {
            let params = ScenarioParams {
                clients,
                duration_ms,
                step_ms,
                speed,
            };
            let summary = scenario::run(&config, params)?;
            write_summary(out.as_deref(), &summary)?;
            if let Some(max) = max_rollbacks {
                if summary.tally.rollbacks > max {
                    anyhow::bail!(
                        "{} handoffs rolled back, budget is {max}",
                        summary.tally.rollbacks
                    );
                }
            }
        }
        Command::Serve(args) => serve::run(&config, &args)?,
    }
    Ok(())
}

fn write_summary(out: Option<&Path>, summary: &Summary) -> Result<()> {
    let contents = serde_json::to_string_pretty(summary).context("serialize summary")?;
    match out {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("create output dir {}", dir.display()))?;
            }
            fs::write(path, contents).with_context(|| format!("write {}", path.display()))
        }
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}
