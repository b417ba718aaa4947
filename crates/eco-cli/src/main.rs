//! Headless driver for the ecosystem simulation.

mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use eco_core::{EcosystemConfig, TICKS_PER_DAY, TICKS_PER_HOUR};
use eco_world::Simulation;
use std::path::PathBuf;
use std::sync::Arc;
use telemetry::LogFormat;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "eco-sim")]
#[command(version)]
#[command(about = "Procedural terrain with a predator-prey ecosystem, run headless")]
struct Cli {
    /// Configuration file (JSON); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid width in tiles
    #[arg(long)]
    width: Option<usize>,

    /// Grid height in tiles
    #[arg(long)]
    height: Option<usize>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Ticks to simulate per episode
    #[arg(short, long, default_value_t = TICKS_PER_DAY)]
    ticks: u64,

    /// Log a population report every N ticks (0 disables)
    #[arg(long, default_value_t = TICKS_PER_HOUR)]
    report_every: u64,

    /// Regenerate the world and run again this many times
    #[arg(long, default_value_t = 0)]
    resets: u32,

    /// Write the final snapshot as JSON
    #[arg(long)]
    snapshot: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Print the effective configuration and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_telemetry(cli.log_format)?;

    let config = load_config(&cli)?;
    if cli.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    info!(
        width = config.world.width,
        height = config.world.height,
        seed = ?config.seed,
        ticks = cli.ticks,
        "Starting simulation"
    );

    let mut sim = Simulation::new(Arc::new(config)).context("failed to build simulation")?;

    for episode in 0..=cli.resets {
        if episode > 0 {
            sim.reset();
        }

        let report = sim.run(cli.ticks, cli.report_every);
        if report.failed_ticks > 0 {
            warn!(
                episode,
                failed_ticks = report.failed_ticks,
                "Episode finished with invariant violations"
            );
        }
        info!(
            event = "episode_summary",
            episode,
            clock = %sim.calendar(),
            births = report.births,
            deaths = report.deaths,
            population = ?sim.population_counts(),
            "Episode complete"
        );
    }

    if let Some(path) = &cli.snapshot {
        let json = sim.snapshot().to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        info!(path = %path.display(), "Snapshot written");
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<EcosystemConfig> {
    let mut config = match &cli.config {
        Some(path) => EcosystemConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EcosystemConfig::default(),
    };

    if let Some(width) = cli.width {
        config.world.width = width;
    }
    if let Some(height) = cli.height {
        config.world.height = height;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    config.validate()?;
    Ok(config)
}
