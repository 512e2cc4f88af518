#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless chase session.
//!
//! A scripted player drives around the level while one pursuer per enemy
//! spawn wanders and chases it. The adapter prints a trace line per simulated
//! second and a summary once the requested number of fixed steps has run.

mod settings;
mod simulation;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use chase_world::{Level, DEFAULT_LAYOUT, DEFAULT_TILE_LENGTH};
use clap::Parser;

use crate::{settings::Settings, simulation::Simulation};

/// Log filter applied when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info";

/// Simulation time between two trace lines.
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
#[command(name = "chase", about = "Headless vehicle chase simulation", version)]
struct Cli {
    /// ASCII layout file: `.` road, `#` blocked, `P` player spawn, `E` enemy spawn.
    /// Uses the built-in level when omitted.
    #[arg(long, value_name = "PATH")]
    layout: Option<PathBuf>,

    /// Number of fixed steps to simulate.
    #[arg(long, default_value_t = 1_500)]
    ticks: u64,

    /// Seed for the player's scripted input and the pursuers' wandering.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Length of one fixed step in milliseconds.
    #[arg(
        long,
        default_value_t = 20,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    fixed_step_ms: u64,

    /// TOML file with optional `[pursuit]` and `[driver]` tables.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit trace lines and the summary as JSON lines.
    #[arg(long)]
    json: bool,
}

/// Entry point for the chase command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER),
    )
    .init();

    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let level = load_level(cli.layout.as_deref())?;
    let mut simulation = Simulation::new(
        level,
        &settings,
        cli.seed,
        Duration::from_millis(cli.fixed_step_ms),
    )?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut next_report = REPORT_INTERVAL;

    for _ in 0..cli.ticks {
        simulation.step();
        if simulation.elapsed() >= next_report {
            let snapshot = simulation.snapshot();
            if cli.json {
                serde_json::to_writer(&mut out, &snapshot)?;
                writeln!(out)?;
            } else {
                writeln!(out, "{snapshot}")?;
            }
            next_report += REPORT_INTERVAL;
        }
    }

    let summary = simulation.summary();
    log::info!(
        "session finished after {:?} with {} contacts",
        simulation.elapsed(),
        summary.total_contacts()
    );
    if cli.json {
        serde_json::to_writer(&mut out, &summary)?;
        writeln!(out)?;
    } else {
        write!(out, "{summary}")?;
    }
    out.flush()?;

    Ok(())
}

fn load_level(path: Option<&Path>) -> Result<Level> {
    match path {
        Some(path) => {
            let layout = fs::read_to_string(path)
                .with_context(|| format!("failed to read layout from {}", path.display()))?;
            Level::parse(&layout, DEFAULT_TILE_LENGTH)
                .with_context(|| format!("invalid layout in {}", path.display()))
        }
        None => Level::parse(DEFAULT_LAYOUT, DEFAULT_TILE_LENGTH)
            .context("built-in layout is invalid"),
    }
}
