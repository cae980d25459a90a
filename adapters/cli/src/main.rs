#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for the fortune wheel.
//!
//! Each invocation loads the saved blobs, runs one action and writes the
//! blobs back when the action changed anything.

mod app;
mod store;

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use app::{Action, App};
use chrono::Utc;
use clap::Parser;
use fortune_wheel_core::FairnessMode;
use fortune_wheel_system_selector::Config;
use store::Store;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Fortune wheel that favours participants with the lowest running totals.
#[derive(Debug, Parser)]
#[command(name = "fortune-wheel", version, about)]
struct Cli {
    /// Directory holding the saved history, roster and shield setting.
    #[arg(
        long,
        global = true,
        env = "FORTUNE_WHEEL_DATA_DIR",
        default_value = ".fortune-wheel"
    )]
    data_dir: PathBuf,
    /// How strongly low totals are favoured: mild, normal or aggressive.
    #[arg(long, global = true, default_value_t = FairnessMode::default())]
    mode: FairnessMode,
    /// Seed for reproducible spins.
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    action: Action,
}

/// Entry point for the fortune wheel command-line interface.
fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    debug!(data_dir = %cli.data_dir.display(), mode = %cli.mode, "starting");

    let store = Store::new(&cli.data_dir);
    let selector = cli.seed.map_or_else(Config::from_entropy, Config::seeded);
    let mut app = App::new(store.load(), selector, cli.mode);

    let report = app.execute(cli.action, Utc::now());
    if report.changed {
        store.save(&app.saved_state());
    }

    let mut stdout = io::stdout().lock();
    for line in &report.lines {
        writeln!(stdout, "{line}").context("failed to write output")?;
    }
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("{error}"))
        .context("failed to initialise logging")
}
