use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lotto_simulator::{run_draws, DrawConfig, Scenario};
use lotto_types::Mode;
use serde::Serialize;
use tracing::info;

fn init_tracing(level: tracing::Level) {
    // Reports go to stdout; keep logs off it.
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log verbosity (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value_t = tracing::Level::INFO)]
    log_level: tracing::Level,

    /// Pretty-print the JSON report.
    #[arg(long, global = true, default_value_t = false)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scenario file and print every round's settlement.
    Series {
        #[arg(long)]
        scenario: PathBuf,
    },
    /// Simulate seeded random draws with the standard rules for a mode.
    Draw {
        #[arg(long, default_value_t = 100)]
        players: usize,

        /// Amount each player spends per round (multiple of the ticket price).
        #[arg(long, default_value_t = 10_000)]
        spend: i64,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        #[arg(long, default_value_t = Mode::Parimutuel)]
        mode: Mode,

        #[arg(long, default_value_t = 1)]
        rounds: usize,
    },
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("failed to serialize report")?;
    println!("{rendered}");
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Series { scenario } => {
            let scenario = Scenario::load(scenario)?;
            let outputs = scenario.run().context("scenario settlement failed")?;
            info!(rounds = outputs.len(), "scenario complete");
            print_json(&outputs, args.pretty)
        }
        Command::Draw {
            players,
            spend,
            seed,
            mode,
            rounds,
        } => {
            let config = DrawConfig {
                players: *players,
                spend: *spend,
                seed: *seed,
                mode: *mode,
                rounds: *rounds,
            };
            let reports = run_draws(&config)?;
            print_json(&reports, args.pretty)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level);
    run(&args)
}
