//! Headless wave runner.
//!
//! Plays waves without any presentation layer, for CI, replay verification
//! and balance batches.
//!
//! # Usage
//!
//! ```bash
//! # Run the default scenario
//! cargo run -p td_headless
//!
//! # Run a scenario file with a fixed seed, recording a replay
//! cargo run -p td_headless -- run --scenario waves/boss.ron --seed 42 --record boss.replay
//!
//! # Verify a replay
//! cargo run -p td_headless -- replay --file boss.replay --verify
//!
//! # Run a batch of seeds
//! cargo run -p td_headless -- batch --scenario boss_day --count 500 --output results/boss.json
//! ```
//!
//! Events go to stdout as JSON lines; logs go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use td_core::data::Catalog;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use td_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{HeadlessConfig, HeadlessRunner},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "td_headless")]
#[command(about = "Headless wave runner for CI and balance testing")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one wave and print its events
    Run {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "standard_defense")]
        scenario: String,

        /// Seed (defaults to the scenario's wave seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Milliseconds per step
        #[arg(long, default_value = "100")]
        step_ms: u32,

        /// Save a replay of the run
        #[arg(short, long)]
        record: Option<PathBuf>,
    },

    /// Play back a recorded replay
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Verify replay produces identical hash
        #[arg(long)]
        verify: bool,
    },

    /// Run a batch of seeds in parallel
    Batch {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "standard_defense")]
        scenario: String,

        /// Number of runs
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel runs (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Write full results as JSON here; the summary always goes to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "standard_defense")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs to stderr; stdout carries JSON
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let catalog = Catalog::builtin().shared();

    match cli.command {
        Some(Commands::Run {
            scenario,
            seed,
            step_ms,
            record,
        }) => cmd_run(&catalog, &scenario, seed, step_ms, record),
        Some(Commands::Replay { file, verify }) => cmd_replay(&catalog, file, verify),
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            seed,
            output,
        }) => cmd_batch(&catalog, &scenario, count, parallel, seed, output),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
        }) => cmd_verify(&catalog, &scenario, seed, runs),
        None => cmd_run(&catalog, "standard_defense", None, 100, None),
    }
}

fn load_scenario(name: &str) -> Scenario {
    match Scenario::resolve(name) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load scenario: {}", e);
            std::process::exit(1);
        }
    }
}

/// Play one wave
fn cmd_run(
    catalog: &Arc<Catalog>,
    scenario: &str,
    seed: Option<u64>,
    step_ms: u32,
    record: Option<PathBuf>,
) {
    let scenario = load_scenario(scenario);
    let runner = HeadlessRunner::with_config(
        Arc::clone(catalog),
        HeadlessConfig {
            step_ms,
            seed,
            record_path: record,
        },
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match runner.run(&scenario, &mut out) {
        Ok(outcome) => {
            eprintln!(
                "Result: {:?}, score {} (hash {:016x})",
                outcome.summary.result, outcome.summary.score, outcome.final_hash
            );
        }
        Err(e) => {
            eprintln!("Run failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Play back or verify a replay
fn cmd_replay(catalog: &Arc<Catalog>, file: PathBuf, verify: bool) {
    use td_core::replay::{Replay, ReplayPlayer};

    if verify {
        tracing::info!("Verifying replay: {}", file.display());
    } else {
        tracing::info!("Playing replay: {}", file.display());
    }

    let replay = match Replay::load(&file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to load replay: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("Loaded replay:");
    eprintln!("  Scenario: {}", replay.scenario_id);
    eprintln!("  Seed: {}", replay.seed);
    eprintln!("  Commands: {}", replay.command_count());

    if verify {
        match replay.verify(Arc::clone(catalog)) {
            Ok(hash) => {
                eprintln!("PASS: Replay verification successful");
                eprintln!("  Hash: {:016x}", hash);
            }
            Err(e) => {
                eprintln!("FAIL: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let mut player = match ReplayPlayer::new(replay, Arc::clone(catalog)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to create replay player: {}", e);
            std::process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut last_percent = 0;
    while let Some(events) = player.advance() {
        for event in &events {
            match serde_json::to_string(event) {
                Ok(line) => {
                    if writeln!(out, "{line}").is_err() {
                        std::process::exit(1);
                    }
                }
                Err(e) => tracing::warn!(%e, "Event not encodable"),
            }
        }
        let percent = player.progress_percent();
        if percent >= last_percent + 10 {
            eprintln!("Progress: {}%", percent);
            last_percent = percent;
        }
    }

    let sim = player.simulation();
    eprintln!("Replay complete after {} commands", player.position());
    eprintln!("Final state hash: {:016x}", sim.state_hash());
    eprintln!("Result: {:?}", sim.result());
}

/// Run a batch of seeds
fn cmd_batch(
    catalog: &Arc<Catalog>,
    scenario: &str,
    count: u32,
    parallel: u32,
    seed: u64,
    output: Option<PathBuf>,
) {
    let scenario = load_scenario(scenario);
    let config = BatchConfig {
        game_count: count,
        seed_start: seed,
        parallel_games: parallel,
        ..BatchConfig::default()
    };
    let results = run_batch(catalog, &scenario, config);

    if let Some(path) = output {
        if let Err(e) = results.save(&path) {
            eprintln!("FATAL: Failed to save results: {}", e);
            std::process::exit(1);
        }
        eprintln!("Results saved to: {}", path.display());
    }

    match serde_json::to_string_pretty(&results.summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to encode summary: {}", e);
            std::process::exit(1);
        }
    }

    if !results.errors.is_empty() {
        eprintln!("Runs FAILED: {}", results.errors.len());
        for error in results.errors.iter().take(10) {
            eprintln!(
                "  Run {} (seed {}): {}",
                error.game_index, error.seed, error.message
            );
        }
        std::process::exit(1);
    }
}

/// Verify determinism
fn cmd_verify(catalog: &Arc<Catalog>, scenario: &str, seed: u64, runs: u32) {
    let scenario = load_scenario(scenario);
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario.name,
        seed,
        runs
    );

    if verify_determinism(catalog, &scenario, seed, runs) {
        eprintln!("PASS: All {} runs produced identical results", runs);
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}
