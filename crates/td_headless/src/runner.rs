//! Headless wave runner.
//!
//! Plays one scenario to completion with a simulated typist. Every event is
//! written to the output as one JSON object per line, followed by a final
//! `{"summary": ...}` line. Every command issued goes through a [`Replay`],
//! which can be saved for later verification.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use td_core::data::Catalog;
use td_core::error::CoreError;
use td_core::events::CombatEvent;
use td_core::math::Fixed;
use td_core::replay::{Replay, ReplayCommand};
use td_core::simulation::Simulation;
use td_core::summary::RunSummary;
use thiserror::Error;

use crate::scenario::{Scenario, ScenarioError};
use crate::typist::Typist;

/// Mixed into the run seed so the typist draws from its own stream.
pub const TYPIST_SEED_SALT: u64 = 0x5459_5049_5354;

/// Error type for headless runs.
#[derive(Error, Debug)]
pub enum RunError {
    /// Scenario could not be loaded.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// Core failure (replay IO, serialization).
    #[error(transparent)]
    Core(#[from] CoreError),
    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] io::Error),
    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The step length cannot advance the clock.
    #[error("Step length must be positive")]
    ZeroStep,
}

/// Headless runner configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Milliseconds advanced per step.
    pub step_ms: u32,
    /// Seed override; the scenario's wave seed is used otherwise.
    pub seed: Option<u64>,
    /// Save the recorded replay here.
    pub record_path: Option<PathBuf>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            step_ms: 100,
            seed: None,
            record_path: None,
        }
    }
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Scenario name.
    pub scenario: String,
    /// Seed used.
    pub seed: u64,
    /// Score sheet; `result` is `None` if the time limit hit first.
    pub summary: RunSummary,
    /// Final state hash.
    pub final_hash: u64,
    /// Steps executed.
    pub steps: u64,
    /// Game time at the end, in milliseconds.
    pub clock_ms: i64,
}

#[derive(Serialize)]
struct EventLine<'a> {
    clock_ms: i64,
    #[serde(flatten)]
    event: &'a CombatEvent,
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    summary: &'a RunOutcome,
}

fn millis(clock: Fixed) -> i64 {
    (clock * Fixed::from_num(1000)).to_num::<i64>()
}

/// Runs scenarios against a shared catalog.
pub struct HeadlessRunner {
    catalog: Arc<Catalog>,
    config: HeadlessConfig,
}

impl HeadlessRunner {
    /// Create a runner with default config.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_config(catalog, HeadlessConfig::default())
    }

    /// Create a runner with custom configuration.
    pub fn with_config(catalog: Arc<Catalog>, config: HeadlessConfig) -> Self {
        Self { catalog, config }
    }

    /// Play a scenario, writing JSON lines to `out`.
    pub fn run<W: Write>(&self, scenario: &Scenario, out: &mut W) -> Result<RunOutcome, RunError> {
        if self.config.step_ms == 0 {
            return Err(RunError::ZeroStep);
        }
        let seed = self.config.seed.unwrap_or(scenario.wave.seed);
        tracing::info!(scenario = %scenario.name, seed, "Starting run");

        let mut sim = Simulation::with_field(Arc::clone(&self.catalog), seed, scenario.wave.field);
        let mut replay = Replay::new(scenario.name.clone(), &sim)?;
        let mut typist = Typist::new(scenario.typist, seed ^ TYPIST_SEED_SALT);

        for placement in &scenario.towers {
            let command = ReplayCommand::PlaceTower {
                kind: placement.kind,
                position: placement.position,
            };
            let events = replay.execute(&mut sim, command);
            write_events(out, sim.clock(), &events)?;
        }
        let events = replay.execute(&mut sim, ReplayCommand::StartWave(scenario.wave.clone()));
        write_events(out, sim.clock(), &events)?;

        let delta = Fixed::from_num(self.config.step_ms) / Fixed::from_num(1000);
        let limit = Fixed::from_num(scenario.max_seconds);
        let mut steps = 0u64;
        while sim.is_running() && sim.clock() < limit {
            let input = typist.keystrokes(delta, sim.state());
            let events = replay.execute(&mut sim, ReplayCommand::Step { delta, input });
            write_events(out, sim.clock(), &events)?;
            steps += 1;
        }

        let final_hash = sim.state_hash();
        replay.finalize(final_hash);
        if let Some(path) = &self.config.record_path {
            replay.save(path)?;
            tracing::info!(path = %path.display(), commands = replay.command_count(), "Replay saved");
        }

        let outcome = RunOutcome {
            scenario: scenario.name.clone(),
            seed,
            summary: sim.finalize(),
            final_hash,
            steps,
            clock_ms: millis(sim.clock()),
        };
        if outcome.summary.result.is_none() {
            tracing::warn!(clock_ms = outcome.clock_ms, "Time limit reached before the wave ended");
        }
        serde_json::to_writer(&mut *out, &SummaryLine { summary: &outcome })?;
        writeln!(out)?;
        out.flush()?;

        tracing::info!(
            result = ?outcome.summary.result,
            score = outcome.summary.score,
            steps,
            "Run complete"
        );
        Ok(outcome)
    }
}

fn write_events<W: Write>(out: &mut W, clock: Fixed, events: &[CombatEvent]) -> Result<(), RunError> {
    let clock_ms = millis(clock);
    for event in events {
        serde_json::to_writer(&mut *out, &EventLine { clock_ms, event })?;
        writeln!(out)?;
    }
    Ok(())
}
