//! Headless wave runner for CI and balance testing.
//!
//! Drives the combat core without any presentation layer:
//!
//! - **Single runs**: one scenario played by a seeded simulated typist
//! - **Replay verification**: recorded command streams must reproduce their hash
//! - **Batches**: many seeds in parallel, aggregated into win rate and score
//!
//! # Output
//!
//! - **stdout**: events as JSON lines, then a summary line
//! - **stderr**: logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Play the default scenario
//! cargo run -p td_headless -- run --seed 7
//!
//! # Record and verify a replay
//! cargo run -p td_headless -- run --scenario boss_day --record boss.replay
//! cargo run -p td_headless -- replay --file boss.replay --verify
//!
//! # Batch of 200 seeds
//! cargo run -p td_headless -- batch --count 200 --output results/batch.json
//! ```

pub mod batch;
pub mod runner;
pub mod scenario;
pub mod typist;

pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary};
pub use runner::{HeadlessConfig, HeadlessRunner, RunError, RunOutcome};
pub use scenario::{Scenario, ScenarioError, TowerPlacement};
pub use typist::{Typist, TypistProfile};
