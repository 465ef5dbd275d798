//! Batch runner.
//!
//! Plays one scenario across many seeds in parallel using rayon and
//! aggregates the outcomes.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use td_core::data::Catalog;
use td_core::events::WaveResult;
use tracing::{debug, info, warn};

use crate::runner::{HeadlessConfig, HeadlessRunner, RunOutcome};
use crate::scenario::Scenario;

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of runs.
    pub game_count: u32,
    /// Seed of the first run; later runs count up from it.
    pub seed_start: u64,
    /// Worker threads (0 = rayon default).
    pub parallel_games: u32,
    /// Milliseconds advanced per step.
    pub step_ms: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            seed_start: 0,
            parallel_games: 0,
            step_ms: 100,
        }
    }
}

impl BatchConfig {
    /// Config for `game_count` runs.
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }
}

/// Aggregate over every completed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Runs completed.
    pub total_games: u32,
    /// Runs ending in victory.
    pub victories: u32,
    /// Runs ending in defeat.
    pub defeats: u32,
    /// Runs stopped by the time limit.
    pub unfinished: u32,
    /// Victories over completed runs.
    pub win_rate: f64,
    /// Mean score.
    pub mean_score: f64,
    /// Mean typing accuracy in percent.
    pub mean_accuracy: f64,
}

impl BatchSummary {
    /// Aggregate a set of outcomes.
    pub fn from_games(games: &[RunOutcome]) -> Self {
        if games.is_empty() {
            return Self::default();
        }
        let count = |wanted: Option<WaveResult>| {
            games
                .iter()
                .filter(|g| g.summary.result == wanted)
                .count() as u32
        };
        let total = games.len() as f64;
        let victories = count(Some(WaveResult::Victory));
        Self {
            total_games: games.len() as u32,
            victories,
            defeats: count(Some(WaveResult::Defeat)),
            unfinished: count(None),
            win_rate: f64::from(victories) / total,
            mean_score: games.iter().map(|g| f64::from(g.summary.score)).sum::<f64>() / total,
            mean_accuracy: games
                .iter()
                .map(|g| f64::from(g.summary.accuracy_pct))
                .sum::<f64>()
                / total,
        }
    }
}

/// Error during one run of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Run index.
    pub game_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Results of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name.
    pub scenario: String,
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual outcomes, in seed order.
    pub games: Vec<RunOutcome>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
    /// Failed runs.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(io::Error::other)
    }
}

/// Run a batch of games.
pub fn run_batch(catalog: &Arc<Catalog>, scenario: &Scenario, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        "Starting batch run: {} games of '{}'",
        config.game_count, scenario.name
    );

    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<RunOutcome, BatchError>> = (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            let runner = HeadlessRunner::with_config(
                Arc::clone(catalog),
                HeadlessConfig {
                    step_ms: config.step_ms,
                    seed: Some(seed),
                    record_path: None,
                },
            );
            match runner.run(scenario, &mut io::sink()) {
                Ok(outcome) => {
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if done % 10 == 0 {
                        debug!("Progress: {}/{}", done, config.game_count);
                    }
                    Ok(outcome)
                }
                Err(e) => {
                    warn!("Game {} failed: {}", i, e);
                    Err(BatchError {
                        game_index: i,
                        seed,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<RunOutcome> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s, win rate {:.1}%",
        games.len(),
        duration_seconds,
        summary.win_rate * 100.0
    );

    BatchResults {
        scenario: scenario.name.clone(),
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Run one seed several times and check every run ends on the same hash.
pub fn verify_determinism(catalog: &Arc<Catalog>, scenario: &Scenario, seed: u64, runs: u32) -> bool {
    let hashes: Vec<Option<u64>> = (0..runs)
        .map(|_| {
            HeadlessRunner::with_config(
                Arc::clone(catalog),
                HeadlessConfig {
                    seed: Some(seed),
                    ..HeadlessConfig::default()
                },
            )
            .run(scenario, &mut io::sink())
            .map(|outcome| outcome.final_hash)
            .ok()
        })
        .collect();

    match hashes.first() {
        Some(Some(first)) => hashes.iter().all(|h| *h == Some(*first)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::summary::RunSummary;

    fn catalog() -> Arc<Catalog> {
        Catalog::builtin().shared()
    }

    fn outcome(result: Option<WaveResult>, score: u32, accuracy_pct: u32) -> RunOutcome {
        RunOutcome {
            scenario: "test".to_string(),
            seed: 0,
            summary: RunSummary {
                result,
                kills: 0,
                words_typed: 0,
                keystrokes: 0,
                misses: 0,
                damage_taken: 0,
                best_combo: 0,
                accuracy_pct,
                gold_earned: 0,
                score,
            },
            final_hash: 0,
            steps: 0,
            clock_ms: 0,
        }
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(500).with_seed(12345);
        assert_eq!(config.game_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.step_ms, 100);
    }

    #[test]
    fn test_summary_aggregates() {
        let games = vec![
            outcome(Some(WaveResult::Victory), 100, 100),
            outcome(Some(WaveResult::Defeat), 20, 80),
            outcome(Some(WaveResult::Victory), 60, 90),
            outcome(None, 0, 70),
        ];
        let summary = BatchSummary::from_games(&games);
        assert_eq!(summary.total_games, 4);
        assert_eq!(summary.victories, 2);
        assert_eq!(summary.defeats, 1);
        assert_eq!(summary.unfinished, 1);
        assert!((summary.win_rate - 0.5).abs() < 1e-9);
        assert!((summary.mean_score - 45.0).abs() < 1e-9);
        assert!((summary.mean_accuracy - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(BatchSummary::from_games(&[]), BatchSummary::default());
    }

    #[test]
    fn test_run_batch_small() {
        let results = run_batch(&catalog(), &Scenario::standard_defense(), BatchConfig::new(4));
        assert_eq!(results.games.len(), 4);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 4);
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_batch_matches_single_runs() {
        let catalog = catalog();
        let scenario = Scenario::standard_defense();
        let results = run_batch(&catalog, &scenario, BatchConfig::new(3).with_seed(40));
        for game in &results.games {
            let single = HeadlessRunner::with_config(
                Arc::clone(&catalog),
                HeadlessConfig {
                    seed: Some(game.seed),
                    ..HeadlessConfig::default()
                },
            )
            .run(&scenario, &mut io::sink())
            .unwrap();
            assert_eq!(&single, game);
        }
    }

    #[test]
    fn test_verify_determinism() {
        assert!(verify_determinism(&catalog(), &Scenario::standard_defense(), 12345, 3));
    }

    #[test]
    fn test_batch_results_save_load() {
        let results = run_batch(&catalog(), &Scenario::standard_defense(), BatchConfig::new(2));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games, results.games);
        assert_eq!(loaded.scenario, "standard_defense");
    }
}
