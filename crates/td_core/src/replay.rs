//! Replay recording and playback.
//!
//! A replay stores the serialized starting state and every command issued
//! afterwards. Re-running the commands against the starting state must
//! reproduce the recorded final hash exactly.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::WaveConfig;
use crate::data::Catalog;
use crate::enemy::{Affix, EnemyKind};
use crate::error::{CoreError, Result};
use crate::events::CombatEvent;
use crate::math::{fixed_serde, Fixed, GridPos};
use crate::simulation::Simulation;
use crate::targeting::Targeting;
use crate::tower::{TowerId, TowerKind};

/// One recorded command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayCommand {
    /// [`Simulation::start_wave`].
    StartWave(WaveConfig),
    /// [`Simulation::step`].
    Step {
        /// Seconds advanced.
        #[serde(with = "fixed_serde")]
        delta: Fixed,
        /// Typed input.
        input: String,
    },
    /// [`Simulation::place_tower`].
    PlaceTower {
        /// Tower kind.
        kind: TowerKind,
        /// Target cell.
        position: GridPos,
    },
    /// [`Simulation::upgrade_tower`].
    UpgradeTower {
        /// Tower to upgrade.
        id: TowerId,
    },
    /// [`Simulation::remove_tower`].
    RemoveTower {
        /// Tower to remove.
        id: TowerId,
    },
    /// [`Simulation::set_targeting`].
    SetTargeting {
        /// Tower to retarget.
        id: TowerId,
        /// New mode.
        targeting: Targeting,
    },
    /// [`Simulation::spawn_enemy`].
    SpawnEnemy {
        /// Enemy kind.
        kind: EnemyKind,
        /// Word to type.
        word: String,
        /// Optional affix.
        affix: Option<Affix>,
    },
}

impl ReplayCommand {
    /// Run the command against a simulation.
    pub fn apply(&self, sim: &mut Simulation) -> Vec<CombatEvent> {
        match self {
            ReplayCommand::StartWave(config) => sim.start_wave(config.clone()).events,
            ReplayCommand::Step { delta, input } => sim.step(*delta, input).events,
            ReplayCommand::PlaceTower { kind, position } => sim.place_tower(*kind, *position).events,
            ReplayCommand::UpgradeTower { id } => sim.upgrade_tower(*id).events,
            ReplayCommand::RemoveTower { id } => sim.remove_tower(*id).events,
            ReplayCommand::SetTargeting { id, targeting } => sim.set_targeting(*id, *targeting).events,
            ReplayCommand::SpawnEnemy { kind, word, affix } => sim.spawn_enemy(*kind, word, *affix).events,
        }
    }
}

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Scenario identifier or name.
    pub scenario_id: String,
    /// Seed of the starting state.
    pub seed: u64,
    /// Serialized starting state.
    pub initial_state: Vec<u8>,
    /// Commands in issue order.
    pub commands: Vec<ReplayCommand>,
    /// State hash after the last command.
    pub final_hash: u64,
}

impl Replay {
    /// Start recording from a simulation's current state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be serialized.
    pub fn new(scenario_id: impl Into<String>, sim: &Simulation) -> Result<Self> {
        Ok(Self {
            version: REPLAY_VERSION,
            scenario_id: scenario_id.into(),
            seed: sim.state().rng.seed(),
            initial_state: sim.serialize()?,
            commands: Vec::new(),
            final_hash: 0,
        })
    }

    /// Record a command without running it.
    pub fn record(&mut self, command: ReplayCommand) {
        self.commands.push(command);
    }

    /// Run a command against `sim` and record it.
    pub fn execute(&mut self, sim: &mut Simulation, command: ReplayCommand) -> Vec<CombatEvent> {
        let events = command.apply(sim);
        self.record(command);
        events
    }

    /// Store the final state hash.
    pub fn finalize(&mut self, final_hash: u64) {
        self.final_hash = final_hash;
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if file reading or deserialization fails, or if the
    /// file was written by a different format version.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| CoreError::Serialization(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(CoreError::ReplayVersion {
                expected: REPLAY_VERSION,
                found: replay.version,
            });
        }

        Ok(replay)
    }

    /// Rebuild the starting simulation.
    ///
    /// # Errors
    /// Returns an error if state deserialization fails.
    pub fn restore_initial_state(&self, catalog: Arc<Catalog>) -> Result<Simulation> {
        Simulation::deserialize(catalog, &self.initial_state)
    }

    /// Re-run every command and return the resulting simulation.
    ///
    /// # Errors
    /// Returns an error if the starting state cannot be restored.
    pub fn play(&self, catalog: Arc<Catalog>) -> Result<Simulation> {
        let mut sim = self.restore_initial_state(catalog)?;
        for command in &self.commands {
            command.apply(&mut sim);
        }
        Ok(sim)
    }

    /// Re-run the replay and compare against the recorded final hash.
    ///
    /// # Errors
    /// [`CoreError::ReplayMismatch`] if the hashes differ.
    pub fn verify(&self, catalog: Arc<Catalog>) -> Result<u64> {
        let actual = self.play(catalog)?.state_hash();
        if actual != self.final_hash {
            tracing::warn!(
                scenario = %self.scenario_id,
                expected = self.final_hash,
                actual,
                "Replay diverged"
            );
            return Err(CoreError::ReplayMismatch {
                expected: self.final_hash,
                actual,
            });
        }
        Ok(actual)
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

/// Step-by-step playback of a replay.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    catalog: Arc<Catalog>,
    simulation: Simulation,
    /// Commands applied so far.
    position: usize,
}

impl ReplayPlayer {
    /// Create a player positioned before the first command.
    ///
    /// # Errors
    /// Returns an error if the initial state cannot be restored.
    pub fn new(replay: Replay, catalog: Arc<Catalog>) -> Result<Self> {
        let simulation = replay.restore_initial_state(Arc::clone(&catalog))?;
        Ok(Self {
            replay,
            catalog,
            simulation,
            position: 0,
        })
    }

    /// Apply the next command, returning its events.
    ///
    /// `None` once every command has been applied.
    pub fn advance(&mut self) -> Option<Vec<CombatEvent>> {
        let command = self.replay.commands.get(self.position)?;
        self.position += 1;
        Some(command.apply(&mut self.simulation))
    }

    /// Restart and apply the first `target` commands.
    ///
    /// # Errors
    /// Returns an error if state restoration fails.
    pub fn seek(&mut self, target: usize) -> Result<()> {
        self.simulation = self.replay.restore_initial_state(Arc::clone(&self.catalog))?;
        self.position = 0;
        while self.position < target && self.advance().is_some() {}
        Ok(())
    }

    /// Commands applied so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Current simulation.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// The replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Every command has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.position >= self.replay.commands.len()
    }

    /// Progress in percent (0-100).
    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        let total = self.replay.commands.len();
        if total == 0 {
            100
        } else {
            u32::try_from(self.position * 100 / total).unwrap_or(100)
        }
    }
}
