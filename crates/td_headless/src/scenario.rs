//! Scenario loading.
//!
//! A scenario is one wave plus the defense already standing when it starts
//! and the typist who plays it. Scenarios are RON files; every field has a
//! default, so `()` is a valid scenario.

use std::path::Path;

use serde::{Deserialize, Serialize};
use td_core::config::WaveConfig;
use td_core::error::CoreError;
use td_core::math::GridPos;
use td_core::tower::TowerKind;
use thiserror::Error;

use crate::typist::TypistProfile;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The wave settings cannot run.
    #[error("Invalid wave settings: {0}")]
    InvalidWave(#[from] CoreError),
}

/// A tower standing before the wave starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerPlacement {
    /// Tower kind.
    pub kind: TowerKind,
    /// Grid cell.
    pub position: GridPos,
}

impl TowerPlacement {
    /// Create a placement.
    #[must_use]
    pub const fn new(kind: TowerKind, x: i32, y: i32) -> Self {
        Self {
            kind,
            position: GridPos::new(x, y),
        }
    }
}

/// A complete scenario.
///
/// # Example RON
///
/// ```ron
/// Scenario(
///     name: "boss_day",
///     wave: (day: 7, wave_index: 2, castle_hp: 30),
///     towers: [(kind: Arrow, position: (x: 10, y: 1))],
///     typist: (accuracy_pct: 90, chars_per_second: 4),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name, recorded in replays.
    pub name: String,
    /// Wave settings.
    pub wave: WaveConfig,
    /// Towers placed before the wave starts.
    pub towers: Vec<TowerPlacement>,
    /// Simulated player.
    pub typist: TypistProfile,
    /// Game-time limit in seconds; an unfinished wave is reported without a result.
    pub max_seconds: u32,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::standard_defense()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a scenario from RON text.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.wave.validate()?;
        Ok(scenario)
    }

    /// Day-one wave against a small mixed defense.
    #[must_use]
    pub fn standard_defense() -> Self {
        Self {
            name: "standard_defense".to_string(),
            wave: WaveConfig::default(),
            towers: vec![
                TowerPlacement::new(TowerKind::Arrow, 10, 1),
                TowerPlacement::new(TowerKind::Catapult, 9, 1),
                TowerPlacement::new(TowerKind::Ember, 7, 3),
                TowerPlacement::new(TowerKind::Spark, 8, 3),
                TowerPlacement::new(TowerKind::Frost, 4, 1),
            ],
            typist: TypistProfile::default(),
            max_seconds: 600,
        }
    }

    /// Final wave of day seven, with its boss.
    #[must_use]
    pub fn boss_day() -> Self {
        Self {
            name: "boss_day".to_string(),
            wave: WaveConfig {
                day: 7,
                wave_index: 2,
                castle_hp: 30,
                ..WaveConfig::default()
            },
            ..Self::standard_defense()
        }
    }

    /// Resolve a built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "standard_defense" => Some(Self::standard_defense()),
            "boss_day" => Some(Self::boss_day()),
            _ => None,
        }
    }

    /// A built-in name or a path to a RON file.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match Self::builtin(name_or_path) {
            Some(scenario) => Ok(scenario),
            None => Self::load(name_or_path),
        }
    }
}
