//! Error types for the combat core.
//!
//! Errors never escape the tick loop: the public command surface turns them
//! into [`CombatEvent::CommandRejected`](crate::events::CombatEvent) and
//! leaves the run state untouched.

use thiserror::Error;

use crate::math::GridPos;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Top-level error type for all combat core errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown enemy kind identifier.
    #[error("Unknown enemy kind: {0}")]
    UnknownEnemyKind(String),

    /// Unknown tower kind identifier.
    #[error("Unknown tower kind: {0}")]
    UnknownTowerKind(String),

    /// Unknown affix identifier.
    #[error("Unknown affix: {0}")]
    UnknownAffix(String),

    /// A kind is valid but missing from the loaded catalog.
    #[error("No catalog entry for {0}")]
    MissingCatalogEntry(String),

    /// Invalid tower identifier.
    #[error("Tower not found: {0}")]
    TowerNotFound(u32),

    /// Placement on a cell already holding a tower.
    #[error("Cell {0} is already occupied")]
    PositionOccupied(GridPos),

    /// Placement on the enemy lane.
    #[error("Cell {0} is on the enemy lane")]
    PositionBlocked(GridPos),

    /// Placement outside the grid.
    #[error("Cell {0} is outside the grid")]
    OutOfBounds(GridPos),

    /// Tower cannot be upgraded further.
    #[error("Tower {id} is already at max level {level}")]
    MaxLevel {
        /// Tower identifier.
        id: u32,
        /// Current level.
        level: u8,
    },

    /// Targeting mode does not fit the tower.
    #[error("Tower {0} does not accept that targeting mode")]
    InvalidTargeting(u32),

    /// A wave is already running.
    #[error("A wave is already in progress")]
    WaveInProgress,

    /// Configuration values that cannot run.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Negative time step.
    #[error("Time step must not be negative")]
    NegativeDelta,

    /// Data file parsing error.
    #[error("Failed to parse data '{source_name}': {message}")]
    DataParseError {
        /// Name or path of the data that failed to parse.
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Binary (de)serialization failure.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Filesystem failure while saving or loading.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Replay format version differs from this build.
    #[error("Replay version mismatch: expected {expected}, got {found}")]
    ReplayVersion {
        /// Version this build writes.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },

    /// Replay re-execution diverged from the recorded outcome.
    #[error("Replay diverged: recorded hash {expected}, replayed hash {actual}")]
    ReplayMismatch {
        /// Hash stored in the replay.
        expected: u64,
        /// Hash produced by re-execution.
        actual: u64,
    },
}
