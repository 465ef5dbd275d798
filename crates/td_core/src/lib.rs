//! # TD Core
//!
//! Deterministic combat core for a typing tower-defense game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO (apart from replay files)
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless simulation and batch balancing
//! - Save/load of the full run state
//! - Replay systems
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`simulation`] - The real-time combat loop
//! - [`enemy`], [`tower`] - Strongly-typed entity models
//! - [`targeting`], [`damage`], [`synergy`] - Pure combat rules
//! - [`boss`], [`wave`] - Encounter state and wave composition
//! - [`data`] - Immutable catalog tables
//! - [`replay`] - Command recording and verification
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod boss;
pub mod config;
pub mod damage;
pub mod data;
pub mod enemy;
pub mod error;
pub mod events;
pub mod math;
pub mod replay;
pub mod rng;
pub mod simulation;
pub mod status;
pub mod summary;
pub mod synergy;
pub mod targeting;
pub mod tower;
pub mod wave;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{FieldLayout, WaveConfig};
    pub use crate::damage::DamageType;
    pub use crate::data::Catalog;
    pub use crate::enemy::{Affix, Enemy, EnemyId, EnemyKind};
    pub use crate::error::{CoreError, Result};
    pub use crate::events::{CombatEvent, WaveResult};
    pub use crate::math::{Fixed, GridPos, Multiplier};
    pub use crate::replay::{Replay, ReplayCommand};
    pub use crate::simulation::{RunState, Simulation, StepReport};
    pub use crate::summary::RunSummary;
    pub use crate::targeting::{AutoTargetMode, TargetMode, Targeting};
    pub use crate::tower::{Tower, TowerId, TowerKind};
}
