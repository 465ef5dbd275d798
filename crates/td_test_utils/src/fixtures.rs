//! Test fixtures and helpers.
//!
//! Pre-built simulations, command scripts and enemy values for consistent
//! testing.

use std::sync::Arc;

use fixed::types::I32F32;
use td_core::config::WaveConfig;
use td_core::data::Catalog;
use td_core::enemy::{create_enemy, Enemy, EnemyId, EnemyKind};
use td_core::math::GridPos;
use td_core::replay::ReplayCommand;
use td_core::simulation::Simulation;
use td_core::tower::TowerKind;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// The built-in catalog, shared.
#[must_use]
pub fn builtin_catalog() -> Arc<Catalog> {
    Catalog::builtin().shared()
}

/// A wave with no composed roster; enemies come only from `spawn_enemy`.
#[must_use]
pub fn scripted_config() -> WaveConfig {
    WaveConfig {
        roster_override: Some(Vec::new()),
        ..WaveConfig::default()
    }
}

/// A simulation with a scripted wave already started.
#[must_use]
pub fn scripted_simulation(seed: u64) -> Simulation {
    let mut sim = Simulation::new(builtin_catalog(), seed);
    sim.start_wave(scripted_config());
    sim
}

/// Tower layout used by balance-style scenarios, all off the default lane.
#[must_use]
pub fn standard_defense() -> Vec<(TowerKind, GridPos)> {
    vec![
        (TowerKind::Arrow, GridPos::new(10, 1)),
        (TowerKind::Catapult, GridPos::new(9, 1)),
        (TowerKind::Ember, GridPos::new(7, 3)),
        (TowerKind::Spark, GridPos::new(8, 3)),
        (TowerKind::Frost, GridPos::new(4, 1)),
    ]
}

/// A simulation with [`standard_defense`] placed and a composed wave started.
#[must_use]
pub fn defended_simulation(seed: u64, config: WaveConfig) -> Simulation {
    let mut sim = Simulation::new(builtin_catalog(), seed);
    for (kind, position) in standard_defense() {
        sim.place_tower(kind, position);
    }
    sim.start_wave(config);
    sim
}

/// `count` steps of `delta_ms` milliseconds with no typing.
#[must_use]
pub fn idle_steps(delta_ms: i32, count: usize) -> Vec<ReplayCommand> {
    let delta = fixed(delta_ms) / fixed(1000);
    (0..count)
        .map(|_| ReplayCommand::Step {
            delta,
            input: String::new(),
        })
        .collect()
}

/// One quarter-second step per character of `text`.
#[must_use]
pub fn typing_steps(text: &str) -> Vec<ReplayCommand> {
    let delta = fixed_f(0.25);
    text.chars()
        .map(|ch| ReplayCommand::Step {
            delta,
            input: ch.to_string(),
        })
        .collect()
}

/// Run a command script, discarding events.
pub fn run_script(sim: &mut Simulation, script: &[ReplayCommand]) {
    for command in script {
        command.apply(sim);
    }
}

/// A day-1 enemy value at a lane position, outside any simulation.
///
/// # Panics
///
/// Panics if the built-in catalog lacks the kind.
#[must_use]
pub fn enemy_at(kind: EnemyKind, id: EnemyId, x: i32, distance: i32) -> Enemy {
    let catalog = Catalog::builtin();
    let template = catalog.enemy(kind).expect("built-in enemy template");
    let mut enemy = create_enemy(template, id, GridPos::new(x, 2), kind.name(), 1, 0);
    enemy.distance = fixed(distance);
    enemy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_defense_is_placeable() {
        let sim = defended_simulation(1, WaveConfig::default());
        assert_eq!(sim.state().towers.len(), standard_defense().len());
        assert!(sim.is_running());
    }

    #[test]
    fn test_typing_steps_one_char_each() {
        let script = typing_steps("ember");
        assert_eq!(script.len(), 5);
        assert!(matches!(&script[0], ReplayCommand::Step { input, .. } if input == "e"));
    }

    #[test]
    fn test_scripted_typing_kills_scout() {
        let mut sim = scripted_simulation(3);
        sim.spawn_enemy(EnemyKind::Scout, "ember", None);
        run_script(&mut sim, &typing_steps("ember"));
        assert_eq!(sim.state().counters.kills, 1);
    }
}
