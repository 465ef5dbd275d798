//! Simulated typist.
//!
//! The typist reads the run state each step and produces the keystrokes a
//! player of a given speed and accuracy would have typed in that time. It
//! owns its own seeded generator, so a scenario and seed fully determine
//! the input stream.

use serde::{Deserialize, Serialize};
use td_core::math::Fixed;
use td_core::rng::SimRng;
use td_core::simulation::RunState;

const KEYS: &str = "abcdefghijklmnopqrstuvwxyz";

/// How well the simulated player types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypistProfile {
    /// Chance (0-100) that a keystroke is the intended key.
    pub accuracy_pct: u32,
    /// Sustained typing speed.
    pub chars_per_second: u32,
}

impl Default for TypistProfile {
    fn default() -> Self {
        Self {
            accuracy_pct: 95,
            chars_per_second: 5,
        }
    }
}

/// A seeded simulated player.
#[derive(Debug, Clone)]
pub struct Typist {
    profile: TypistProfile,
    rng: SimRng,
    budget: Fixed,
}

impl Typist {
    /// Create a typist.
    #[must_use]
    pub fn new(profile: TypistProfile, seed: u64) -> Self {
        Self {
            profile,
            rng: SimRng::new(seed),
            budget: Fixed::ZERO,
        }
    }

    /// Profile in use.
    #[must_use]
    pub const fn profile(&self) -> TypistProfile {
        self.profile
    }

    /// Keystrokes for the next `delta` seconds.
    ///
    /// The typist finishes the word it is locked onto, or starts on the
    /// enemy closest to the castle. A slip ends the burst for this step.
    /// Unused time carries over, capped at one second of typing.
    pub fn keystrokes(&mut self, delta: Fixed, state: &RunState) -> String {
        let cps = Fixed::from_num(self.profile.chars_per_second);
        self.budget = (self.budget + delta * cps).min(cps.max(Fixed::ONE));

        let Some(remaining) = remaining_word(state) else {
            return String::new();
        };

        let mut typed = String::new();
        for expected in remaining.chars() {
            if self.budget < Fixed::ONE {
                break;
            }
            self.budget -= Fixed::ONE;
            if self.rng.roll_percent(self.profile.accuracy_pct) {
                typed.push(expected);
            } else {
                typed.push(self.slip(expected));
                break;
            }
        }
        typed
    }

    fn slip(&mut self, expected: char) -> char {
        let wrong: Vec<char> = KEYS.chars().filter(|&c| c != expected).collect();
        self.rng.pick(&wrong).copied().unwrap_or('?')
    }
}

/// The untyped part of the word the player should be working on.
fn remaining_word(state: &RunState) -> Option<String> {
    let locked = state
        .typing
        .target
        .and_then(|id| state.enemies.iter().find(|e| e.id == id && e.alive))
        .and_then(|e| e.word.strip_prefix(state.typing.buffer.as_str()))
        .map(str::to_string);
    if locked.is_some() {
        return locked;
    }
    state
        .enemies
        .iter()
        .filter(|e| e.alive)
        .min_by_key(|e| (e.distance, e.id))
        .map(|e| e.word.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::config::WaveConfig;
    use td_core::data::Catalog;
    use td_core::enemy::EnemyKind;
    use td_core::simulation::Simulation;

    fn sim_with_scout() -> Simulation {
        let mut sim = Simulation::new(Catalog::builtin().shared(), 1);
        sim.start_wave(WaveConfig {
            roster_override: Some(Vec::new()),
            ..WaveConfig::default()
        });
        sim.spawn_enemy(EnemyKind::Scout, "ember", None);
        sim
    }

    fn perfect(chars_per_second: u32) -> TypistProfile {
        TypistProfile {
            accuracy_pct: 100,
            chars_per_second,
        }
    }

    #[test]
    fn test_types_one_key_per_budgeted_second() {
        let mut sim = sim_with_scout();
        let mut typist = Typist::new(perfect(1), 7);

        let keys = typist.keystrokes(Fixed::ONE, sim.state());
        assert_eq!(keys, "e");
        sim.step(Fixed::ZERO, &keys);
        assert_eq!(sim.state().typing.buffer, "e");

        assert_eq!(typist.keystrokes(Fixed::ONE, sim.state()), "m");
    }

    #[test]
    fn test_fast_typist_finishes_word() {
        let mut sim = sim_with_scout();
        let mut typist = Typist::new(perfect(10), 7);
        let keys = typist.keystrokes(Fixed::ONE, sim.state());
        assert_eq!(keys, "ember");
        sim.step(Fixed::ZERO, &keys);
        assert_eq!(sim.state().counters.kills, 1);
    }

    #[test]
    fn test_inaccurate_typist_slips() {
        let sim = sim_with_scout();
        let mut typist = Typist::new(
            TypistProfile {
                accuracy_pct: 0,
                chars_per_second: 10,
            },
            3,
        );
        let keys = typist.keystrokes(Fixed::ONE, sim.state());
        assert_eq!(keys.chars().count(), 1);
        assert_ne!(keys, "e");
    }

    #[test]
    fn test_idle_without_enemies() {
        let mut sim = sim_with_scout();
        sim.step(Fixed::ZERO, "ember");
        let mut typist = Typist::new(perfect(5), 1);
        assert!(typist.keystrokes(Fixed::from_num(10), sim.state()).is_empty());
        assert_eq!(typist.budget, Fixed::from_num(5));
    }

    #[test]
    fn test_same_seed_same_keys() {
        let sim = sim_with_scout();
        let profile = TypistProfile {
            accuracy_pct: 50,
            chars_per_second: 3,
        };
        let mut a = Typist::new(profile, 11);
        let mut b = Typist::new(profile, 11);
        for _ in 0..5 {
            let delta = Fixed::from_num(0.5);
            assert_eq!(a.keystrokes(delta, sim.state()), b.keystrokes(delta, sim.state()));
        }
    }
}
