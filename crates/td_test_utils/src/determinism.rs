//! Determinism checks for the combat loop.
//!
//! Every check drives [`Simulation`]s through scripts of [`ReplayCommand`]s,
//! the same commands a replay records, and compares
//! [`Simulation::state_hash`] values after each one. A mismatch means state
//! escaped the seeded `SimRng`, an unordered map reached the run state, or
//! float math leaked into the rules.

use std::panic;
use std::sync::Arc;
use std::thread;

use td_core::replay::{Replay, ReplayCommand};
use td_core::simulation::Simulation;

/// State hashes of one scripted run: the starting hash, then one per command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashTrace(pub Vec<u64>);

impl HashTrace {
    /// Play `script` on `sim`, hashing after every command.
    pub fn record(sim: &mut Simulation, script: &[ReplayCommand]) -> Self {
        let mut hashes = Vec::with_capacity(script.len() + 1);
        hashes.push(sim.state_hash());
        for command in script {
            command.apply(sim);
            hashes.push(sim.state_hash());
        }
        Self(hashes)
    }

    /// Hash after the last command.
    #[must_use]
    pub fn final_hash(&self) -> u64 {
        self.0.last().copied().unwrap_or_default()
    }

    /// Number of commands applied before the traces first differ.
    #[must_use]
    pub fn divergence(&self, other: &Self) -> Option<usize> {
        self.0.iter().zip(&other.0).position(|(a, b)| a != b)
    }
}

/// Play a script on two fresh setups and find where they split.
///
/// `None` if every hash matched, `Some(n)` if they differ after the first
/// `n` commands (0 means the setups already differ).
pub fn find_first_divergence<F>(setup_fn: F, script: &[ReplayCommand]) -> Option<usize>
where
    F: Fn() -> Simulation,
{
    let first = HashTrace::record(&mut setup_fn(), script);
    let second = HashTrace::record(&mut setup_fn(), script);
    let index = first.divergence(&second)?;
    if let Some(command) = index.checked_sub(1).and_then(|i| script.get(i)) {
        tracing::debug!(index, ?command, "Simulations diverged");
    }
    Some(index)
}

/// Whether two plays of a script hash identically at every command.
///
/// # Example
///
/// ```
/// use td_core::config::WaveConfig;
/// use td_test_utils::determinism::verify_simulation_determinism;
/// use td_test_utils::fixtures::{defended_simulation, idle_steps};
///
/// let script = idle_steps(250, 40);
/// assert!(verify_simulation_determinism(
///     || defended_simulation(7, WaveConfig::default()),
///     &script,
/// ));
/// ```
pub fn verify_simulation_determinism<F>(setup_fn: F, script: &[ReplayCommand]) -> bool
where
    F: Fn() -> Simulation,
{
    find_first_divergence(setup_fn, script).is_none()
}

/// Final hashes of `num_sims` plays of one script, each on its own thread.
pub fn parallel_final_hashes<F>(setup_fn: F, num_sims: usize, script: &[ReplayCommand]) -> Vec<u64>
where
    F: Fn() -> Simulation + Sync,
{
    thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| s.spawn(|| HashTrace::record(&mut setup_fn(), script).final_hash()))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    })
}

/// Record a script through a [`Replay`] and check that replaying it from the
/// recorded starting state lands on the live run's final hash.
pub fn verify_replay_reproduces<F>(setup_fn: F, script: &[ReplayCommand]) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    let Ok(mut replay) = Replay::new("determinism", &sim) else {
        return false;
    };
    for command in script {
        replay.execute(&mut sim, command.clone());
    }
    let final_hash = sim.state_hash();
    replay.finalize(final_hash);
    matches!(replay.verify(Arc::clone(sim.catalog())), Ok(hash) if hash == final_hash)
}

/// Save mid-run, restore, and check both copies keep hashing identically.
pub fn verify_serialization_determinism<F>(
    setup_fn: F,
    script: &[ReplayCommand],
    continuation: &[ReplayCommand],
) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    HashTrace::record(&mut sim, script);

    let Ok(bytes) = sim.serialize() else {
        return false;
    };
    let Ok(mut restored) = Simulation::deserialize(Arc::clone(sim.catalog()), &bytes) else {
        return false;
    };
    HashTrace::record(&mut sim, continuation) == HashTrace::record(&mut restored, continuation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{
        defended_simulation, fixed, idle_steps, scripted_simulation, typing_steps,
    };
    use crate::strategies::arb_script;
    use proptest::prelude::*;
    use td_core::config::WaveConfig;
    use td_core::enemy::{Affix, EnemyKind};

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_trace_has_one_hash_per_command() {
        let script = idle_steps(500, 6);
        let trace = HashTrace::record(&mut scripted_simulation(1), &script);
        assert_eq!(trace.0.len(), 7);
        assert_eq!(trace.divergence(&trace.clone()), None);

        let mut other = trace.clone();
        other.0[3] ^= 1;
        assert_eq!(trace.divergence(&other), Some(3));
    }

    #[test]
    fn test_idle_simulation_determinism() {
        let script = idle_steps(500, 40);
        assert!(verify_simulation_determinism(
            || scripted_simulation(1),
            &script
        ));
    }

    #[test]
    fn test_composed_wave_determinism() {
        let script = idle_steps(250, 200);
        assert!(verify_simulation_determinism(
            || defended_simulation(99, WaveConfig::default()),
            &script
        ));
    }

    #[test]
    fn test_boss_wave_determinism() {
        let config = WaveConfig {
            day: 7,
            wave_index: 2,
            castle_hp: 500,
            ..WaveConfig::default()
        };
        let script = idle_steps(250, 400);
        assert!(verify_simulation_determinism(
            || defended_simulation(5, config.clone()),
            &script
        ));
    }

    #[test]
    fn test_find_divergence_on_deterministic_sim() {
        let mut script = typing_steps("raven");
        script.extend(idle_steps(1000, 10));
        let divergence = find_first_divergence(
            || {
                let mut sim = scripted_simulation(4);
                sim.spawn_enemy(EnemyKind::Raider, "raven", Some(Affix::Splitting));
                sim
            },
            &script,
        );
        assert!(divergence.is_none(), "Expected no divergence");
    }

    #[test]
    fn test_find_divergence_reports_different_setups() {
        let script = idle_steps(500, 4);
        let counter = std::cell::Cell::new(0u64);
        let divergence = find_first_divergence(
            || {
                counter.set(counter.get() + 1);
                scripted_simulation(counter.get())
            },
            &script,
        );
        assert_eq!(divergence, Some(0));
    }

    // =========================================================================
    // Serialization round-trip tests
    // =========================================================================

    #[test]
    fn test_serialization_preserves_fresh_wave() {
        assert!(verify_serialization_determinism(
            || scripted_simulation(2),
            &[],
            &idle_steps(500, 4)
        ));
    }

    #[test]
    fn test_serialization_preserves_mid_wave_state() {
        assert!(verify_serialization_determinism(
            || defended_simulation(17, WaveConfig {
                day: 4,
                ..WaveConfig::default()
            }),
            &idle_steps(250, 30),
            &idle_steps(250, 60)
        ));
    }

    // =========================================================================
    // Parallel tests
    // =========================================================================

    #[test]
    fn test_parallel_composed_waves() {
        let script = idle_steps(250, 120);
        let hashes = parallel_final_hashes(
            || defended_simulation(31, WaveConfig::default()),
            4,
            &script,
        );
        assert_eq!(hashes.len(), 4);
        assert!(hashes.windows(2).all(|w| w[0] == w[1]), "{hashes:?}");
    }

    #[test]
    fn test_typed_run_replays_to_same_hash() {
        let mut script = typing_steps("raven");
        script.extend(idle_steps(250, 40));
        assert!(verify_replay_reproduces(
            || {
                let mut sim = defended_simulation(8, WaveConfig::default());
                sim.spawn_enemy(EnemyKind::Raider, "raven", None);
                sim
            },
            &script
        ));
    }

    #[test]
    fn test_different_seeds_differ() {
        let script = idle_steps(500, 20);
        let a = find_first_divergence(|| defended_simulation(1, WaveConfig::default()), &script);
        assert!(a.is_none());

        let mut one = defended_simulation(1, WaveConfig::default());
        let mut two = defended_simulation(2, WaveConfig::default());
        for command in &script {
            command.apply(&mut one);
            command.apply(&mut two);
        }
        assert_ne!(one.state_hash(), two.state_hash());
    }

    // =========================================================================
    // Property tests
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_arbitrary_scripts_are_deterministic(seed in 0u64..1_000, script in arb_script(60)) {
            let setup = || defended_simulation(seed, WaveConfig::default());
            prop_assert!(find_first_divergence(setup, &script).is_none());
        }

        #[test]
        fn prop_clock_is_sum_of_accepted_deltas(script in arb_script(40)) {
            let mut sim = scripted_simulation(0);
            sim.spawn_enemy(EnemyKind::Knight, "bulwark", None);
            let mut expected = fixed(0);
            for command in &script {
                let running = sim.is_running();
                command.apply(&mut sim);
                if let ReplayCommand::Step { delta, .. } = command {
                    if running {
                        expected += *delta;
                    }
                }
            }
            prop_assert_eq!(sim.clock(), expected);
        }
    }
}
