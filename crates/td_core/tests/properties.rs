//! Property tests for the combat rules.

use td_core::boss::{BossEncounter, PhasePolicy};
use td_core::config::{FieldLayout, WaveConfig};
use td_core::damage::{aoe_damage, chain_damage};
use td_core::data::Catalog;
use td_core::enemy::{create_boss, EnemyKind};
use td_core::error::CoreError;
use td_core::events::CombatEvent;
use td_core::math::{Fixed, GridPos, Multiplier};
use td_core::simulation::Simulation;
use td_core::targeting::{select_targets, AutoTargetMode, TargetMode, TargetQuery, Targeting};
use td_test_utils::fixtures::enemy_at;
use td_test_utils::proptest::prelude::*;
use td_test_utils::strategies::{arb_damage, arb_hp};

proptest! {
    #[test]
    fn prop_hp_stays_in_bounds(max_hp in arb_hp(), hits in prop::collection::vec((arb_damage(), any::<bool>()), 0..30)) {
        let mut enemy = enemy_at(EnemyKind::Raider, 1, 6, 6);
        enemy.max_hp = max_hp;
        enemy.hp = max_hp;
        let mut deaths = 0;
        for (amount, is_heal) in hits {
            let was_alive = enemy.alive;
            if is_heal {
                enemy.heal(amount);
            } else {
                enemy.apply_damage(amount);
            }
            prop_assert!(enemy.hp <= enemy.max_hp);
            prop_assert_eq!(enemy.alive, enemy.hp > 0);
            if was_alive && !enemy.alive {
                deaths += 1;
            }
        }
        prop_assert!(deaths <= 1);
    }

    #[test]
    fn prop_chain_damage_never_grows(base in 1u32..500, falloff in 1u32..=100, jumps in 0u32..10) {
        let falloff = Multiplier::from_percent(falloff);
        let mut previous = chain_damage(base, 0, falloff);
        prop_assert_eq!(previous, base);
        for jump in 1..=jumps {
            let damage = chain_damage(base, jump, falloff);
            prop_assert!(damage >= 1);
            prop_assert!(damage <= previous);
            previous = damage;
        }
    }

    #[test]
    fn prop_aoe_damage_falls_off_with_distance(base in 1u32..500, radius in 0u32..4) {
        prop_assert_eq!(aoe_damage(base, 0, radius), base);
        let mut previous = base;
        for distance in 1..=radius {
            let damage = aoe_damage(base, distance, radius);
            prop_assert!(damage >= 1);
            prop_assert!(damage <= previous);
            previous = damage;
        }
    }

    #[test]
    fn prop_monotonic_boss_phase_never_decreases(changes in prop::collection::vec((0u32..30, any::<bool>()), 1..40)) {
        let catalog = Catalog::builtin();
        let template = catalog.enemy(EnemyKind::ForestGuardian).unwrap();
        let def = catalog.boss(EnemyKind::ForestGuardian).unwrap();
        let mut boss = create_boss(template, 1, GridPos::new(12, 2), "overgrowth", 1, 0);
        let mut encounter = BossEncounter::new(1, EnemyKind::ForestGuardian, PhasePolicy::Monotonic);

        let mut highest = 0;
        for (amount, is_heal) in changes {
            if !boss.alive {
                break;
            }
            if is_heal {
                boss.heal(amount);
            } else {
                boss.apply_damage(amount);
            }
            if let Some(transition) = encounter.check_phase_transition(def, &boss) {
                prop_assert!(transition.to > transition.from);
            }
            prop_assert!(encounter.phase_index >= highest);
            highest = encounter.phase_index;
        }
    }

    #[test]
    fn prop_percent_multipliers_compound_exactly(a in 0u32..400, b in 0u32..400) {
        let product = Multiplier::from_percent(a).compound(Multiplier::from_percent(b));
        prop_assert_eq!(product, Multiplier::from_basis_points(a * b));
        prop_assert_eq!(product, Multiplier::from_percent(b).compound(Multiplier::from_percent(a)));
    }

    #[test]
    fn prop_targets_are_unique_and_in_range(
        xs in prop::collection::vec(0i32..13, 0..8),
        range in 0u32..6,
        max_targets in 0usize..4,
        auto in any::<bool>(),
    ) {
        let enemies: Vec<_> = xs
            .iter()
            .zip(1u32..)
            .map(|(&x, id)| enemy_at(EnemyKind::Raider, id, x, x))
            .collect();
        let origin = GridPos::new(6, 1);
        let query = TargetQuery { origin, range, max_targets, chain_jump_range: 0 };
        let targeting = if auto {
            Targeting::Auto(AutoTargetMode::Nearest)
        } else {
            Targeting::Manual(TargetMode::First)
        };

        let targets = select_targets(&query, targeting, &enemies);
        prop_assert!(targets.len() <= max_targets);
        let mut sorted = targets.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), targets.len());
        for id in targets {
            let enemy = enemies.iter().find(|e| e.id == id).unwrap();
            prop_assert!(enemy.position.manhattan(origin) <= range);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_any_wave_config_runs_or_is_rejected(
        day in prop_oneof![0u32..60, any::<u32>()],
        threat in prop_oneof![0u32..20, any::<u32>()],
        total_waves in prop_oneof![0u32..6, any::<u32>()],
        wave_index in 0u32..8,
        lane_length in prop_oneof![0u32..40, any::<u32>()],
        seed in any::<u64>(),
    ) {
        let config = WaveConfig {
            day,
            threat,
            total_waves,
            wave_index,
            seed,
            field: FieldLayout {
                lane_length,
                ..FieldLayout::default()
            },
            ..WaveConfig::default()
        };
        let mut sim = Simulation::from_config(Catalog::builtin().shared(), &config);
        let events = sim.start_wave(config.clone()).events;
        match config.validate() {
            Ok(()) => prop_assert!(sim.is_running()),
            Err(err) => {
                prop_assert!(matches!(err, CoreError::InvalidConfig(_)));
                prop_assert!(
                    matches!(events[..], [CombatEvent::CommandRejected { .. }]),
                    "expected a single CommandRejected event, got {:?}",
                    events
                );
            }
        }
        for _ in 0..5 {
            sim.step(Fixed::from_num(1), "a");
        }
        for enemy in &sim.state().enemies {
            prop_assert!(enemy.hp <= enemy.max_hp);
        }
    }
}
