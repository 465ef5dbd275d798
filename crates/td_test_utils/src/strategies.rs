//! Proptest strategies.
//!
//! These strategies generate random but reproducible inputs for
//! property-based testing of combat rules and simulation determinism.

use proptest::prelude::*;
use td_core::enemy::{Affix, EnemyKind};
use td_core::math::{Fixed, GridPos};
use td_core::replay::ReplayCommand;
use td_core::tower::TowerKind;

/// Step delta from 0 to 1.5 seconds in millisecond increments.
pub fn arb_delta() -> impl Strategy<Value = Fixed> {
    (0i32..=1500).prop_map(|ms| Fixed::from_num(ms) / Fixed::from_num(1000))
}

/// Short typed fragment: letters, spaces, backspaces and the odd capital.
pub fn arb_input() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            8 => proptest::char::range('a', 'z'),
            1 => Just(' '),
            1 => Just('\u{8}'),
            1 => proptest::char::range('A', 'Z'),
        ],
        0..4,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// A `Step` command.
pub fn arb_step() -> impl Strategy<Value = ReplayCommand> {
    (arb_delta(), arb_input()).prop_map(|(delta, input)| ReplayCommand::Step { delta, input })
}

/// Any tower kind.
pub fn arb_tower_kind() -> impl Strategy<Value = TowerKind> {
    proptest::sample::select(TowerKind::ALL.to_vec())
}

/// Any non-boss enemy kind.
pub fn arb_regular_enemy_kind() -> impl Strategy<Value = EnemyKind> {
    proptest::sample::select(EnemyKind::ALL[..12].to_vec())
}

/// Any affix.
pub fn arb_affix() -> impl Strategy<Value = Affix> {
    proptest::sample::select(Affix::ALL.to_vec())
}

/// A cell inside (and slightly outside) the default field.
pub fn arb_cell() -> impl Strategy<Value = GridPos> {
    (-1i32..15, -1i32..6).prop_map(|(x, y)| GridPos::new(x, y))
}

/// A tower placement, possibly invalid.
pub fn arb_place_tower() -> impl Strategy<Value = ReplayCommand> {
    (arb_tower_kind(), arb_cell())
        .prop_map(|(kind, position)| ReplayCommand::PlaceTower { kind, position })
}

/// A command script: mostly steps, with occasional tower commands.
pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<ReplayCommand>> {
    proptest::collection::vec(
        prop_oneof![
            8 => arb_step(),
            1 => arb_place_tower(),
            1 => (1u32..4).prop_map(|id| ReplayCommand::UpgradeTower { id }),
        ],
        0..max_len,
    )
}

/// HP values (1-1000).
pub fn arb_hp() -> impl Strategy<Value = u32> {
    1u32..1000u32
}

/// Damage values (0-200).
pub fn arb_damage() -> impl Strategy<Value = u32> {
    0u32..200u32
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_deltas_are_never_negative(delta in arb_delta()) {
            prop_assert!(delta >= Fixed::ZERO);
        }

        #[test]
        fn prop_regular_kinds_exclude_bosses(kind in arb_regular_enemy_kind()) {
            prop_assert!(!matches!(
                kind,
                EnemyKind::ForestGuardian
                    | EnemyKind::StoneGolem
                    | EnemyKind::FenWitch
                    | EnemyKind::SunderedKing
            ));
        }
    }
}
