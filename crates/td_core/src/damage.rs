//! Damage resolution.
//!
//! Pure functions turning a base hit into final damage. They never mutate an
//! enemy; the caller applies the result through [`Enemy::apply_damage`].
//!
//! ## Armor
//!
//! | Type              | Armor applied |
//! |-------------------|---------------|
//! | Magical, Pure     | none          |
//! | Poison            | half          |
//! | everything else   | full          |
//!
//! Armor-reduced damage is floored at 1 before type multipliers apply
//! (holy ×1.5 against affixed enemies, lightning ×1.2, fire ×3 against frozen
//! enemies). The final value is floored at 1 again.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enemy::Enemy;
use crate::math::{Fixed, Multiplier, BASIS_POINTS};
use crate::status::StatusKind;

/// Default chain falloff (×0.8 per jump).
pub const DEFAULT_CHAIN_FALLOFF: Multiplier = Multiplier::from_percent(80);

/// Minimum AOE multiplier at the edge of the blast, in tenths.
const AOE_FLOOR_TENTHS: u64 = 3;

/// Damage type of a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DamageType {
    /// Plain damage, full armor.
    Physical,
    /// Ignores armor.
    Magical,
    /// Ignores armor; used for typed hits.
    Pure,
    /// Half armor; applies poison.
    Poison,
    /// Bonus against affixed enemies.
    Holy,
    /// Always ×1.2.
    Lightning,
    /// Triple against frozen enemies; applies burning.
    Fire,
    /// Applies frozen.
    Cold,
}

impl DamageType {
    /// Lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            DamageType::Physical => "physical",
            DamageType::Magical => "magical",
            DamageType::Pure => "pure",
            DamageType::Poison => "poison",
            DamageType::Holy => "holy",
            DamageType::Lightning => "lightning",
            DamageType::Fire => "fire",
            DamageType::Cold => "cold",
        }
    }

    /// Status inflicted on hit, with its duration in seconds.
    #[must_use]
    pub fn on_hit_status(self) -> Option<(StatusKind, Fixed)> {
        match self {
            DamageType::Fire => Some((StatusKind::Burning, Fixed::from_num(3))),
            DamageType::Poison => Some((StatusKind::Poisoned, Fixed::from_num(4))),
            DamageType::Cold => Some((StatusKind::Frozen, Fixed::from_num(1))),
            _ => None,
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Final damage of a hit against `enemy`.
#[must_use]
pub fn resolve(base: u32, damage_type: DamageType, enemy: &Enemy) -> u32 {
    let after_armor = match damage_type {
        DamageType::Magical | DamageType::Pure => base,
        DamageType::Poison => base.saturating_sub(enemy.armor / 2),
        _ => base.saturating_sub(enemy.armor),
    }
    .max(1);

    let scaled = match damage_type {
        DamageType::Holy if enemy.affix.is_some() => after_armor.saturating_mul(3) / 2,
        DamageType::Lightning => after_armor.saturating_mul(6) / 5,
        DamageType::Fire if enemy.statuses.has(StatusKind::Frozen) => after_armor.saturating_mul(3),
        _ => after_armor,
    };
    scaled.max(1)
}

/// Damage at chain jump `jump` (0 is the primary target): `base × falloff^jump`.
///
/// Rounded down after every jump and floored at 1.
#[must_use]
pub fn chain_damage(base: u32, jump: u32, falloff: Multiplier) -> u32 {
    let mut scaled = u64::from(base) * BASIS_POINTS;
    for _ in 0..jump {
        if scaled < BASIS_POINTS {
            break;
        }
        scaled = scaled * u64::from(falloff.basis_points()) / BASIS_POINTS;
    }
    u32::try_from(scaled / BASIS_POINTS)
        .unwrap_or(u32::MAX)
        .max(1)
}

/// Splash damage at Manhattan `distance` from the impact centre.
///
/// Multiplier is `max(0.3, 1 − d/(r+1))`; the centre takes exactly `base`.
#[must_use]
pub fn aoe_damage(base: u32, distance: u32, radius: u32) -> u32 {
    if distance == 0 {
        return base.max(1);
    }
    let span = u64::from(radius) + 1;
    let linear = 10 * span.saturating_sub(u64::from(distance));
    let numerator = linear.max(AOE_FLOOR_TENTHS * span);
    let scaled = u64::from(base) * numerator / (10 * span);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Damage of one DOT pulse.
#[must_use]
pub const fn dot_damage(base: u32, stacks: u32) -> u32 {
    let stacks = if stacks == 0 { 1 } else { stacks };
    base.saturating_mul(stacks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Catalog;
    use crate::enemy::{apply_affix, create_enemy, Affix, EnemyKind};
    use crate::math::GridPos;
    use proptest::prelude::*;

    fn armored_enemy(armor: u32) -> Enemy {
        let catalog = Catalog::builtin();
        let template = catalog.enemy(EnemyKind::Raider).unwrap();
        let mut enemy = create_enemy(template, 1, GridPos::new(0, 0), "raid", 1, 0);
        enemy.armor = armor;
        enemy
    }

    #[test]
    fn test_armor_by_type() {
        let enemy = armored_enemy(4);
        assert_eq!(resolve(10, DamageType::Physical, &enemy), 6);
        assert_eq!(resolve(10, DamageType::Magical, &enemy), 10);
        assert_eq!(resolve(10, DamageType::Pure, &enemy), 10);
        assert_eq!(resolve(10, DamageType::Poison, &enemy), 8);
    }

    #[test]
    fn test_armor_floors_at_one() {
        let enemy = armored_enemy(50);
        assert_eq!(resolve(3, DamageType::Physical, &enemy), 1);
        assert_eq!(resolve(0, DamageType::Cold, &enemy), 1);
    }

    #[test]
    fn test_lightning_multiplier() {
        let enemy = armored_enemy(0);
        assert_eq!(resolve(10, DamageType::Lightning, &enemy), 12);
    }

    #[test]
    fn test_holy_only_bonus_against_affixed() {
        let catalog = Catalog::builtin();
        let mut enemy = armored_enemy(0);
        assert_eq!(resolve(10, DamageType::Holy, &enemy), 10);
        apply_affix(&mut enemy, catalog.affix(Affix::Swift).unwrap());
        assert_eq!(resolve(10, DamageType::Holy, &enemy), 15);
    }

    #[test]
    fn test_fire_triples_against_frozen() {
        let mut enemy = armored_enemy(0);
        assert_eq!(resolve(4, DamageType::Fire, &enemy), 4);
        enemy.statuses.apply(StatusKind::Frozen, Fixed::from_num(1));
        assert_eq!(resolve(4, DamageType::Fire, &enemy), 12);
    }

    #[test]
    fn test_chain_falloff() {
        assert_eq!(chain_damage(100, 0, DEFAULT_CHAIN_FALLOFF), 100);
        assert_eq!(chain_damage(100, 1, DEFAULT_CHAIN_FALLOFF), 80);
        assert_eq!(chain_damage(100, 2, DEFAULT_CHAIN_FALLOFF), 64);
        assert_eq!(chain_damage(2, 10, DEFAULT_CHAIN_FALLOFF), 1);
    }

    #[test]
    fn test_aoe_center_takes_full_damage() {
        assert_eq!(aoe_damage(40, 0, 2), 40);
        assert_eq!(aoe_damage(40, 1, 2), 26);
        assert_eq!(aoe_damage(40, 2, 2), 13);
        assert_eq!(aoe_damage(40, 3, 2), 12);
    }

    #[test]
    fn test_dot_damage_scales_with_stacks() {
        assert_eq!(dot_damage(2, 0), 2);
        assert_eq!(dot_damage(2, 1), 2);
        assert_eq!(dot_damage(2, 4), 8);
    }

    proptest! {
        #[test]
        fn prop_chain_non_increasing(base in 1u32..10_000, jump in 0u32..20, falloff_pct in 1u32..=100) {
            let falloff = Multiplier::from_percent(falloff_pct);
            let here = chain_damage(base, jump, falloff);
            let next = chain_damage(base, jump + 1, falloff);
            prop_assert!(next <= here);
            prop_assert!(next >= 1);
        }

        #[test]
        fn prop_aoe_non_increasing(base in 1u32..10_000, radius in 0u32..6, distance in 0u32..8) {
            let here = aoe_damage(base, distance, radius);
            let next = aoe_damage(base, distance + 1, radius);
            prop_assert!(next <= here);
            prop_assert!(next >= 1);
            prop_assert_eq!(aoe_damage(base, 0, radius), base);
        }

        #[test]
        fn prop_resolve_at_least_one(base in 0u32..500, armor in 0u32..100) {
            let enemy = armored_enemy(armor);
            for damage_type in [
                DamageType::Physical,
                DamageType::Magical,
                DamageType::Pure,
                DamageType::Poison,
                DamageType::Holy,
                DamageType::Lightning,
                DamageType::Fire,
                DamageType::Cold,
            ] {
                prop_assert!(resolve(base, damage_type, &enemy) >= 1);
            }
        }
    }
}
