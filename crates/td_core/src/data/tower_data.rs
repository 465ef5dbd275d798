//! Tower template data.

use serde::{Deserialize, Serialize};

use crate::damage::{DamageType, DEFAULT_CHAIN_FALLOFF};
use crate::math::Multiplier;
use crate::status::StatusKind;
use crate::targeting::{AutoTargetMode, TargetMode, Targeting};
use crate::tower::{AttackCategory, TowerFamily, TowerKind};

/// Data-driven tower definition (level 1 stats).
///
/// # Example RON
///
/// ```ron
/// TowerTemplate(
///     kind: Tesla,
///     tier: 3,
///     family: Arcane,
///     category: Chain,
///     damage_type: Lightning,
///     damage: 6,
///     range: 3,
///     cooldown_ms: 1500,
///     max_targets: 4,
///     chain_jump_range: 2,
///     targeting: Auto(Chain),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TowerTemplate {
    /// Kind described.
    pub kind: TowerKind,

    /// Tier (1-4).
    pub tier: u8,

    /// Synergy family.
    pub family: TowerFamily,

    /// Attack category.
    pub category: AttackCategory,

    /// Damage type.
    pub damage_type: DamageType,

    /// Damage per hit.
    pub damage: u32,

    /// Manhattan range.
    pub range: u32,

    /// Milliseconds between attacks.
    pub cooldown_ms: u32,

    /// Targets per attack for multi, chain, aoe-zone and summoner towers.
    #[serde(default = "default_max_targets")]
    pub max_targets: u32,

    /// Splash radius for AOE towers.
    #[serde(default)]
    pub splash_radius: u32,

    /// Chain jump range.
    #[serde(default)]
    pub chain_jump_range: u32,

    /// Chain falloff per jump.
    #[serde(default = "default_chain_falloff")]
    pub chain_falloff: Multiplier,

    /// Status applied on hit in addition to the damage type's.
    #[serde(default)]
    pub extra_status: Option<StatusKind>,

    /// Initial targeting mode.
    pub targeting: Targeting,
}

const fn default_max_targets() -> u32 {
    1
}

const fn default_chain_falloff() -> Multiplier {
    DEFAULT_CHAIN_FALLOFF
}

#[allow(clippy::too_many_arguments)]
fn tower(
    kind: TowerKind,
    tier: u8,
    family: TowerFamily,
    category: AttackCategory,
    damage_type: DamageType,
    damage: u32,
    range: u32,
    cooldown_ms: u32,
    targeting: Targeting,
) -> TowerTemplate {
    TowerTemplate {
        kind,
        tier,
        family,
        category,
        damage_type,
        damage,
        range,
        cooldown_ms,
        max_targets: 1,
        splash_radius: 0,
        chain_jump_range: 0,
        chain_falloff: DEFAULT_CHAIN_FALLOFF,
        extra_status: None,
        targeting,
    }
}

/// Built-in tower roster: four kinds per tier.
#[must_use]
pub fn builtin_towers() -> Vec<TowerTemplate> {
    use AttackCategory as C;
    use DamageType as D;
    use TowerFamily as F;
    use TowerKind as K;

    let manual = Targeting::Manual;
    let auto = Targeting::Auto;

    vec![
        tower(K::Arrow, 1, F::Marksman, C::Single, D::Physical, 3, 3, 1000, manual(TargetMode::Nearest)),
        tower(K::Spark, 1, F::Arcane, C::Single, D::Magical, 2, 3, 800, manual(TargetMode::Nearest)),
        tower(K::Ember, 1, F::Elemental, C::Single, D::Fire, 2, 2, 1200, manual(TargetMode::First)),
        tower(K::Totem, 1, F::Support, C::Support, D::Physical, 0, 1, 1000, manual(TargetMode::Nearest)),
        TowerTemplate {
            max_targets: 2,
            ..tower(K::Ballista, 2, F::Marksman, C::Multi, D::Physical, 5, 4, 1500, manual(TargetMode::Strongest))
        },
        tower(K::Frost, 2, F::Elemental, C::Single, D::Cold, 2, 3, 1500, manual(TargetMode::Fastest)),
        TowerTemplate {
            max_targets: 3,
            extra_status: Some(StatusKind::Slowed),
            ..tower(K::Thorn, 2, F::Nature, C::Multi, D::Poison, 2, 2, 1000, manual(TargetMode::First))
        },
        TowerTemplate {
            splash_radius: 1,
            ..tower(K::Catapult, 2, F::Siege, C::Aoe, D::Physical, 6, 4, 2500, manual(TargetMode::First))
        },
        TowerTemplate {
            max_targets: 4,
            chain_jump_range: 2,
            ..tower(K::Tesla, 3, F::Arcane, C::Chain, D::Lightning, 6, 3, 1500, auto(AutoTargetMode::Chain))
        },
        TowerTemplate {
            splash_radius: 2,
            ..tower(K::Inferno, 3, F::Elemental, C::Aoe, D::Fire, 5, 3, 2000, auto(AutoTargetMode::Cluster))
        },
        tower(K::Sanctum, 3, F::Support, C::Support, D::Holy, 0, 1, 1000, auto(AutoTargetMode::Zone)),
        TowerTemplate {
            max_targets: 2,
            ..tower(K::Kennel, 3, F::Nature, C::Summoner, D::Physical, 4, 2, 700, auto(AutoTargetMode::Contact))
        },
        TowerTemplate {
            max_targets: 6,
            chain_jump_range: 3,
            chain_falloff: Multiplier::from_percent(85),
            ..tower(K::Storm, 4, F::Arcane, C::Chain, D::Lightning, 10, 4, 1500, auto(AutoTargetMode::Smart))
        },
        tower(K::Obelisk, 4, F::Arcane, C::Single, D::Magical, 18, 5, 2500, auto(AutoTargetMode::HighestHp)),
        TowerTemplate {
            max_targets: 8,
            ..tower(K::Cathedral, 4, F::Support, C::Multi, D::Holy, 4, 3, 1500, auto(AutoTargetMode::Zone))
        },
        TowerTemplate {
            max_targets: 3,
            ..tower(K::Grove, 4, F::Nature, C::Summoner, D::Physical, 7, 2, 600, auto(AutoTargetMode::Contact))
        },
    ]
}
