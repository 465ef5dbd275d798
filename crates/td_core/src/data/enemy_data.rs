//! Enemy template data.

use serde::{Deserialize, Serialize};

use crate::enemy::{AbilityId, EnemyCategory, EnemyKind};

/// Data-driven enemy definition.
///
/// HP is not stored directly: the factory derives it from the day/threat
/// formula and adds `hp_delta`.
///
/// # Example RON
///
/// ```ron
/// EnemyTemplate(
///     kind: Shaman,
///     category: Standard,
///     hp_delta: 2,
///     speed_pct: 75,   // 0.75 cells per step
///     damage: 2,
///     gold: 5,
///     abilities: [Regeneration],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnemyTemplate {
    /// Kind this template describes.
    pub kind: EnemyKind,

    /// Category of the kind.
    pub category: EnemyCategory,

    /// Added to the formula HP (result is never below 1).
    pub hp_delta: i32,

    /// Flat armor before day scaling.
    #[serde(default)]
    pub armor: u32,

    /// Lane speed in percent of a cell per step.
    pub speed_pct: u32,

    /// Contact damage against the castle.
    pub damage: u32,

    /// Gold credited on kill.
    pub gold: u32,

    /// Abilities the enemy spawns with.
    #[serde(default)]
    pub abilities: Vec<AbilityId>,
}

#[allow(clippy::too_many_arguments)]
fn template(
    kind: EnemyKind,
    category: EnemyCategory,
    hp_delta: i32,
    armor: u32,
    speed_pct: u32,
    damage: u32,
    gold: u32,
    abilities: &[AbilityId],
) -> EnemyTemplate {
    EnemyTemplate {
        kind,
        category,
        hp_delta,
        armor,
        speed_pct,
        damage,
        gold,
        abilities: abilities.to_vec(),
    }
}

/// Built-in enemy roster.
#[must_use]
pub fn builtin_enemies() -> Vec<EnemyTemplate> {
    use AbilityId::{Enrage, Fortify, PhantomStep, Regeneration, Summon};
    use EnemyCategory::{Boss, Elite, Minion, Standard};
    use EnemyKind as K;

    vec![
        template(K::Swarmling, Minion, -4, 0, 100, 1, 1, &[]),
        template(K::Imp, Minion, -3, 0, 150, 1, 1, &[]),
        template(K::Skitter, Minion, -2, 0, 200, 1, 2, &[]),
        template(K::Scout, Standard, -2, 0, 150, 2, 3, &[]),
        template(K::Raider, Standard, 0, 1, 100, 3, 4, &[]),
        template(K::Archer, Standard, -1, 0, 100, 3, 4, &[]),
        template(K::Shaman, Standard, 2, 0, 75, 2, 5, &[Regeneration]),
        template(K::Wolf, Standard, 0, 0, 200, 2, 4, &[]),
        template(K::Brute, Elite, 10, 3, 50, 6, 10, &[Enrage]),
        template(K::Wraith, Elite, 4, 0, 100, 4, 10, &[PhantomStep]),
        template(K::Knight, Elite, 8, 4, 75, 5, 12, &[Fortify]),
        template(K::Warlock, Elite, 6, 1, 75, 5, 12, &[Summon]),
        template(K::ForestGuardian, Boss, 0, 2, 50, 10, 50, &[]),
        template(K::StoneGolem, Boss, 20, 6, 25, 15, 60, &[]),
        template(K::FenWitch, Boss, -10, 1, 75, 12, 60, &[]),
        template(K::SunderedKing, Boss, 40, 4, 50, 20, 100, &[]),
    ]
}
