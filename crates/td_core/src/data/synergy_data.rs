//! Built-in synergy definitions.

use std::collections::BTreeMap;

use crate::math::Multiplier;
use crate::synergy::{BonusStat, SynergyDef, SynergyPattern};
use crate::tower::TowerFamily;

fn synergy(name: &str, pattern: SynergyPattern, bonuses: &[(BonusStat, u32)]) -> SynergyDef {
    SynergyDef {
        name: name.to_string(),
        pattern,
        bonuses: bonuses
            .iter()
            .map(|&(stat, pct)| (stat, Multiplier::from_percent(pct)))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// Built-in synergies, in detection order.
#[must_use]
pub fn builtin_synergies() -> Vec<SynergyDef> {
    use BonusStat::{AttackSpeed, Damage, Range};
    use TowerFamily::{Arcane, Elemental, Marksman, Nature, Siege, Support};

    vec![
        synergy("Crossfire", SynergyPattern::Pair(Marksman, Siege), &[(Damage, 120)]),
        synergy("Elemental Storm", SynergyPattern::Pair(Elemental, Arcane), &[(Damage, 120)]),
        synergy(
            "Arcane Nexus",
            SynergyPattern::Cluster {
                family: Arcane,
                min_size: 3,
            },
            &[(Damage, 115), (Range, 134)],
        ),
        synergy(
            "Overgrowth",
            SynergyPattern::Cluster {
                family: Nature,
                min_size: 3,
            },
            &[(AttackSpeed, 125)],
        ),
        synergy(
            "Guided Volley",
            SynergyPattern::Supported {
                primary: Marksman,
                support: Support,
            },
            &[(Range, 134), (AttackSpeed, 110)],
        ),
        synergy(
            "Sanctified Flames",
            SynergyPattern::Supported {
                primary: Elemental,
                support: Support,
            },
            &[(Damage, 120)],
        ),
    ]
}
