//! Built-in boss definitions.

use crate::boss::{BossDef, BossPhase, LootEntry};
use crate::enemy::{AbilityId, EnemyKind};

fn phase(name: &str, threshold_pct: u32, abilities: &[AbilityId]) -> BossPhase {
    BossPhase {
        name: name.to_string(),
        threshold_pct,
        abilities: abilities.to_vec(),
    }
}

fn loot(item: &str, quantity: u32) -> LootEntry {
    LootEntry {
        item: item.to_string(),
        quantity,
    }
}

/// One boss per region, unlocking a week apart.
#[must_use]
pub fn builtin_bosses() -> Vec<BossDef> {
    use AbilityId::{Enrage, Fortify, Haste, PhantomStep, Regeneration, Reshield, Summon};

    vec![
        BossDef {
            kind: EnemyKind::ForestGuardian,
            name: "The Forest Guardian".to_string(),
            region: "Whispering Woods".to_string(),
            unlock_day: 7,
            phases: vec![
                phase("Awakened", 100, &[Regeneration]),
                phase("Rooted", 60, &[Fortify]),
                phase("Wrath of the Wild", 30, &[Summon, Enrage]),
            ],
            loot: vec![loot("heartwood", 2), loot("ancient_seed", 1)],
        },
        BossDef {
            kind: EnemyKind::StoneGolem,
            name: "The Stone Golem".to_string(),
            region: "Granite Pass".to_string(),
            unlock_day: 14,
            phases: vec![
                phase("Stone Skin", 100, &[Fortify]),
                phase("Cracked", 50, &[Reshield]),
                phase("Crumbling", 25, &[Enrage, Haste]),
            ],
            loot: vec![loot("granite_core", 1), loot("iron_ore", 5)],
        },
        BossDef {
            kind: EnemyKind::FenWitch,
            name: "The Fen Witch".to_string(),
            region: "Mirefen".to_string(),
            unlock_day: 21,
            phases: vec![
                phase("Hex", 100, &[PhantomStep]),
                phase("Coven", 60, &[Summon]),
                phase("Drowned Fury", 30, &[Regeneration, Haste]),
            ],
            loot: vec![loot("witch_lantern", 1), loot("bog_herb", 4)],
        },
        BossDef {
            kind: EnemyKind::SunderedKing,
            name: "The Sundered King".to_string(),
            region: "Ruined Citadel".to_string(),
            unlock_day: 28,
            phases: vec![
                phase("Regal", 100, &[Reshield]),
                phase("Sundered", 66, &[Summon, Fortify]),
                phase("Last Stand", 33, &[Enrage, Haste, PhantomStep]),
            ],
            loot: vec![loot("broken_crown", 1), loot("gold_ingot", 3)],
        },
    ]
}
