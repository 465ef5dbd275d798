//! Wave theme enemy pools.

use std::collections::BTreeMap;

use crate::enemy::EnemyKind;
use crate::wave::WaveTheme;

/// Enemy pool for every theme.
#[must_use]
pub fn builtin_theme_pools() -> BTreeMap<WaveTheme, Vec<EnemyKind>> {
    use EnemyKind::{
        Archer, Brute, Imp, Knight, Raider, Scout, Shaman, Skitter, Swarmling, Warlock, Wolf,
        Wraith,
    };

    BTreeMap::from([
        (WaveTheme::Skirmish, vec![Scout, Raider, Archer]),
        (WaveTheme::Swarm, vec![Swarmling, Imp, Skitter]),
        (WaveTheme::Vanguard, vec![Raider, Knight, Archer]),
        (WaveTheme::Ambush, vec![Scout, Wolf, Wraith]),
        (WaveTheme::Horde, vec![Swarmling, Raider, Brute]),
        (WaveTheme::Elite, vec![Brute, Wraith, Knight, Warlock]),
        (WaveTheme::Beasts, vec![Wolf, Skitter]),
        (WaveTheme::Arcane, vec![Shaman, Warlock, Imp]),
        (WaveTheme::Siege, vec![Brute, Knight, Raider]),
        (WaveTheme::BossAssault, vec![Raider, Knight, Shaman]),
    ])
}
