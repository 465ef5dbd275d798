//! Wave composition.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::Catalog;
use crate::enemy::EnemyKind;
use crate::rng::SimRng;

/// Boss assaults close every seventh day.
pub const BOSS_DAY_INTERVAL: u32 = 7;

/// Closed set of wave themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WaveTheme {
    /// Mixed light infantry.
    Skirmish,
    /// Many minions.
    Swarm,
    /// Armored front line.
    Vanguard,
    /// Fast flankers.
    Ambush,
    /// Bulk with a heavy.
    Horde,
    /// Elites only.
    Elite,
    /// Fast animals.
    Beasts,
    /// Casters.
    Arcane,
    /// Slow, tough attackers.
    Siege,
    /// Escorted boss, only on the last wave of a boss day.
    BossAssault,
}

impl WaveTheme {
    /// Every theme, in declaration order.
    pub const ALL: [WaveTheme; 10] = [
        WaveTheme::Skirmish,
        WaveTheme::Swarm,
        WaveTheme::Vanguard,
        WaveTheme::Ambush,
        WaveTheme::Horde,
        WaveTheme::Elite,
        WaveTheme::Beasts,
        WaveTheme::Arcane,
        WaveTheme::Siege,
        WaveTheme::BossAssault,
    ];

    /// Snake-case identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            WaveTheme::Skirmish => "skirmish",
            WaveTheme::Swarm => "swarm",
            WaveTheme::Vanguard => "vanguard",
            WaveTheme::Ambush => "ambush",
            WaveTheme::Horde => "horde",
            WaveTheme::Elite => "elite",
            WaveTheme::Beasts => "beasts",
            WaveTheme::Arcane => "arcane",
            WaveTheme::Siege => "siege",
            WaveTheme::BossAssault => "boss_assault",
        }
    }
}

impl fmt::Display for WaveTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A composed wave. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveSpec {
    /// Wave index within the day.
    pub index: u32,
    /// Theme.
    pub theme: WaveTheme,
    /// Regular enemies, in spawn order.
    pub roster: Vec<EnemyKind>,
    /// Boss spawned after the roster, if any.
    pub boss: Option<EnemyKind>,
}

impl WaveSpec {
    /// Whether a boss is present.
    #[must_use]
    pub const fn has_boss(&self) -> bool {
        self.boss.is_some()
    }

    /// Total spawns including the boss.
    #[must_use]
    pub fn spawn_count(&self) -> usize {
        self.roster.len() + usize::from(self.has_boss())
    }
}

/// Final wave of a boss day.
#[must_use]
pub const fn is_boss_wave(day: u32, wave_index: u32, total_waves: u32) -> bool {
    let total = if total_waves == 0 { 1 } else { total_waves };
    day > 0 && day % BOSS_DAY_INTERVAL == 0 && wave_index + 1 == total
}

/// `floor((2 + day/2) × (1 + wave_index/total_waves))`, at least 1.
#[must_use]
pub fn enemy_count(day: u32, wave_index: u32, total_waves: u32) -> u32 {
    let total = u64::from(total_waves.max(1));
    let count = (4 + u64::from(day)) * (total + u64::from(wave_index)) / (2 * total);
    u32::try_from(count).unwrap_or(u32::MAX).max(1)
}

/// Compose a wave.
///
/// Draw order from `rng`: theme (skipped on boss waves), one kind per
/// roster slot, then the boss.
pub fn compose_wave(
    rng: &mut SimRng,
    catalog: &Catalog,
    day: u32,
    wave_index: u32,
    total_waves: u32,
) -> WaveSpec {
    let boss_wave = is_boss_wave(day, wave_index, total_waves);
    let theme = if boss_wave {
        WaveTheme::BossAssault
    } else {
        let regular = &WaveTheme::ALL[..WaveTheme::ALL.len() - 1];
        rng.pick(regular).copied().unwrap_or(WaveTheme::Skirmish)
    };

    let pool = catalog.theme_pool(theme);
    let count = enemy_count(day, wave_index, total_waves);
    let roster = (0..count)
        .filter_map(|_| rng.pick(pool).copied())
        .collect();

    let boss = boss_wave.then(|| pick_boss(rng, catalog, day)).flatten();

    WaveSpec {
        index: wave_index,
        theme,
        roster,
        boss,
    }
}

fn pick_boss(rng: &mut SimRng, catalog: &Catalog, day: u32) -> Option<EnemyKind> {
    let unlocked: Vec<EnemyKind> = catalog
        .bosses
        .values()
        .filter(|def| def.unlock_day <= day)
        .map(|def| def.kind)
        .collect();
    if unlocked.is_empty() {
        return catalog
            .bosses
            .values()
            .min_by_key(|def| def.unlock_day)
            .map(|def| def.kind);
    }
    rng.pick(&unlocked).copied()
}
