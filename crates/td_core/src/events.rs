//! Events emitted by the combat loop.
//!
//! Every command returns the events it produced, in order. Each event has a
//! human-readable [`Display`](fmt::Display) rendering for presentation layers
//! and serializes for JSON output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::damage::DamageType;
use crate::enemy::{AbilityId, Affix, EnemyId, EnemyKind};
use crate::math::GridPos;
use crate::status::StatusKind;
use crate::tower::{TowerId, TowerKind};
use crate::wave::WaveTheme;

/// Terminal outcome of a wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveResult {
    /// Every spawn was dealt with and the castle stands.
    Victory,
    /// Castle HP reached zero.
    Defeat,
}

/// Something that happened during a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CombatEvent {
    /// A wave began.
    WaveStarted {
        /// Day.
        day: u32,
        /// Wave index.
        wave_index: u32,
        /// Theme.
        theme: WaveTheme,
        /// Total spawns including any boss.
        spawns: u32,
    },
    /// A regular enemy entered the lane.
    EnemySpawned {
        /// Enemy id.
        id: EnemyId,
        /// Kind.
        kind: EnemyKind,
        /// Word assigned.
        word: String,
        /// Affix rolled.
        affix: Option<Affix>,
    },
    /// A boss entered the lane.
    BossSpawned {
        /// Enemy id.
        id: EnemyId,
        /// Kind.
        kind: EnemyKind,
        /// Display name.
        name: String,
        /// Word assigned.
        word: String,
    },
    /// A typed prefix locked onto an enemy.
    TargetLocked {
        /// Enemy id.
        id: EnemyId,
        /// Enemy word.
        word: String,
    },
    /// The player finished an enemy's word.
    WordCompleted {
        /// Enemy id.
        id: EnemyId,
        /// Word completed.
        word: String,
        /// Damage dealt.
        damage: u32,
    },
    /// A surviving enemy received a fresh word.
    WordReassigned {
        /// Enemy id.
        id: EnemyId,
        /// New word.
        word: String,
    },
    /// A keystroke matched nothing.
    Miss {
        /// Offending character.
        typed: char,
        /// Misses so far.
        misses: u32,
    },
    /// A tower damaged an enemy.
    TowerHit {
        /// Tower id.
        tower: TowerId,
        /// Enemy id.
        enemy: EnemyId,
        /// Damage dealt.
        damage: u32,
        /// Damage type.
        damage_type: DamageType,
    },
    /// The castle's own defenses damaged the foremost enemy.
    CastleShot {
        /// Enemy id.
        enemy: EnemyId,
        /// Damage dealt.
        damage: u32,
    },
    /// A shield absorbed a hit.
    ShieldAbsorbed {
        /// Enemy id.
        id: EnemyId,
    },
    /// Phantom evasion dodged a hit.
    Evaded {
        /// Enemy id.
        id: EnemyId,
    },
    /// A status was applied.
    StatusApplied {
        /// Enemy id.
        id: EnemyId,
        /// Status.
        status: StatusKind,
    },
    /// Damage-over-time pulse.
    DotTick {
        /// Enemy id.
        id: EnemyId,
        /// Status.
        status: StatusKind,
        /// Damage dealt.
        damage: u32,
    },
    /// An enemy regained HP.
    EnemyHealed {
        /// Enemy id.
        id: EnemyId,
        /// HP restored.
        amount: u32,
    },
    /// An enemy died.
    EnemyKilled {
        /// Enemy id.
        id: EnemyId,
        /// Kind.
        kind: EnemyKind,
    },
    /// Gold credited to the economy.
    GoldAwarded {
        /// Amount.
        amount: u32,
    },
    /// Loot credited to the economy.
    LootDropped {
        /// Item id.
        item: String,
        /// Quantity.
        quantity: u32,
    },
    /// A dying enemy split.
    EnemySplit {
        /// Parent enemy id.
        parent: EnemyId,
        /// Spawned children.
        children: Vec<EnemyId>,
    },
    /// An enemy reached the castle and was removed.
    EnemyReachedBase {
        /// Enemy id.
        id: EnemyId,
    },
    /// Castle HP dropped.
    CastleDamaged {
        /// HP lost.
        amount: u32,
        /// HP remaining.
        remaining: u32,
    },
    /// A boss entered a new phase.
    BossPhaseChanged {
        /// Enemy id.
        id: EnemyId,
        /// Phase index.
        phase: usize,
        /// Phase name.
        name: String,
    },
    /// An enemy ability fired.
    AbilityTriggered {
        /// Enemy id.
        id: EnemyId,
        /// Ability.
        ability: AbilityId,
    },
    /// A synergy became active.
    SynergyActivated {
        /// Synergy name.
        name: String,
        /// Covered cells.
        positions: Vec<GridPos>,
    },
    /// A synergy stopped being active.
    SynergyDeactivated {
        /// Synergy name.
        name: String,
    },
    /// A tower was placed.
    TowerPlaced {
        /// Tower id.
        id: TowerId,
        /// Kind.
        kind: TowerKind,
        /// Cell.
        position: GridPos,
    },
    /// A tower gained a level.
    TowerUpgraded {
        /// Tower id.
        id: TowerId,
        /// New level.
        level: u8,
    },
    /// A tower was removed.
    TowerRemoved {
        /// Tower id.
        id: TowerId,
    },
    /// A tower's targeting changed.
    TargetingChanged {
        /// Tower id.
        id: TowerId,
    },
    /// A command was invalid and did nothing.
    CommandRejected {
        /// Why.
        reason: String,
    },
    /// Castle HP restored after a victory.
    ResourcesRestored {
        /// Castle HP after restoring.
        castle_hp: u32,
    },
    /// The wave ended.
    WaveEnded {
        /// Outcome.
        result: WaveResult,
    },
}

impl fmt::Display for CombatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatEvent::WaveStarted {
                day,
                wave_index,
                theme,
                spawns,
            } => write!(
                f,
                "Day {day}, wave {}: {theme} ({spawns} enemies)",
                wave_index + 1
            ),
            CombatEvent::EnemySpawned {
                id,
                kind,
                word,
                affix,
            } => match affix {
                Some(affix) => write!(f, "A {affix} {kind} appears (#{id}, \"{word}\")"),
                None => write!(f, "A {kind} appears (#{id}, \"{word}\")"),
            },
            CombatEvent::BossSpawned { id, name, word, .. } => {
                write!(f, "{name} approaches! (#{id}, \"{word}\")")
            }
            CombatEvent::TargetLocked { id, word } => write!(f, "Targeting #{id} \"{word}\""),
            CombatEvent::WordCompleted { id, word, damage } => {
                write!(f, "\"{word}\" strikes #{id} for {damage}")
            }
            CombatEvent::WordReassigned { id, word } => write!(f, "#{id} now reads \"{word}\""),
            CombatEvent::Miss { typed, misses } => write!(f, "Miss '{typed}' ({misses} total)"),
            CombatEvent::TowerHit {
                tower,
                enemy,
                damage,
                damage_type,
            } => write!(f, "Tower #{tower} hits #{enemy} for {damage} {damage_type}"),
            CombatEvent::CastleShot { enemy, damage } => {
                write!(f, "The castle fires on #{enemy} for {damage}")
            }
            CombatEvent::ShieldAbsorbed { id } => write!(f, "#{id}'s shield absorbs the hit"),
            CombatEvent::Evaded { id } => write!(f, "#{id} phases out of the way"),
            CombatEvent::StatusApplied { id, status } => {
                write!(f, "#{id} is {}", status.name())
            }
            CombatEvent::DotTick { id, status, damage } => {
                write!(f, "#{id} takes {damage} from being {}", status.name())
            }
            CombatEvent::EnemyHealed { id, amount } => write!(f, "#{id} heals {amount}"),
            CombatEvent::EnemyKilled { id, kind } => write!(f, "{kind} #{id} is slain"),
            CombatEvent::GoldAwarded { amount } => write!(f, "+{amount} gold"),
            CombatEvent::LootDropped { item, quantity } => write!(f, "Loot: {quantity}x {item}"),
            CombatEvent::EnemySplit { parent, children } => {
                write!(f, "#{parent} splits into {} swarmlings", children.len())
            }
            CombatEvent::EnemyReachedBase { id } => write!(f, "#{id} reached the base"),
            CombatEvent::CastleDamaged { amount, remaining } => {
                write!(f, "The castle takes {amount} damage ({remaining} HP left)")
            }
            CombatEvent::BossPhaseChanged { id, phase, name } => {
                write!(f, "Boss #{id} enters phase {}: {name}", phase + 1)
            }
            CombatEvent::AbilityTriggered { id, ability } => {
                write!(f, "#{id} uses {}", ability.name())
            }
            CombatEvent::SynergyActivated { name, positions } => {
                write!(f, "Synergy {name} active on {} towers", positions.len())
            }
            CombatEvent::SynergyDeactivated { name } => write!(f, "Synergy {name} lost"),
            CombatEvent::TowerPlaced { id, kind, position } => {
                write!(f, "Built {kind} tower #{id} at {position}")
            }
            CombatEvent::TowerUpgraded { id, level } => {
                write!(f, "Tower #{id} upgraded to level {level}")
            }
            CombatEvent::TowerRemoved { id } => write!(f, "Tower #{id} removed"),
            CombatEvent::TargetingChanged { id } => write!(f, "Tower #{id} retargeted"),
            CombatEvent::CommandRejected { reason } => write!(f, "Rejected: {reason}"),
            CombatEvent::ResourcesRestored { castle_hp } => {
                write!(f, "Castle restored to {castle_hp} HP")
            }
            CombatEvent::WaveEnded { result } => match result {
                WaveResult::Victory => f.write_str("Victory!"),
                WaveResult::Defeat => f.write_str("The castle has fallen"),
            },
        }
    }
}
