//! Enemy model: kinds, affixes, abilities and the enemy value type.
//!
//! Enemies are closed, strongly-typed structs. Every stat an affix or ability
//! can change is a named field, and the one-shot defensive mechanisms
//! (phantom evasion, shield) are explicit [`DefenseCharge`] states.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::{AffixDef, EnemyTemplate};
use crate::error::CoreError;
use crate::math::{fixed_serde, percent, Fixed, GridPos};
use crate::rng::SimRng;
use crate::status::{StatusEffects, StatusKind};

/// Unique, monotonically increasing enemy identifier.
pub type EnemyId = u32;

/// Chance (percent) that a spawn rolls an affix at all.
pub const AFFIX_CHANCE_PERCENT: u32 = 30;

/// Coarse enemy category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnemyCategory {
    /// Weak fodder with short words.
    Minion,
    /// Regular wave enemy.
    Standard,
    /// Tough enemy with abilities.
    Elite,
    /// Multi-phase boss.
    Boss,
}

impl EnemyCategory {
    /// Lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            EnemyCategory::Minion => "minion",
            EnemyCategory::Standard => "standard",
            EnemyCategory::Elite => "elite",
            EnemyCategory::Boss => "boss",
        }
    }
}

/// Closed set of enemy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Minion.
    Swarmling,
    /// Minion.
    Imp,
    /// Minion.
    Skitter,
    /// Standard.
    Scout,
    /// Standard.
    Raider,
    /// Standard.
    Archer,
    /// Standard, regenerates.
    Shaman,
    /// Standard.
    Wolf,
    /// Elite, enrages when bloodied.
    Brute,
    /// Elite, evades the first hit.
    Wraith,
    /// Elite, fortifies when bloodied.
    Knight,
    /// Elite, summons swarmlings.
    Warlock,
    /// Boss.
    ForestGuardian,
    /// Boss.
    StoneGolem,
    /// Boss.
    FenWitch,
    /// Boss.
    SunderedKing,
}

impl EnemyKind {
    /// Every kind, in declaration order.
    pub const ALL: [EnemyKind; 16] = [
        EnemyKind::Swarmling,
        EnemyKind::Imp,
        EnemyKind::Skitter,
        EnemyKind::Scout,
        EnemyKind::Raider,
        EnemyKind::Archer,
        EnemyKind::Shaman,
        EnemyKind::Wolf,
        EnemyKind::Brute,
        EnemyKind::Wraith,
        EnemyKind::Knight,
        EnemyKind::Warlock,
        EnemyKind::ForestGuardian,
        EnemyKind::StoneGolem,
        EnemyKind::FenWitch,
        EnemyKind::SunderedKing,
    ];

    /// Snake-case identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            EnemyKind::Swarmling => "swarmling",
            EnemyKind::Imp => "imp",
            EnemyKind::Skitter => "skitter",
            EnemyKind::Scout => "scout",
            EnemyKind::Raider => "raider",
            EnemyKind::Archer => "archer",
            EnemyKind::Shaman => "shaman",
            EnemyKind::Wolf => "wolf",
            EnemyKind::Brute => "brute",
            EnemyKind::Wraith => "wraith",
            EnemyKind::Knight => "knight",
            EnemyKind::Warlock => "warlock",
            EnemyKind::ForestGuardian => "forest_guardian",
            EnemyKind::StoneGolem => "stone_golem",
            EnemyKind::FenWitch => "fen_witch",
            EnemyKind::SunderedKing => "sundered_king",
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnemyKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnemyKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| CoreError::UnknownEnemyKind(s.to_string()))
    }
}

/// Closed set of affixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Affix {
    /// Faster, slightly frailer.
    Swift,
    /// Extra flat armor.
    Armored,
    /// Extra HP, shorter status effects.
    Resilient,
    /// Blocks exactly one hit.
    Shielded,
    /// Heals every step.
    Regenerating,
    /// Splits into swarmlings on death.
    Splitting,
    /// Hits harder, speeds up when bloodied.
    Enraged,
    /// Feeds on the player's mistakes.
    Vampiric,
}

impl Affix {
    /// Every affix, in declaration order.
    pub const ALL: [Affix; 8] = [
        Affix::Swift,
        Affix::Armored,
        Affix::Resilient,
        Affix::Shielded,
        Affix::Regenerating,
        Affix::Splitting,
        Affix::Enraged,
        Affix::Vampiric,
    ];

    /// Lower-case identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Affix::Swift => "swift",
            Affix::Armored => "armored",
            Affix::Resilient => "resilient",
            Affix::Shielded => "shielded",
            Affix::Regenerating => "regenerating",
            Affix::Splitting => "splitting",
            Affix::Enraged => "enraged",
            Affix::Vampiric => "vampiric",
        }
    }
}

impl fmt::Display for Affix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Affix {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Affix::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| CoreError::UnknownAffix(s.to_string()))
    }
}

/// When an ability acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityTrigger {
    /// Always on while the ability is unlocked.
    Passive,
    /// Fires once when unlocked on a boss, or when a regular enemy is bloodied.
    Trigger,
    /// Fires repeatedly on a countdown.
    Cooldown,
    /// Fires when the enemy dies.
    Death,
}

/// Closed set of enemy abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbilityId {
    /// Evades the first incoming hit.
    PhantomStep,
    /// Heals a share of max HP each step.
    Regeneration,
    /// Moves faster.
    Enrage,
    /// Gains flat armor.
    Fortify,
    /// Restores a consumed shield.
    Reshield,
    /// Calls two swarmlings.
    Summon,
    /// Lunges one cell forward.
    Haste,
    /// Splits into swarmlings on death.
    Split,
}

impl AbilityId {
    /// Trigger tag for this ability.
    #[must_use]
    pub const fn trigger(self) -> AbilityTrigger {
        match self {
            AbilityId::PhantomStep | AbilityId::Regeneration => AbilityTrigger::Passive,
            AbilityId::Enrage | AbilityId::Fortify | AbilityId::Reshield => AbilityTrigger::Trigger,
            AbilityId::Summon | AbilityId::Haste => AbilityTrigger::Cooldown,
            AbilityId::Split => AbilityTrigger::Death,
        }
    }

    /// Countdown between activations, in seconds, for cooldown abilities.
    #[must_use]
    pub fn cooldown(self) -> Fixed {
        match self {
            AbilityId::Summon => Fixed::from_num(6),
            AbilityId::Haste => Fixed::from_num(8),
            _ => Fixed::ZERO,
        }
    }

    /// Lower-case identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            AbilityId::PhantomStep => "phantom_step",
            AbilityId::Regeneration => "regeneration",
            AbilityId::Enrage => "enrage",
            AbilityId::Fortify => "fortify",
            AbilityId::Reshield => "reshield",
            AbilityId::Summon => "summon",
            AbilityId::Haste => "haste",
            AbilityId::Split => "split",
        }
    }
}

/// State of a one-shot defensive mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DefenseCharge {
    /// The enemy never had this defense.
    #[default]
    Absent,
    /// Will intercept the next hit.
    Available,
    /// Already used; stays consumed until explicitly reset.
    Consumed,
}

impl DefenseCharge {
    /// Spend the charge if available. Returns whether it fired.
    pub fn consume(&mut self) -> bool {
        if *self == DefenseCharge::Available {
            *self = DefenseCharge::Consumed;
            true
        } else {
            false
        }
    }
}

/// Behaviour flags set by [`apply_affix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AffixFlags {
    /// Spawns swarmlings on death.
    pub splits_on_death: bool,
    /// Heals every step.
    pub regenerates: bool,
    /// Heals when the player misses.
    pub vampiric: bool,
    /// Speeds up when bloodied.
    pub enrages: bool,
    /// Status durations are halved.
    pub resilient: bool,
}

/// Countdown for a cooldown ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityTimer {
    /// Ability driven by this timer.
    pub ability: AbilityId,
    /// Seconds until the next activation.
    #[serde(with = "fixed_serde")]
    pub remaining: Fixed,
}

/// Result of [`Enemy::apply_damage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Target was already dead; nothing happened.
    Ignored,
    /// Phantom evasion consumed; no HP lost.
    Evaded,
    /// Shield consumed; no HP lost.
    Absorbed,
    /// HP reduced, enemy still alive.
    Hit {
        /// HP actually removed.
        dealt: u32,
    },
    /// HP reached zero on this call.
    Killed {
        /// HP actually removed.
        dealt: u32,
    },
}

impl DamageOutcome {
    /// HP removed by this outcome.
    #[must_use]
    pub const fn dealt(self) -> u32 {
        match self {
            DamageOutcome::Hit { dealt } | DamageOutcome::Killed { dealt } => dealt,
            _ => 0,
        }
    }
}

/// A live (or just-killed) enemy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    /// Unique identifier.
    pub id: EnemyId,
    /// Kind.
    pub kind: EnemyKind,
    /// Category of the kind.
    pub category: EnemyCategory,
    /// Current grid cell.
    pub position: GridPos,
    /// Remaining lane distance to the castle.
    #[serde(with = "fixed_serde")]
    pub distance: Fixed,
    /// Current HP, always within `0..=max_hp`.
    pub hp: u32,
    /// Maximum HP.
    pub max_hp: u32,
    /// Flat armor.
    pub armor: u32,
    /// Lane cells advanced per step.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Contact damage dealt to the castle.
    pub damage: u32,
    /// Gold credited on kill.
    pub gold: u32,
    /// Word the player must type.
    pub word: String,
    /// Active status effects.
    pub statuses: StatusEffects,
    /// Optional affix.
    pub affix: Option<Affix>,
    /// Affix behaviour flags.
    pub flags: AffixFlags,
    /// Unlocked abilities.
    pub abilities: Vec<AbilityId>,
    /// Countdowns for unlocked cooldown abilities.
    pub ability_timers: Vec<AbilityTimer>,
    /// One-shot shield.
    pub shield: DefenseCharge,
    /// One-shot phantom evasion.
    pub evasion: DefenseCharge,
    /// Liveness; flips false exactly once.
    pub alive: bool,
    /// Moving at enraged speed.
    pub enraged: bool,
    /// Has dropped below half HP at least once.
    pub bloodied: bool,
    /// Spawned by a split, never splits again.
    pub split_spawn: bool,
}

/// Base HP for regular enemies on a given day and threat level.
#[must_use]
pub const fn base_hp(day: u32, threat: u32) -> u32 {
    4u32.saturating_add(day.saturating_mul(2))
        .saturating_add(threat.saturating_mul(3))
}

/// Base HP for bosses on a given day and threat level.
#[must_use]
pub const fn boss_hp(day: u32, threat: u32) -> u32 {
    40u32.saturating_add(day.saturating_mul(10))
        .saturating_add(threat.saturating_mul(8))
}

fn offset_hp(base: u32, delta: i32) -> u32 {
    base.saturating_add_signed(delta).max(1)
}

fn scale_percent(value: u32, delta_pct: i32) -> u32 {
    let factor = (100 + delta_pct).max(0) as u32;
    value.saturating_mul(factor) / 100
}

/// Create a regular enemy from its template.
///
/// HP is `base_hp(day, threat)` plus the template's delta, never below 1.
/// Armor grows by one point every five days.
#[must_use]
pub fn create_enemy(
    template: &EnemyTemplate,
    id: EnemyId,
    position: GridPos,
    word: impl Into<String>,
    day: u32,
    threat: u32,
) -> Enemy {
    let hp = offset_hp(base_hp(day, threat), template.hp_delta);
    build_enemy(template, id, position, word.into(), hp, day)
}

/// Create a boss from its template using the boss HP formula.
#[must_use]
pub fn create_boss(
    template: &EnemyTemplate,
    id: EnemyId,
    position: GridPos,
    word: impl Into<String>,
    day: u32,
    threat: u32,
) -> Enemy {
    let hp = offset_hp(boss_hp(day, threat), template.hp_delta);
    build_enemy(template, id, position, word.into(), hp, day)
}

fn build_enemy(
    template: &EnemyTemplate,
    id: EnemyId,
    position: GridPos,
    word: String,
    hp: u32,
    day: u32,
) -> Enemy {
    let mut enemy = Enemy {
        id,
        kind: template.kind,
        category: template.category,
        position,
        distance: Fixed::ZERO,
        hp,
        max_hp: hp,
        armor: template.armor.saturating_add(day / 5),
        speed: percent(template.speed_pct as i32),
        damage: template.damage,
        gold: template.gold,
        word,
        statuses: StatusEffects::new(),
        affix: None,
        flags: AffixFlags::default(),
        abilities: Vec::new(),
        ability_timers: Vec::new(),
        shield: DefenseCharge::Absent,
        evasion: DefenseCharge::Absent,
        alive: true,
        enraged: false,
        bloodied: false,
        split_spawn: false,
    };
    for &ability in &template.abilities {
        enemy.unlock_ability(ability);
    }
    enemy
}

/// Apply an affix's stat deltas and behaviour flags.
///
/// Returns `false` (and changes nothing) if the enemy already has an affix.
pub fn apply_affix(enemy: &mut Enemy, def: &AffixDef) -> bool {
    if enemy.affix.is_some() {
        return false;
    }
    let ratio_full = enemy.hp == enemy.max_hp;
    enemy.max_hp = scale_percent(enemy.max_hp, def.hp_pct).max(1);
    enemy.hp = if ratio_full {
        enemy.max_hp
    } else {
        enemy.hp.min(enemy.max_hp)
    };
    enemy.armor += def.armor;
    enemy.speed = enemy.speed * percent(100 + def.speed_pct);
    enemy.damage = scale_percent(enemy.damage, def.damage_pct);
    enemy.gold += def.gold_bonus;
    enemy.affix = Some(def.affix);

    match def.affix {
        Affix::Shielded => enemy.shield = DefenseCharge::Available,
        Affix::Regenerating => enemy.flags.regenerates = true,
        Affix::Splitting => enemy.flags.splits_on_death = true,
        Affix::Enraged => enemy.flags.enrages = true,
        Affix::Vampiric => enemy.flags.vampiric = true,
        Affix::Resilient => enemy.flags.resilient = true,
        Affix::Swift | Affix::Armored => {}
    }
    true
}

/// Highest affix tier available on a day.
#[must_use]
pub const fn affix_tier_for_day(day: u32) -> u8 {
    if day >= 7 {
        3
    } else if day >= 4 {
        2
    } else {
        1
    }
}

/// Roll a spawn affix.
///
/// `None` with 70% probability, otherwise a uniform pick among the affixes
/// whose tier is unlocked on `day`.
pub fn roll_affix(rng: &mut SimRng, day: u32, table: &BTreeMap<Affix, AffixDef>) -> Option<Affix> {
    if !rng.roll_percent(AFFIX_CHANCE_PERCENT) {
        return None;
    }
    let max_tier = affix_tier_for_day(day);
    let pool: Vec<Affix> = table
        .values()
        .filter(|def| def.tier <= max_tier)
        .map(|def| def.affix)
        .collect();
    rng.pick(&pool).copied()
}

impl Enemy {
    /// Apply already-resolved damage.
    ///
    /// Phantom evasion and shield each intercept one hit and then stay
    /// consumed. HP is clamped at zero and `alive` flips exactly once.
    pub fn apply_damage(&mut self, amount: u32) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome::Ignored;
        }
        if self.evasion.consume() {
            return DamageOutcome::Evaded;
        }
        if self.shield.consume() {
            return DamageOutcome::Absorbed;
        }
        let dealt = amount.min(self.hp);
        self.hp -= dealt;
        if self.hp == 0 {
            self.alive = false;
            DamageOutcome::Killed { dealt }
        } else {
            DamageOutcome::Hit { dealt }
        }
    }

    /// Heal, clamped at `max_hp`. Returns HP restored. Dead enemies stay dead.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.alive {
            return 0;
        }
        let healed = amount.min(self.max_hp - self.hp);
        self.hp += healed;
        healed
    }

    /// Put an explicitly consumed shield back.
    pub fn reset_shield(&mut self) {
        self.shield = DefenseCharge::Available;
    }

    /// Unlock an ability, setting up its passive state or timer.
    ///
    /// Returns `false` if it was already unlocked.
    pub fn unlock_ability(&mut self, ability: AbilityId) -> bool {
        if self.abilities.contains(&ability) {
            return false;
        }
        self.abilities.push(ability);
        match ability {
            AbilityId::PhantomStep => self.evasion = DefenseCharge::Available,
            AbilityId::Split => self.flags.splits_on_death = true,
            _ => {}
        }
        if ability.trigger() == AbilityTrigger::Cooldown {
            self.ability_timers.push(AbilityTimer {
                ability,
                remaining: ability.cooldown(),
            });
        }
        true
    }

    /// Whether the ability is unlocked.
    #[must_use]
    pub fn has_ability(&self, ability: AbilityId) -> bool {
        self.abilities.contains(&ability)
    }

    /// HP as an integer percentage of max.
    #[must_use]
    pub fn hp_percent(&self) -> u32 {
        if self.max_hp == 0 {
            0
        } else {
            (u64::from(self.hp) * 100 / u64::from(self.max_hp)) as u32
        }
    }

    /// Below half HP.
    #[must_use]
    pub fn is_below_half(&self) -> bool {
        u64::from(self.hp) * 2 < u64::from(self.max_hp)
    }

    /// Apply a status effect, honouring the resilient flag.
    pub fn apply_status(&mut self, kind: StatusKind, duration: Fixed) {
        let duration = if self.flags.resilient {
            duration / Fixed::from_num(2)
        } else {
            duration
        };
        self.statuses.apply(kind, duration);
    }

    /// Cells advanced per step after statuses and enrage.
    #[must_use]
    pub fn effective_speed(&self) -> Fixed {
        if self.statuses.has(StatusKind::Frozen) {
            return Fixed::ZERO;
        }
        let mut speed = self.speed;
        if self.enraged {
            speed = speed * percent(150);
        }
        if self.statuses.has(StatusKind::Slowed) {
            speed /= Fixed::from_num(2);
        }
        speed
    }

    /// Whether the enemy is a boss.
    #[must_use]
    pub fn is_boss(&self) -> bool {
        self.category == EnemyCategory::Boss
    }

    /// Tick cooldown ability timers, returning abilities that are ready.
    pub fn tick_abilities(&mut self, delta: Fixed) -> Vec<AbilityId> {
        let mut ready = Vec::new();
        for timer in &mut self.ability_timers {
            timer.remaining -= delta;
            if timer.remaining <= Fixed::ZERO {
                ready.push(timer.ability);
                timer.remaining += timer.ability.cooldown();
                if timer.remaining <= Fixed::ZERO {
                    timer.remaining = timer.ability.cooldown();
                }
            }
        }
        ready
    }
}
