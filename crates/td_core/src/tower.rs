//! Towers: kinds, families, attack categories and per-tower state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::damage::DamageType;
use crate::data::TowerTemplate;
use crate::error::{CoreError, Result};
use crate::math::{fixed_serde, Fixed, GridPos, Multiplier};
use crate::status::StatusKind;
use crate::targeting::{TargetQuery, Targeting};

/// Unique tower identifier.
pub type TowerId = u32;

/// Highest upgrade level.
pub const MAX_TOWER_LEVEL: u8 = 3;

/// Damage bonus per level above 1, in percent.
const DAMAGE_PER_LEVEL_PCT: u32 = 25;

/// Cooldown factor applied once per level above 1.
const COOLDOWN_PER_LEVEL: Multiplier = Multiplier::from_percent(90);

/// Closed set of tower kinds, four per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TowerKind {
    /// Tier 1 marksman.
    Arrow,
    /// Tier 1 arcane.
    Spark,
    /// Tier 1 elemental.
    Ember,
    /// Tier 1 support.
    Totem,
    /// Tier 2 marksman, hits several enemies.
    Ballista,
    /// Tier 2 elemental, freezes.
    Frost,
    /// Tier 2 nature, poisons and slows.
    Thorn,
    /// Tier 2 siege, splash.
    Catapult,
    /// Tier 3 arcane, chain lightning.
    Tesla,
    /// Tier 3 elemental, splash on the densest cluster.
    Inferno,
    /// Tier 3 support.
    Sanctum,
    /// Tier 3 nature, attacks what it touches.
    Kennel,
    /// Tier 4 arcane, chain on the biggest threat.
    Storm,
    /// Tier 4 arcane, focuses the healthiest enemy.
    Obelisk,
    /// Tier 4 support, holy zone.
    Cathedral,
    /// Tier 4 nature, summoned guardians.
    Grove,
}

impl TowerKind {
    /// Every kind, in declaration order.
    pub const ALL: [TowerKind; 16] = [
        TowerKind::Arrow,
        TowerKind::Spark,
        TowerKind::Ember,
        TowerKind::Totem,
        TowerKind::Ballista,
        TowerKind::Frost,
        TowerKind::Thorn,
        TowerKind::Catapult,
        TowerKind::Tesla,
        TowerKind::Inferno,
        TowerKind::Sanctum,
        TowerKind::Kennel,
        TowerKind::Storm,
        TowerKind::Obelisk,
        TowerKind::Cathedral,
        TowerKind::Grove,
    ];

    /// Snake-case identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TowerKind::Arrow => "arrow",
            TowerKind::Spark => "spark",
            TowerKind::Ember => "ember",
            TowerKind::Totem => "totem",
            TowerKind::Ballista => "ballista",
            TowerKind::Frost => "frost",
            TowerKind::Thorn => "thorn",
            TowerKind::Catapult => "catapult",
            TowerKind::Tesla => "tesla",
            TowerKind::Inferno => "inferno",
            TowerKind::Sanctum => "sanctum",
            TowerKind::Kennel => "kennel",
            TowerKind::Storm => "storm",
            TowerKind::Obelisk => "obelisk",
            TowerKind::Cathedral => "cathedral",
            TowerKind::Grove => "grove",
        }
    }
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TowerKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        TowerKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| CoreError::UnknownTowerKind(s.to_string()))
    }
}

/// Synergy family of a tower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TowerFamily {
    /// Precise single-target shooters.
    Marksman,
    /// Magic and lightning.
    Arcane,
    /// Fire and frost.
    Elemental,
    /// Heavy splash.
    Siege,
    /// Non-attacking enablers.
    Support,
    /// Poison and summons.
    Nature,
}

/// How a tower delivers its attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackCategory {
    /// One target.
    Single,
    /// Up to `max_targets` targets.
    Multi,
    /// Primary target plus splash.
    Aoe,
    /// Chain walk with falloff.
    Chain,
    /// Never attacks.
    Support,
    /// Summoned units hitting enemies in contact.
    Summoner,
}

/// A placed tower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tower {
    /// Unique identifier.
    pub id: TowerId,
    /// Kind.
    pub kind: TowerKind,
    /// Tier (1-4).
    pub tier: u8,
    /// Synergy family.
    pub family: TowerFamily,
    /// Grid cell.
    pub position: GridPos,
    /// Upgrade level (1-3).
    pub level: u8,
    /// Target selection mode.
    pub targeting: Targeting,
    /// Damage at the current level.
    pub damage: u32,
    /// Manhattan range at the current level.
    pub range: u32,
    /// Seconds between attacks at the current level.
    #[serde(with = "fixed_serde")]
    pub cooldown: Fixed,
    /// Seconds until the next attack; never negative.
    #[serde(with = "fixed_serde")]
    pub cooldown_remaining: Fixed,
    /// Damage type.
    pub damage_type: DamageType,
    /// Attack category.
    pub category: AttackCategory,
    /// Maximum targets per attack.
    pub max_targets: u32,
    /// Splash radius for AOE towers.
    pub splash_radius: u32,
    /// Chain jump range for chain towers.
    pub chain_jump_range: u32,
    /// Chain falloff per jump.
    pub chain_falloff: Multiplier,
    /// Extra status applied on hit, beyond the damage type's own.
    pub extra_status: Option<StatusKind>,
    base_damage: u32,
    base_range: u32,
    #[serde(with = "fixed_serde")]
    base_cooldown: Fixed,
}

/// Build a level-1 tower from its template.
#[must_use]
pub fn create_tower(template: &TowerTemplate, id: TowerId, position: GridPos) -> Tower {
    let cooldown = Fixed::from_num(template.cooldown_ms) / Fixed::from_num(1000);
    Tower {
        id,
        kind: template.kind,
        tier: template.tier,
        family: template.family,
        position,
        level: 1,
        targeting: template.targeting,
        damage: template.damage,
        range: template.range,
        cooldown,
        cooldown_remaining: Fixed::ZERO,
        damage_type: template.damage_type,
        category: template.category,
        max_targets: template.max_targets.max(1),
        splash_radius: template.splash_radius,
        chain_jump_range: template.chain_jump_range,
        chain_falloff: template.chain_falloff,
        extra_status: template.extra_status,
        base_damage: template.damage,
        base_range: template.range,
        base_cooldown: cooldown,
    }
}

impl Tower {
    /// Raise the level by one and recompute stats.
    ///
    /// # Errors
    ///
    /// [`CoreError::MaxLevel`] when already at [`MAX_TOWER_LEVEL`].
    pub fn upgrade(&mut self) -> Result<u8> {
        if self.level >= MAX_TOWER_LEVEL {
            return Err(CoreError::MaxLevel {
                id: self.id,
                level: self.level,
            });
        }
        self.level += 1;
        let steps = u32::from(self.level - 1);
        self.damage = self.base_damage * (100 + DAMAGE_PER_LEVEL_PCT * steps) / 100;
        self.cooldown = (0..steps).fold(self.base_cooldown, |cd, _| COOLDOWN_PER_LEVEL.apply_fixed(cd));
        self.range = self.base_range + u32::from(self.level >= MAX_TOWER_LEVEL);
        self.cooldown_remaining = self.cooldown_remaining.min(self.cooldown);
        Ok(self.level)
    }

    /// Change targeting mode.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidTargeting`] when a manual mode is given to an auto
    /// tower or the other way round, or when the tower is a support tower.
    pub fn set_targeting(&mut self, targeting: Targeting) -> Result<()> {
        let fits = match targeting {
            Targeting::Manual(_) => !self.is_auto(),
            Targeting::Auto(_) => self.is_auto(),
        };
        if !fits || self.category == AttackCategory::Support {
            return Err(CoreError::InvalidTargeting(self.id));
        }
        self.targeting = targeting;
        Ok(())
    }

    /// Tier 3 and 4 towers use the auto-tower modes.
    #[must_use]
    pub const fn is_auto(&self) -> bool {
        self.tier >= 3
    }

    /// Support towers never attack.
    #[must_use]
    pub fn attacks(&self) -> bool {
        self.category != AttackCategory::Support
    }

    /// Count the cooldown down, stopping at zero.
    pub fn tick_cooldown(&mut self, delta: Fixed) {
        self.cooldown_remaining = (self.cooldown_remaining - delta).max(Fixed::ZERO);
    }

    /// Ready to fire.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown_remaining == Fixed::ZERO
    }

    /// Restart the cooldown after firing, shortened by an attack-speed bonus.
    pub fn restart_cooldown(&mut self, attack_speed: Multiplier) {
        self.cooldown_remaining = attack_speed.divide_fixed(self.cooldown);
    }

    /// Selection geometry for the given effective range.
    #[must_use]
    pub fn target_query(&self, range: u32) -> TargetQuery {
        let max_targets = match self.category {
            AttackCategory::Single | AttackCategory::Aoe => 1,
            _ => self.max_targets as usize,
        };
        TargetQuery {
            origin: self.position,
            range,
            max_targets,
            chain_jump_range: self.chain_jump_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Catalog;
    use crate::targeting::{AutoTargetMode, TargetMode};

    fn tower(kind: TowerKind) -> Tower {
        let catalog = Catalog::builtin();
        create_tower(catalog.tower(kind).unwrap(), 1, GridPos::new(2, 2))
    }

    #[test]
    fn test_upgrade_scales_stats() {
        let mut arrow = tower(TowerKind::Arrow);
        let damage = arrow.damage;
        let cooldown = arrow.cooldown;
        let range = arrow.range;

        assert_eq!(arrow.upgrade().unwrap(), 2);
        assert_eq!(arrow.damage, damage * 125 / 100);
        assert!(arrow.cooldown < cooldown);
        assert_eq!(arrow.range, range);

        assert_eq!(arrow.upgrade().unwrap(), 3);
        assert_eq!(arrow.damage, damage * 150 / 100);
        assert_eq!(arrow.range, range + 1);

        assert!(matches!(arrow.upgrade(), Err(CoreError::MaxLevel { level: 3, .. })));
    }

    #[test]
    fn test_cooldown_never_negative() {
        let mut arrow = tower(TowerKind::Arrow);
        arrow.restart_cooldown(Multiplier::ONE);
        arrow.tick_cooldown(Fixed::from_num(100));
        assert_eq!(arrow.cooldown_remaining, Fixed::ZERO);
        assert!(arrow.is_ready());
    }

    #[test]
    fn test_attack_speed_shortens_cooldown() {
        let mut arrow = tower(TowerKind::Arrow);
        arrow.restart_cooldown(Multiplier::from_percent(200));
        assert_eq!(arrow.cooldown_remaining, arrow.cooldown / Fixed::from_num(2));
    }

    #[test]
    fn test_targeting_family_checked() {
        let mut arrow = tower(TowerKind::Arrow);
        assert!(arrow.set_targeting(Targeting::Manual(TargetMode::Strongest)).is_ok());
        assert!(arrow.set_targeting(Targeting::Auto(AutoTargetMode::Smart)).is_err());

        let mut tesla = tower(TowerKind::Tesla);
        assert!(tesla.set_targeting(Targeting::Auto(AutoTargetMode::Smart)).is_ok());
        assert!(tesla.set_targeting(Targeting::Manual(TargetMode::Last)).is_err());

        let mut totem = tower(TowerKind::Totem);
        assert!(totem.set_targeting(Targeting::Manual(TargetMode::Last)).is_err());
        assert!(!totem.attacks());
    }

    #[test]
    fn test_kind_names_parse() {
        for kind in TowerKind::ALL {
            assert_eq!(kind.name().parse::<TowerKind>().unwrap(), kind);
        }
        assert!("moat".parse::<TowerKind>().is_err());
    }
}
