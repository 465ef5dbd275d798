//! Affix modifier table.

use serde::{Deserialize, Serialize};

use crate::enemy::Affix;

/// Stat deltas an affix applies at spawn.
///
/// Behaviour (shield, split, regeneration...) is keyed off the affix itself;
/// this table only carries numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AffixDef {
    /// Affix described.
    pub affix: Affix,

    /// Tier (1-3). Tier 2 unlocks on day 4, tier 3 on day 7.
    pub tier: u8,

    /// Max HP change in percent.
    #[serde(default)]
    pub hp_pct: i32,

    /// Flat armor added.
    #[serde(default)]
    pub armor: u32,

    /// Speed change in percent.
    #[serde(default)]
    pub speed_pct: i32,

    /// Contact damage change in percent.
    #[serde(default)]
    pub damage_pct: i32,

    /// Extra gold on kill.
    #[serde(default)]
    pub gold_bonus: u32,
}

/// Built-in affix table.
#[must_use]
pub fn builtin_affixes() -> Vec<AffixDef> {
    let def = |affix, tier: u8| AffixDef {
        affix,
        tier,
        hp_pct: 0,
        armor: 0,
        speed_pct: 0,
        damage_pct: 0,
        gold_bonus: u32::from(tier),
    };
    vec![
        AffixDef {
            speed_pct: 40,
            hp_pct: -10,
            ..def(Affix::Swift, 1)
        },
        AffixDef {
            armor: 2,
            ..def(Affix::Armored, 1)
        },
        AffixDef {
            hp_pct: 50,
            ..def(Affix::Resilient, 1)
        },
        def(Affix::Shielded, 2),
        def(Affix::Regenerating, 2),
        def(Affix::Splitting, 2),
        AffixDef {
            damage_pct: 25,
            ..def(Affix::Enraged, 3)
        },
        def(Affix::Vampiric, 3),
    ]
}
