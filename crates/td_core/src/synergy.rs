//! Synergy detection.
//!
//! Synergies are recomputed from tower placement every tick and carry no
//! state between ticks. A scan costs one occupancy lookup per tower
//! neighbour.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::math::{GridPos, Multiplier};
use crate::tower::{Tower, TowerFamily};

/// Stat a synergy bonus modifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BonusStat {
    /// Damage per hit.
    Damage,
    /// Targeting range.
    Range,
    /// Attack rate (cooldowns are divided by it).
    AttackSpeed,
}

/// Topology a synergy requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SynergyPattern {
    /// Two orthogonally adjacent towers of the given families.
    Pair(TowerFamily, TowerFamily),
    /// A connected group of at least `min_size` towers of one family.
    Cluster {
        /// Required family.
        family: TowerFamily,
        /// Minimum group size.
        min_size: usize,
    },
    /// A primary tower adjacent to a support tower.
    Supported {
        /// Family that receives the bonus.
        primary: TowerFamily,
        /// Family that enables it.
        support: TowerFamily,
    },
}

/// A synergy definition from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynergyDef {
    /// Display name, unique in the catalog.
    pub name: String,
    /// Required arrangement.
    pub pattern: SynergyPattern,
    /// Multipliers granted to covered towers.
    pub bonuses: BTreeMap<BonusStat, Multiplier>,
}

/// A synergy currently satisfied by the placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSynergy {
    /// Definition name.
    pub name: String,
    /// Tower cells that receive the bonus.
    pub positions: BTreeSet<GridPos>,
    /// Multipliers granted.
    pub bonuses: BTreeMap<BonusStat, Multiplier>,
}

/// Combined multipliers for one tower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SynergyBonus {
    /// Damage multiplier.
    pub damage: Multiplier,
    /// Range multiplier.
    pub range: Multiplier,
    /// Attack-speed multiplier.
    pub attack_speed: Multiplier,
}

/// Scan placement and return every active synergy, in catalog order.
#[must_use]
pub fn detect_synergies(towers: &[Tower], defs: &[SynergyDef]) -> Vec<ActiveSynergy> {
    let occupancy: BTreeMap<GridPos, TowerFamily> =
        towers.iter().map(|t| (t.position, t.family)).collect();

    defs.iter()
        .filter_map(|def| {
            let positions = match def.pattern {
                SynergyPattern::Pair(a, b) => pair_positions(&occupancy, a, b),
                SynergyPattern::Cluster { family, min_size } => {
                    cluster_positions(&occupancy, family, min_size)
                }
                SynergyPattern::Supported { primary, support } => {
                    supported_positions(&occupancy, primary, support)
                }
            };
            (!positions.is_empty()).then(|| ActiveSynergy {
                name: def.name.clone(),
                positions,
                bonuses: def.bonuses.clone(),
            })
        })
        .collect()
}

fn pair_positions(
    occupancy: &BTreeMap<GridPos, TowerFamily>,
    a: TowerFamily,
    b: TowerFamily,
) -> BTreeSet<GridPos> {
    let mut covered = BTreeSet::new();
    for (&pos, &family) in occupancy {
        if family != a {
            continue;
        }
        for neighbor in pos.neighbors4() {
            if occupancy.get(&neighbor) == Some(&b) {
                covered.insert(pos);
                covered.insert(neighbor);
            }
        }
    }
    covered
}

fn cluster_positions(
    occupancy: &BTreeMap<GridPos, TowerFamily>,
    family: TowerFamily,
    min_size: usize,
) -> BTreeSet<GridPos> {
    let mut covered = BTreeSet::new();
    let mut visited = BTreeSet::new();
    for (&start, &f) in occupancy {
        if f != family || visited.contains(&start) {
            continue;
        }
        let mut component = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(pos) = queue.pop_front() {
            component.push(pos);
            for neighbor in pos.neighbors4() {
                if occupancy.get(&neighbor) == Some(&family) && visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        if component.len() >= min_size {
            covered.extend(component);
        }
    }
    covered
}

fn supported_positions(
    occupancy: &BTreeMap<GridPos, TowerFamily>,
    primary: TowerFamily,
    support: TowerFamily,
) -> BTreeSet<GridPos> {
    occupancy
        .iter()
        .filter(|(pos, family)| {
            **family == primary
                && pos
                    .neighbors4()
                    .iter()
                    .any(|n| occupancy.get(n) == Some(&support))
        })
        .map(|(&pos, _)| pos)
        .collect()
}

/// Compound every active synergy covering `position`.
#[must_use]
pub fn bonus_at(position: GridPos, active: &[ActiveSynergy]) -> SynergyBonus {
    let mut bonus = SynergyBonus::default();
    for synergy in active.iter().filter(|s| s.positions.contains(&position)) {
        for (&stat, &multiplier) in &synergy.bonuses {
            let slot = match stat {
                BonusStat::Damage => &mut bonus.damage,
                BonusStat::Range => &mut bonus.range,
                BonusStat::AttackSpeed => &mut bonus.attack_speed,
            };
            *slot = slot.compound(multiplier);
        }
    }
    bonus
}

/// Names present in `after` but not `before`, and the reverse.
#[must_use]
pub fn diff_synergies(
    before: &[ActiveSynergy],
    after: &[ActiveSynergy],
) -> (Vec<String>, Vec<String>) {
    let old: BTreeSet<&str> = before.iter().map(|s| s.name.as_str()).collect();
    let new: BTreeSet<&str> = after.iter().map(|s| s.name.as_str()).collect();
    let activated = new.difference(&old).map(|s| (*s).to_string()).collect();
    let deactivated = old.difference(&new).map(|s| (*s).to_string()).collect();
    (activated, deactivated)
}
