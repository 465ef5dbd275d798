//! Target selection for towers.
//!
//! Every selector receives enemies in one canonical order (ascending id) and
//! ranks them with a stable sort, so equally ranked candidates always resolve
//! to the lowest id. Selection never fails: no candidate means an empty list.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::enemy::{Enemy, EnemyCategory, EnemyId};
use crate::math::{Fixed, GridPos};

/// Radius used when counting neighbours for cluster targeting.
pub const CLUSTER_RADIUS: u32 = 2;

/// Target modes available to manual (tier 1-2) towers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetMode {
    /// Closest to the tower.
    #[default]
    Nearest,
    /// Highest current HP.
    Strongest,
    /// Lowest current HP.
    Weakest,
    /// Highest speed.
    Fastest,
    /// Closest to the castle.
    First,
    /// Furthest from the castle.
    Last,
}

/// Target modes available to auto (tier 3-4) towers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutoTargetMode {
    /// Closest to the tower.
    Nearest,
    /// Highest current HP.
    HighestHp,
    /// Lowest current HP.
    LowestHp,
    /// Highest speed.
    Fastest,
    /// Most neighbours within [`CLUSTER_RADIUS`].
    Cluster,
    /// Greedy chain walk from the nearest enemy.
    Chain,
    /// Everything in range.
    Zone,
    /// Enemies on or next to the tower cell.
    Contact,
    /// Weighted threat score.
    Smart,
}

/// A tower's targeting configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Targeting {
    /// Manual tower mode.
    Manual(TargetMode),
    /// Auto tower mode.
    Auto(AutoTargetMode),
}

impl Default for Targeting {
    fn default() -> Self {
        Targeting::Manual(TargetMode::Nearest)
    }
}

/// Geometry of one selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetQuery {
    /// Tower cell.
    pub origin: GridPos,
    /// Manhattan range.
    pub range: u32,
    /// Maximum number of targets.
    pub max_targets: usize,
    /// Manhattan distance a chain may jump.
    pub chain_jump_range: u32,
}

/// Alive enemies within range of `origin`, ordered by ascending id.
#[must_use]
pub fn candidates(origin: GridPos, range: u32, enemies: &[Enemy]) -> Vec<&Enemy> {
    let mut found: Vec<&Enemy> = enemies
        .iter()
        .filter(|e| e.alive && e.position.manhattan(origin) <= range)
        .collect();
    found.sort_by_key(|e| e.id);
    found
}

/// Select targets for a query and mode.
#[must_use]
pub fn select_targets(query: &TargetQuery, targeting: Targeting, enemies: &[Enemy]) -> Vec<EnemyId> {
    if query.max_targets == 0 {
        return Vec::new();
    }
    let mut pool = candidates(query.origin, query.range, enemies);
    match targeting {
        Targeting::Manual(mode) => rank_manual(&mut pool, mode, query.origin),
        Targeting::Auto(AutoTargetMode::Chain) => return chain_walk(query, &pool, enemies),
        Targeting::Auto(AutoTargetMode::Contact) => {
            pool.retain(|e| e.position.manhattan(query.origin) <= 1);
            pool.sort_by_key(|e| e.position.manhattan(query.origin));
        }
        Targeting::Auto(mode) => rank_auto(&mut pool, mode, query.origin, enemies),
    }
    pool.into_iter()
        .take(query.max_targets)
        .map(|e| e.id)
        .collect()
}

fn rank_manual(pool: &mut [&Enemy], mode: TargetMode, origin: GridPos) {
    match mode {
        TargetMode::Nearest => pool.sort_by_key(|e| e.position.manhattan(origin)),
        TargetMode::Strongest => pool.sort_by_key(|e| Reverse(e.hp)),
        TargetMode::Weakest => pool.sort_by_key(|e| e.hp),
        TargetMode::Fastest => pool.sort_by_key(|e| Reverse(e.speed)),
        TargetMode::First => pool.sort_by_key(|e| e.distance),
        TargetMode::Last => pool.sort_by_key(|e| Reverse(e.distance)),
    }
}

fn rank_auto(pool: &mut [&Enemy], mode: AutoTargetMode, origin: GridPos, all: &[Enemy]) {
    match mode {
        AutoTargetMode::Nearest => pool.sort_by_key(|e| e.position.manhattan(origin)),
        AutoTargetMode::HighestHp => pool.sort_by_key(|e| Reverse(e.hp)),
        AutoTargetMode::LowestHp => pool.sort_by_key(|e| e.hp),
        AutoTargetMode::Fastest => pool.sort_by_key(|e| Reverse(e.speed)),
        AutoTargetMode::Cluster => pool.sort_by_cached_key(|e| Reverse(cluster_size(e, all))),
        AutoTargetMode::Smart => pool.sort_by_cached_key(|e| Reverse(smart_score(e))),
        AutoTargetMode::Zone | AutoTargetMode::Chain | AutoTargetMode::Contact => {}
    }
}

/// Number of other alive enemies within [`CLUSTER_RADIUS`] of `enemy`.
#[must_use]
pub fn cluster_size(enemy: &Enemy, all: &[Enemy]) -> usize {
    all.iter()
        .filter(|other| {
            other.alive
                && other.id != enemy.id
                && other.position.manhattan(enemy.position) <= CLUSTER_RADIUS
        })
        .count()
}

/// Threat score used by smart targeting, in hundredths.
///
/// `(1 − hp/max)×30 + damage×5 + speed×2 + max(0, 10 − distance)×3`, plus 50
/// for bosses or 25 for elites. `distance` is the remaining lane distance to
/// the castle.
#[must_use]
pub fn smart_score(enemy: &Enemy) -> i64 {
    let missing = i64::from(enemy.max_hp.saturating_sub(enemy.hp));
    let wounded = if enemy.max_hp == 0 {
        0
    } else {
        missing * 3000 / i64::from(enemy.max_hp)
    };
    let damage = i64::from(enemy.damage) * 500;
    let speed = (enemy.speed * Fixed::from_num(200)).to_num::<i64>();
    let closeness = (Fixed::from_num(10) - enemy.distance).max(Fixed::ZERO);
    let proximity = (closeness * Fixed::from_num(300)).to_num::<i64>();
    let bonus = match enemy.category {
        EnemyCategory::Boss => 5000,
        EnemyCategory::Elite => 2500,
        EnemyCategory::Minion | EnemyCategory::Standard => 0,
    };
    wounded + damage + speed + proximity + bonus
}

fn chain_walk(query: &TargetQuery, pool: &[&Enemy], all: &[Enemy]) -> Vec<EnemyId> {
    let Some(first) = pool
        .iter()
        .min_by_key(|e| (e.position.manhattan(query.origin), e.id))
    else {
        return Vec::new();
    };

    let mut ordered: Vec<&Enemy> = all.iter().filter(|e| e.alive).collect();
    ordered.sort_by_key(|e| e.id);

    let mut picked = vec![first.id];
    let mut previous = first.position;
    while picked.len() < query.max_targets {
        let next = ordered
            .iter()
            .filter(|e| !picked.contains(&e.id))
            .filter(|e| e.position.manhattan(previous) <= query.chain_jump_range)
            .min_by_key(|e| (e.position.manhattan(previous), e.id));
        match next {
            Some(enemy) => {
                picked.push(enemy.id);
                previous = enemy.position;
            }
            None => break,
        }
    }
    picked
}
