//! Boss encounters and their phase state machine.
//!
//! A boss definition holds an ordered phase list with descending HP
//! thresholds. The encounter tracks the current phase index; under the
//! default [`PhasePolicy::Monotonic`] the index only ever moves forward, so
//! healing a boss never returns it to an earlier phase.

use serde::{Deserialize, Serialize};

use crate::enemy::{AbilityId, Enemy, EnemyId, EnemyKind};

/// One boss phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossPhase {
    /// Display name.
    pub name: String,
    /// Phase applies while HP% is at or below this value.
    pub threshold_pct: u32,
    /// Abilities unlocked on entering the phase.
    #[serde(default)]
    pub abilities: Vec<AbilityId>,
}

/// An item dropped on a boss kill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEntry {
    /// Item identifier.
    pub item: String,
    /// Quantity dropped.
    pub quantity: u32,
}

/// Static definition of a boss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossDef {
    /// Enemy kind used for stats.
    pub kind: EnemyKind,
    /// Display name.
    pub name: String,
    /// Region the boss guards.
    pub region: String,
    /// First day the boss can appear.
    pub unlock_day: u32,
    /// Phases ordered by descending threshold.
    pub phases: Vec<BossPhase>,
    /// Drops on kill.
    #[serde(default)]
    pub loot: Vec<LootEntry>,
}

/// Whether healing can move a boss back to an earlier phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhasePolicy {
    /// Phase index never decreases.
    #[default]
    Monotonic,
    /// Phase always follows the current HP ratio, including backwards.
    RatioDriven,
}

/// A phase change reported by [`BossEncounter::check_phase_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Previous phase index.
    pub from: usize,
    /// New phase index.
    pub to: usize,
}

/// Phase for an HP ratio.
///
/// Scans from the last (lowest threshold) phase backwards and returns the
/// first whose threshold is at or above `hp / max_hp`, so the deepest
/// qualifying phase wins. Falls back to phase 0.
#[must_use]
pub fn phase_index_for(phases: &[BossPhase], hp: u32, max_hp: u32) -> usize {
    let hp_scaled = u64::from(hp) * 100;
    phases
        .iter()
        .enumerate()
        .rev()
        .find(|(_, phase)| u64::from(phase.threshold_pct) * u64::from(max_hp) >= hp_scaled)
        .map_or(0, |(index, _)| index)
}

/// Runtime state of one boss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossEncounter {
    /// Enemy carrying the boss.
    pub enemy_id: EnemyId,
    /// Boss kind.
    pub kind: EnemyKind,
    /// Current phase index.
    pub phase_index: usize,
    /// Regression policy.
    pub policy: PhasePolicy,
}

impl BossEncounter {
    /// Start an encounter in phase 0.
    #[must_use]
    pub const fn new(enemy_id: EnemyId, kind: EnemyKind, policy: PhasePolicy) -> Self {
        Self {
            enemy_id,
            kind,
            phase_index: 0,
            policy,
        }
    }

    /// Recompute the phase from the boss's HP and store it if it changed.
    ///
    /// The caller unlocks the new phase's abilities and reports the change.
    pub fn check_phase_transition(
        &mut self,
        def: &BossDef,
        boss: &Enemy,
    ) -> Option<PhaseTransition> {
        let computed = phase_index_for(&def.phases, boss.hp, boss.max_hp);
        let changed = match self.policy {
            PhasePolicy::Monotonic => computed > self.phase_index,
            PhasePolicy::RatioDriven => computed != self.phase_index,
        };
        if !changed {
            return None;
        }
        let transition = PhaseTransition {
            from: self.phase_index,
            to: computed,
        };
        self.phase_index = computed;
        Some(transition)
    }

    /// Definition of the current phase.
    #[must_use]
    pub fn current_phase<'a>(&self, def: &'a BossDef) -> Option<&'a BossPhase> {
        def.phases.get(self.phase_index)
    }
}
