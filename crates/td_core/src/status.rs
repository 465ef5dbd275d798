//! Status effects carried by enemies.
//!
//! Durations are countdowns decremented by elapsed time; nothing here ever
//! waits or suspends.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// Maximum number of distinct effects an enemy can carry at once.
pub const MAX_STATUS_EFFECTS: usize = 4;

/// Maximum stacks for damage-over-time effects.
pub const MAX_DOT_STACKS: u32 = 5;

/// Closed set of status effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Fire damage over time.
    Burning,
    /// Poison damage over time.
    Poisoned,
    /// Cannot move; fire deals triple damage.
    Frozen,
    /// Moves at half speed.
    Slowed,
}

impl StatusKind {
    /// Base damage per pulse for DOT effects, zero otherwise.
    #[must_use]
    pub const fn base_dot(self) -> u32 {
        match self {
            StatusKind::Burning => 2,
            StatusKind::Poisoned => 1,
            StatusKind::Frozen | StatusKind::Slowed => 0,
        }
    }

    /// Stack cap.
    #[must_use]
    pub const fn max_stacks(self) -> u32 {
        match self {
            StatusKind::Burning | StatusKind::Poisoned => MAX_DOT_STACKS,
            StatusKind::Frozen | StatusKind::Slowed => 1,
        }
    }

    /// Lower-case name used in event text.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            StatusKind::Burning => "burning",
            StatusKind::Poisoned => "poisoned",
            StatusKind::Frozen => "frozen",
            StatusKind::Slowed => "slowed",
        }
    }
}

/// One active effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Which effect.
    pub kind: StatusKind,
    /// Seconds remaining.
    #[serde(with = "fixed_serde")]
    pub remaining: Fixed,
    /// Stack count (at least 1).
    pub stacks: u32,
}

/// Bounded list of active effects, at most one entry per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffects {
    entries: Vec<StatusEffect>,
}

impl StatusEffects {
    /// Empty effect list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply or refresh an effect.
    ///
    /// An existing entry gains a stack (up to the kind's cap) and has its
    /// duration refreshed to the longer of the two.
    pub fn apply(&mut self, kind: StatusKind, duration: Fixed) {
        if duration <= Fixed::ZERO {
            return;
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.kind == kind) {
            entry.stacks = (entry.stacks + 1).min(kind.max_stacks());
            entry.remaining = entry.remaining.max(duration);
            return;
        }
        if self.entries.len() < MAX_STATUS_EFFECTS {
            self.entries.push(StatusEffect {
                kind,
                remaining: duration,
                stacks: 1,
            });
        }
    }

    /// Whether the effect is active.
    #[must_use]
    pub fn has(&self, kind: StatusKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    /// Stack count of an effect (0 when absent).
    #[must_use]
    pub fn stacks(&self, kind: StatusKind) -> u32 {
        self.entries
            .iter()
            .find(|e| e.kind == kind)
            .map_or(0, |e| e.stacks)
    }

    /// Decrement durations and drop expired effects.
    ///
    /// Returns the kinds that expired during this call.
    pub fn tick(&mut self, delta: Fixed) -> Vec<StatusKind> {
        let mut expired = Vec::new();
        for entry in &mut self.entries {
            entry.remaining -= delta;
            if entry.remaining <= Fixed::ZERO {
                expired.push(entry.kind);
            }
        }
        self.entries.retain(|e| e.remaining > Fixed::ZERO);
        expired
    }

    /// Active damage-over-time entries as `(kind, stacks)`.
    #[must_use]
    pub fn dots(&self) -> Vec<(StatusKind, u32)> {
        self.entries
            .iter()
            .filter(|e| e.kind.base_dot() > 0)
            .map(|e| (e.kind, e.stacks))
            .collect()
    }

    /// Iterate over active effects.
    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.entries.iter()
    }

    /// Number of active effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no effect is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
