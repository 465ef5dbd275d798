//! The immutable game catalog.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::affix_data::{builtin_affixes, AffixDef};
use super::boss_data::builtin_bosses;
use super::enemy_data::{builtin_enemies, EnemyTemplate};
use super::lexicon::Lexicon;
use super::synergy_data::builtin_synergies;
use super::tower_data::{builtin_towers, TowerTemplate};
use super::wave_data::builtin_theme_pools;
use crate::boss::BossDef;
use crate::enemy::{Affix, EnemyCategory, EnemyKind};
use crate::error::{CoreError, Result};
use crate::synergy::SynergyDef;
use crate::tower::TowerKind;
use crate::wave::WaveTheme;

/// Every static table the combat core reads.
///
/// Built once and shared by reference (usually as `Arc<Catalog>`). Fields
/// missing from a RON document fall back to the built-in tables.
///
/// # Example RON
///
/// ```ron
/// Catalog(
///     themes: {
///         Swarm: [Swarmling],
///     },
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Catalog {
    /// Enemy templates by kind.
    pub enemies: BTreeMap<EnemyKind, EnemyTemplate>,
    /// Affix table.
    pub affixes: BTreeMap<Affix, AffixDef>,
    /// Tower templates by kind.
    pub towers: BTreeMap<TowerKind, TowerTemplate>,
    /// Boss definitions by kind.
    pub bosses: BTreeMap<EnemyKind, BossDef>,
    /// Synergies, in detection order.
    pub synergies: Vec<SynergyDef>,
    /// Enemy pools per wave theme.
    pub themes: BTreeMap<WaveTheme, Vec<EnemyKind>>,
    /// Typing words.
    pub lexicon: Lexicon,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The built-in tables.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            enemies: builtin_enemies().into_iter().map(|t| (t.kind, t)).collect(),
            affixes: builtin_affixes().into_iter().map(|a| (a.affix, a)).collect(),
            towers: builtin_towers().into_iter().map(|t| (t.kind, t)).collect(),
            bosses: builtin_bosses().into_iter().map(|b| (b.kind, b)).collect(),
            synergies: builtin_synergies(),
            themes: builtin_theme_pools(),
            lexicon: Lexicon::builtin(),
        }
    }

    /// Parse a catalog from RON text.
    ///
    /// # Errors
    ///
    /// [`CoreError::DataParseError`] on malformed input.
    pub fn from_ron_str(source_name: &str, text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| CoreError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })
    }

    /// Wrap in an [`Arc`] for sharing between simulations.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Enemy template for a kind.
    #[must_use]
    pub fn enemy(&self, kind: EnemyKind) -> Option<&EnemyTemplate> {
        self.enemies.get(&kind)
    }

    /// Affix definition.
    #[must_use]
    pub fn affix(&self, affix: Affix) -> Option<&AffixDef> {
        self.affixes.get(&affix)
    }

    /// Tower template for a kind.
    #[must_use]
    pub fn tower(&self, kind: TowerKind) -> Option<&TowerTemplate> {
        self.towers.get(&kind)
    }

    /// Boss definition for a kind.
    #[must_use]
    pub fn boss(&self, kind: EnemyKind) -> Option<&BossDef> {
        self.bosses.get(&kind)
    }

    /// Enemy pool of a theme (empty if the theme is missing).
    #[must_use]
    pub fn theme_pool(&self, theme: WaveTheme) -> &[EnemyKind] {
        self.themes.get(&theme).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check internal consistency.
    ///
    /// Returns a list of problems; empty means the catalog is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (kind, template) in &self.enemies {
            if *kind != template.kind {
                errors.push(format!("Enemy entry {kind} holds template for {}", template.kind));
            }
        }

        for (theme, pool) in &self.themes {
            for kind in pool {
                match self.enemy(*kind) {
                    None => errors.push(format!("Theme {theme} uses unknown enemy {kind}")),
                    Some(t) if t.category == EnemyCategory::Boss => {
                        errors.push(format!("Theme {theme} lists boss {kind} in its pool"));
                    }
                    Some(_) => {}
                }
            }
        }

        for def in self.bosses.values() {
            match self.enemy(def.kind) {
                Some(t) if t.category == EnemyCategory::Boss => {}
                Some(_) => errors.push(format!("Boss '{}' uses non-boss kind {}", def.name, def.kind)),
                None => errors.push(format!("Boss '{}' has no enemy template", def.name)),
            }
            if def.phases.is_empty() {
                errors.push(format!("Boss '{}' has no phases", def.name));
            }
            if !def
                .phases
                .windows(2)
                .all(|w| w[0].threshold_pct > w[1].threshold_pct)
            {
                errors.push(format!("Boss '{}' phase thresholds are not descending", def.name));
            }
        }

        for (i, def) in self.synergies.iter().enumerate() {
            if self.synergies[..i].iter().any(|d| d.name == def.name) {
                errors.push(format!("Duplicate synergy '{}'", def.name));
            }
        }

        if !self.affixes.values().any(|a| a.tier == 1) {
            errors.push("No tier 1 affix available".to_string());
        }

        errors
    }
}
