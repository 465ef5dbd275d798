//! Static game data: enemy, affix, tower, boss and synergy tables.
//!
//! Everything here is plain data that deserializes from RON, plus the
//! built-in tables. Tables are assembled into a [`Catalog`] once and shared
//! read-only; there are no global registries.
//!
//! **Note:** This module contains no IO. Reading files is left to the
//! embedding application (see `td_headless`).

mod affix_data;
mod boss_data;
mod catalog;
mod enemy_data;
mod lexicon;
mod synergy_data;
mod tower_data;
mod wave_data;

pub use affix_data::{builtin_affixes, AffixDef};
pub use boss_data::builtin_bosses;
pub use catalog::Catalog;
pub use enemy_data::{builtin_enemies, EnemyTemplate};
pub use lexicon::Lexicon;
pub use synergy_data::builtin_synergies;
pub use tower_data::{builtin_towers, TowerTemplate};
pub use wave_data::builtin_theme_pools;
