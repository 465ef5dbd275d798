//! Typing lexicon.

use serde::{Deserialize, Serialize};

use crate::enemy::EnemyCategory;
use crate::rng::SimRng;

/// Word lists per enemy category; longer words for tougher enemies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lexicon {
    /// Short words for minions.
    pub minion: Vec<String>,
    /// Medium words for regular enemies.
    pub standard: Vec<String>,
    /// Long words for elites.
    pub elite: Vec<String>,
    /// Longest words for bosses.
    pub boss: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

impl Lexicon {
    /// Built-in word lists.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            minion: words(&[
                "ash", "bog", "cut", "dew", "elm", "fog", "gnat", "hex", "ink", "jab", "kin", "lug",
                "mud", "nip", "oak", "pry", "rot", "sap", "tar", "vex", "wisp", "yew", "zap",
            ]),
            standard: words(&[
                "ember", "raven", "thorn", "blade", "crest", "drift", "flint", "grove", "haven",
                "lance", "marsh", "quill", "ridge", "spire", "torch", "vigil", "wrath", "arrow",
                "cloak", "frost",
            ]),
            elite: words(&[
                "warlock", "bulwark", "cinder", "fortress", "gauntlet", "lantern", "maelstrom",
                "phantom", "sentinel", "tempest", "vanguard", "wildfire",
            ]),
            boss: words(&[
                "overgrowth",
                "monolithic",
                "witchlight",
                "sovereignty",
                "thunderclap",
                "everlasting",
                "unbreakable",
                "catastrophe",
            ]),
        }
    }

    /// Word list for a category.
    #[must_use]
    pub fn words(&self, category: EnemyCategory) -> &[String] {
        match category {
            EnemyCategory::Minion => &self.minion,
            EnemyCategory::Standard => &self.standard,
            EnemyCategory::Elite => &self.elite,
            EnemyCategory::Boss => &self.boss,
        }
    }

    /// Pick a word for a new enemy.
    ///
    /// Prefers words not in use whose first letter is also unused, so a
    /// single keystroke identifies the target. Falls back to any unused word,
    /// then to the whole list, then to the category name.
    pub fn pick(&self, rng: &mut SimRng, category: EnemyCategory, in_use: &[&str]) -> String {
        let list = self.words(category);
        let unused: Vec<&String> = list
            .iter()
            .filter(|w| !in_use.contains(&w.as_str()))
            .collect();
        let distinct: Vec<&String> = unused
            .iter()
            .copied()
            .filter(|w| {
                let first = w.chars().next();
                !in_use.iter().any(|u| u.chars().next() == first)
            })
            .collect();

        let choice = if !distinct.is_empty() {
            rng.pick(&distinct).copied()
        } else if !unused.is_empty() {
            rng.pick(&unused).copied()
        } else {
            rng.pick(list)
        };
        choice.map_or_else(|| category.name().to_string(), Clone::clone)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_avoids_words_in_use() {
        let lexicon = Lexicon::builtin();
        let mut rng = SimRng::new(4);
        for _ in 0..50 {
            let word = lexicon.pick(&mut rng, EnemyCategory::Standard, &["ember", "raven"]);
            assert_ne!(word, "ember");
            assert_ne!(word, "raven");
            assert!(!word.starts_with('e'));
            assert!(!word.starts_with('r'));
        }
    }

    #[test]
    fn test_pick_falls_back_when_exhausted() {
        let lexicon = Lexicon {
            minion: words(&["ash"]),
            ..Lexicon::builtin()
        };
        let mut rng = SimRng::new(1);
        assert_eq!(lexicon.pick(&mut rng, EnemyCategory::Minion, &["ash"]), "ash");
    }

    #[test]
    fn test_empty_list_uses_category_name() {
        let lexicon = Lexicon {
            boss: Vec::new(),
            ..Lexicon::builtin()
        };
        let mut rng = SimRng::new(1);
        assert_eq!(lexicon.pick(&mut rng, EnemyCategory::Boss, &[]), "boss");
    }

    #[test]
    fn test_words_are_lowercase_ascii() {
        let lexicon = Lexicon::builtin();
        for category in [
            EnemyCategory::Minion,
            EnemyCategory::Standard,
            EnemyCategory::Elite,
            EnemyCategory::Boss,
        ] {
            for word in lexicon.words(category) {
                assert!(word.chars().all(|c| c.is_ascii_lowercase()), "{word}");
            }
        }
    }
}
