//! End-of-wave scoring.

use serde::{Deserialize, Serialize};

use crate::events::WaveResult;
use crate::simulation::RunState;

/// Points per kill.
pub const KILL_POINTS: i64 = 10;
/// Points per completed word.
pub const WORD_POINTS: i64 = 3;
/// Points per word of the best combo.
pub const COMBO_POINTS: i64 = 2;
/// Flat bonus for winning the wave.
pub const VICTORY_BONUS: i64 = 50;
/// Points lost per miss.
pub const MISS_PENALTY_POINTS: i64 = 2;
/// Points lost per castle HP lost to enemies.
pub const DAMAGE_PENALTY_POINTS: i64 = 5;

/// Statistics and score of one wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Terminal outcome, `None` if the wave was cut short.
    pub result: Option<WaveResult>,
    /// Enemies killed.
    pub kills: u32,
    /// Words completed.
    pub words_typed: u32,
    /// Characters typed.
    pub keystrokes: u32,
    /// Characters that matched nothing.
    pub misses: u32,
    /// Castle HP lost to enemies reaching the base.
    pub damage_taken: u32,
    /// Longest run of words without a miss.
    pub best_combo: u32,
    /// Share of keystrokes that were correct, in percent.
    pub accuracy_pct: u32,
    /// Gold credited.
    pub gold_earned: u32,
    /// Final score, never negative.
    pub score: u32,
}

impl RunSummary {
    /// Summarize a run state.
    #[must_use]
    pub fn from_state(state: &RunState) -> Self {
        let c = &state.counters;
        let accuracy_pct = if c.keystrokes == 0 {
            100
        } else {
            (u64::from(c.keystrokes.saturating_sub(c.misses)) * 100 / u64::from(c.keystrokes)) as u32
        };

        let mut score = i64::from(c.kills) * KILL_POINTS
            + i64::from(c.words_typed) * WORD_POINTS
            + i64::from(c.best_combo) * COMBO_POINTS
            - i64::from(c.misses) * MISS_PENALTY_POINTS
            - i64::from(c.damage_taken) * DAMAGE_PENALTY_POINTS;
        if state.result == Some(WaveResult::Victory) {
            score += VICTORY_BONUS;
        }

        Self {
            result: state.result,
            kills: c.kills,
            words_typed: c.words_typed,
            keystrokes: c.keystrokes,
            misses: c.misses,
            damage_taken: c.damage_taken,
            best_combo: c.best_combo,
            accuracy_pct,
            gold_earned: c.gold_earned,
            score: u32::try_from(score.max(0)).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaveConfig;
    use crate::data::Catalog;
    use crate::enemy::EnemyKind;
    use crate::math::Fixed;
    use crate::simulation::Simulation;

    #[test]
    fn test_clean_victory_score() {
        let mut sim = Simulation::new(Catalog::builtin().shared(), 4);
        sim.start_wave(WaveConfig {
            roster_override: Some(Vec::new()),
            ..WaveConfig::default()
        });
        sim.spawn_enemy(EnemyKind::Scout, "ember", None);
        sim.step(Fixed::ZERO, "ember");

        let summary = sim.finalize();
        assert_eq!(summary.result, Some(WaveResult::Victory));
        assert_eq!(summary.accuracy_pct, 100);
        assert_eq!(summary.keystrokes, 5);
        assert_eq!(summary.gold_earned, 3);
        // kill 10 + word 3 + combo 2 + victory 50
        assert_eq!(summary.score, 65);
    }

    #[test]
    fn test_misses_lower_accuracy_and_score() {
        let mut sim = Simulation::new(Catalog::builtin().shared(), 4);
        sim.start_wave(WaveConfig {
            roster_override: Some(Vec::new()),
            practice: true,
            ..WaveConfig::default()
        });
        sim.spawn_enemy(EnemyKind::Scout, "ember", None);
        sim.step(Fixed::ZERO, "xxxember");

        let summary = sim.finalize();
        assert_eq!(summary.misses, 3);
        assert_eq!(summary.keystrokes, 8);
        assert_eq!(summary.accuracy_pct, 62);
        assert_eq!(summary.best_combo, 1);
        assert_eq!(summary.score, 65 - 6);
    }

    #[test]
    fn test_accuracy_with_huge_counts() {
        let sim = Simulation::new(Catalog::builtin().shared(), 4);
        let mut state = sim.state().clone();
        state.counters.keystrokes = u32::MAX;
        state.counters.misses = u32::MAX / 2;
        assert_eq!(RunSummary::from_state(&state).accuracy_pct, 50);
    }

    #[test]
    fn test_score_never_negative() {
        let mut sim = Simulation::new(Catalog::builtin().shared(), 4);
        sim.start_wave(WaveConfig {
            roster_override: Some(Vec::new()),
            practice: true,
            ..WaveConfig::default()
        });
        sim.spawn_enemy(EnemyKind::Scout, "ember", None);
        sim.step(Fixed::ZERO, "qqqqqqqqqq");

        let summary = sim.finalize();
        assert_eq!(summary.result, None);
        assert_eq!(summary.accuracy_pct, 0);
        assert_eq!(summary.score, 0);
    }

    #[test]
    fn test_idle_summary() {
        let sim = Simulation::new(Catalog::builtin().shared(), 4);
        let summary = sim.finalize();
        assert_eq!(summary.accuracy_pct, 100);
        assert_eq!(summary.score, 0);
    }
}
