//! Wave configuration.

use serde::{Deserialize, Serialize};

use crate::boss::PhasePolicy;
use crate::enemy::EnemyKind;
use crate::error::{CoreError, Result};
use crate::math::{Fixed, GridPos};

/// Highest campaign day a wave may be configured for.
pub const MAX_DAY: u32 = 10_000;
/// Highest threat level.
pub const MAX_THREAT: u32 = 1_000;
/// Most waves in one day.
pub const MAX_WAVES_PER_DAY: u32 = 100;
/// Longest lane, in cells.
pub const MAX_LANE_LENGTH: u32 = 10_000;

/// Battlefield geometry.
///
/// Enemies walk a straight lane along `lane_row`, from `x = lane_length`
/// (spawn) to `x = 0` (the castle gate). Towers go on any other cell inside
/// the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLayout {
    /// Cells from spawn to the castle.
    pub lane_length: u32,
    /// Row the lane runs along.
    pub lane_row: i32,
    /// Grid width in cells.
    pub width: i32,
    /// Grid height in cells.
    pub height: i32,
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self {
            lane_length: 12,
            lane_row: 2,
            width: 14,
            height: 5,
        }
    }
}

impl FieldLayout {
    /// Whether a cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Whether a cell is part of the enemy lane.
    #[must_use]
    pub const fn is_lane(&self, pos: GridPos) -> bool {
        pos.y == self.lane_row && pos.x >= 0 && pos.x as i64 <= self.lane_length as i64
    }

    /// Lane cell for a distance to the castle.
    #[must_use]
    pub fn lane_cell(&self, distance: Fixed) -> GridPos {
        let x = distance.max(Fixed::ZERO).to_num::<i32>();
        GridPos::new(x, self.lane_row)
    }

    /// Reject geometry the lane walk cannot represent.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidConfig`] if the lane is empty or longer than
    /// [`MAX_LANE_LENGTH`].
    pub fn validate(&self) -> Result<()> {
        if self.lane_length == 0 || self.lane_length > MAX_LANE_LENGTH {
            return Err(CoreError::InvalidConfig(format!(
                "lane_length {} outside 1..={MAX_LANE_LENGTH}",
                self.lane_length
            )));
        }
        Ok(())
    }
}

/// Every tunable of one wave.
///
/// # Example RON
///
/// ```ron
/// WaveConfig(
///     day: 7,
///     wave_index: 2,
///     total_waves: 3,
///     seed: 42,
///     castle_hp: 30,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Campaign day.
    pub day: u32,
    /// Threat level scaling enemy HP.
    pub threat: u32,
    /// Wave index within the day.
    pub wave_index: u32,
    /// Waves in the day.
    pub total_waves: u32,
    /// Seed for a fresh simulation.
    pub seed: u64,
    /// Practice mode disables miss penalties.
    pub practice: bool,
    /// Castle HP at wave start.
    pub castle_hp: u32,
    /// Milliseconds between spawns.
    pub spawn_interval_ms: u32,
    /// Milliseconds between enemy steps.
    pub step_interval_ms: u32,
    /// Damage of a completed word.
    pub typed_damage: u32,
    /// Castle HP lost per miss outside practice mode.
    pub miss_penalty: u32,
    /// Damage the castle deals to the foremost enemy each step.
    pub castle_defense_damage: u32,
    /// Geometry, used when a simulation is created from this config.
    pub field: FieldLayout,
    /// Boss phase regression policy.
    pub phase_policy: PhasePolicy,
    /// Roll affixes on regular spawns.
    pub affixes_enabled: bool,
    /// Fixed spawn list replacing wave composition.
    pub roster_override: Option<Vec<EnemyKind>>,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            day: 1,
            threat: 0,
            wave_index: 0,
            total_waves: 3,
            seed: 0,
            practice: false,
            castle_hp: 20,
            spawn_interval_ms: 2000,
            step_interval_ms: 1000,
            typed_damage: 5,
            miss_penalty: 1,
            castle_defense_damage: 1,
            field: FieldLayout::default(),
            phase_policy: PhasePolicy::default(),
            affixes_enabled: true,
            roster_override: None,
        }
    }
}

impl WaveConfig {
    /// Parse from RON text. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`CoreError::DataParseError`] on malformed input, or
    /// [`CoreError::InvalidConfig`] if the values cannot run.
    pub fn from_ron_str(source_name: &str, text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| CoreError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the loop cannot run with.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.castle_hp == 0 {
            return Err(CoreError::InvalidConfig("castle_hp must be positive".into()));
        }
        if self.spawn_interval_ms == 0 || self.step_interval_ms == 0 {
            return Err(CoreError::InvalidConfig("intervals must be positive".into()));
        }
        if self.day > MAX_DAY {
            return Err(CoreError::InvalidConfig(format!(
                "day {} above {MAX_DAY}",
                self.day
            )));
        }
        if self.threat > MAX_THREAT {
            return Err(CoreError::InvalidConfig(format!(
                "threat {} above {MAX_THREAT}",
                self.threat
            )));
        }
        if self.total_waves > MAX_WAVES_PER_DAY {
            return Err(CoreError::InvalidConfig(format!(
                "{} waves per day above {MAX_WAVES_PER_DAY}",
                self.total_waves
            )));
        }
        if self.total_waves == 0 || self.wave_index >= self.total_waves {
            return Err(CoreError::InvalidConfig(format!(
                "wave index {} out of {} waves",
                self.wave_index, self.total_waves
            )));
        }
        self.field.validate()
    }

    /// Spawn interval in seconds.
    #[must_use]
    pub fn spawn_interval(&self) -> Fixed {
        Fixed::from_num(self.spawn_interval_ms) / Fixed::from_num(1000)
    }

    /// Step interval in seconds.
    #[must_use]
    pub fn step_interval(&self) -> Fixed {
        Fixed::from_num(self.step_interval_ms) / Fixed::from_num(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = WaveConfig::from_ron_str("inline", "(day: 7, wave_index: 2)").unwrap();
        assert_eq!(config.day, 7);
        assert_eq!(config.wave_index, 2);
        assert_eq!(config.total_waves, 3);
        assert_eq!(config.castle_hp, 20);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = WaveConfig::from_ron_str("inline", "(castle_hp: 0)").unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
        let err = WaveConfig::from_ron_str("inline", "(wave_index: 5)").unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_out_of_range_magnitudes_rejected() {
        for text in [
            "(day: 2147483647)",
            "(threat: 1001)",
            "(total_waves: 4000000000, wave_index: 1)",
            "(field: (lane_length: 3000000000))",
            "(field: (lane_length: 0))",
        ] {
            let err = WaveConfig::from_ron_str("inline", text).unwrap_err();
            assert!(matches!(err, CoreError::InvalidConfig(_)), "{text}");
        }
        let edge = WaveConfig {
            day: MAX_DAY,
            threat: MAX_THREAT,
            ..WaveConfig::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_lane_check_does_not_truncate_long_lanes() {
        let field = FieldLayout {
            lane_length: u32::MAX,
            ..FieldLayout::default()
        };
        assert!(field.is_lane(GridPos::new(i32::MAX, 2)));
        assert!(field.validate().is_err());
    }

    #[test]
    fn test_roster_override_parses() {
        let config =
            WaveConfig::from_ron_str("inline", "(roster_override: Some([Scout, Brute]))").unwrap();
        assert_eq!(
            config.roster_override,
            Some(vec![EnemyKind::Scout, EnemyKind::Brute])
        );
    }

    #[test]
    fn test_lane_geometry() {
        let field = FieldLayout::default();
        assert!(field.is_lane(GridPos::new(0, 2)));
        assert!(field.is_lane(GridPos::new(12, 2)));
        assert!(!field.is_lane(GridPos::new(13, 2)));
        assert!(!field.is_lane(GridPos::new(3, 1)));
        assert!(field.contains(GridPos::new(13, 4)));
        assert!(!field.contains(GridPos::new(14, 0)));
        assert_eq!(field.lane_cell(Fixed::from_num(3.5)), GridPos::new(3, 2));
    }

    #[test]
    fn test_intervals_in_seconds() {
        let config = WaveConfig {
            spawn_interval_ms: 1500,
            ..WaveConfig::default()
        };
        assert_eq!(config.spawn_interval(), Fixed::from_num(1.5));
        assert_eq!(config.step_interval(), Fixed::from_num(1));
    }
}
