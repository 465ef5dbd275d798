//! Deterministic math utilities for the combat core.
//!
//! Simulation time and movement use fixed-point arithmetic so results are
//! bit-identical across platforms. Damage multipliers are kept in exact
//! integer basis points so that compounding bonuses never drifts
//! (×1.2 × ×1.2 is exactly ×1.44).

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for simulation time, speed and distance.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Build a fixed-point value from a percentage (`percent(80)` == 0.8).
#[must_use]
pub fn percent(p: i32) -> Fixed {
    Fixed::from_num(p) / Fixed::from_num(100)
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Integer grid coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct GridPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPos {
    /// Create a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four orthogonal neighbours, in a fixed order (N, E, S, W).
    #[must_use]
    pub const fn neighbors4(self) -> [Self; 4] {
        [
            Self::new(self.x, self.y - 1),
            Self::new(self.x + 1, self.y),
            Self::new(self.x, self.y + 1),
            Self::new(self.x - 1, self.y),
        ]
    }

    /// Whether `other` is orthogonally adjacent to this cell.
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self.manhattan(other) == 1
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Basis points per whole (1.0 == 10_000).
pub const BASIS_POINTS: u64 = 10_000;

/// An exact multiplicative modifier stored in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Multiplier(u32);

impl Multiplier {
    /// The identity multiplier (×1.0).
    pub const ONE: Self = Self(BASIS_POINTS as u32);

    /// Create from basis points (`12_000` == ×1.2).
    #[must_use]
    pub const fn from_basis_points(bp: u32) -> Self {
        Self(bp)
    }

    /// Create from a percentage (`120` == ×1.2).
    #[must_use]
    pub const fn from_percent(p: u32) -> Self {
        Self(p * 100)
    }

    /// Raw basis points.
    #[must_use]
    pub const fn basis_points(self) -> u32 {
        self.0
    }

    /// Compound two multipliers.
    #[must_use]
    pub fn compound(self, other: Self) -> Self {
        let bp = u64::from(self.0) * u64::from(other.0) / BASIS_POINTS;
        Self(u32::try_from(bp).unwrap_or(u32::MAX))
    }

    /// Apply to an integer amount, rounding down.
    #[must_use]
    pub fn apply(self, amount: u32) -> u32 {
        let scaled = u64::from(amount) * u64::from(self.0) / BASIS_POINTS;
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }

    /// Apply to a fixed-point amount (used for time and speed scaling).
    #[must_use]
    pub fn apply_fixed(self, amount: Fixed) -> Fixed {
        amount * Fixed::from_num(self.0) / Fixed::from_num(BASIS_POINTS)
    }

    /// Divide a fixed-point amount by this multiplier (cooldown / attack speed).
    #[must_use]
    pub fn divide_fixed(self, amount: Fixed) -> Fixed {
        if self.0 == 0 {
            return amount;
        }
        amount * Fixed::from_num(BASIS_POINTS) / Fixed::from_num(self.0)
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Self::ONE
    }
}

/// Round a non-negative fixed-point value down to `u32`, saturating.
#[must_use]
pub fn floor_u32(value: Fixed) -> u32 {
    if value <= Fixed::ZERO {
        0
    } else {
        u32::try_from(value.to_num::<i64>()).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance() {
        let a = GridPos::new(1, 2);
        let b = GridPos::new(4, -2);
        assert_eq!(a.manhattan(b), 7);
        assert_eq!(b.manhattan(a), 7);
        assert_eq!(a.manhattan(a), 0);
    }

    #[test]
    fn test_neighbors_are_adjacent() {
        let origin = GridPos::new(3, 3);
        for n in origin.neighbors4() {
            assert!(origin.is_adjacent(n));
        }
        assert!(!origin.is_adjacent(GridPos::new(4, 4)));
    }

    #[test]
    fn test_multiplier_compounds_exactly() {
        let bonus = Multiplier::from_percent(120);
        let combined = bonus.compound(bonus);
        assert_eq!(combined, Multiplier::from_percent(144));
        assert_eq!(combined.apply(100), 144);
    }

    #[test]
    fn test_multiplier_identity() {
        assert_eq!(Multiplier::ONE.apply(37), 37);
        assert_eq!(
            Multiplier::ONE.apply_fixed(Fixed::from_num(2.5)),
            Fixed::from_num(2.5)
        );
    }

    #[test]
    fn test_divide_fixed_by_attack_speed() {
        let faster = Multiplier::from_percent(200);
        assert_eq!(faster.divide_fixed(Fixed::from_num(2)), Fixed::from_num(1));
    }

    #[test]
    fn test_floor_u32() {
        assert_eq!(floor_u32(Fixed::from_num(3.75)), 3);
        assert_eq!(floor_u32(Fixed::from_num(-1)), 0);
        assert_eq!(floor_u32(percent(50)), 0);
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }
}
