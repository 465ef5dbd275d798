//! Seeded random number generation.
//!
//! Every random decision in a run (affix rolls, wave themes, enemy picks,
//! word assignment) draws from the single [`SimRng`] owned by the run state.
//! The generator is serializable, so a saved run resumes at the exact
//! same position in the stream.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Deterministic generator threaded through every call that needs randomness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimRng {
    seed: u64,
    draws: u64,
    inner: Xoshiro256PlusPlus,
}

impl SimRng {
    /// Create a generator from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            draws: 0,
            inner: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Seed the generator was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of values drawn so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    /// Returns `true` with probability `pct`/100.
    pub fn roll_percent(&mut self, pct: u32) -> bool {
        self.draws += 1;
        self.inner.gen_range(0..100u32) < pct
    }

    /// Uniform index in `0..len`, or `None` for an empty range.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        self.draws += 1;
        Some(self.inner.gen_range(0..len))
    }

    /// Uniformly pick one element of a slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.index(items.len()).map(|i| &items[i])
    }
}
