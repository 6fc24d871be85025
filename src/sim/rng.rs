//! Replaceable random source for the obstacle stream
//!
//! Gap and spawn-interval draws decide whether a run is winnable, so they go
//! through `RandomSource` and tests can pin them down.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Uniform draws over a closed interval
pub trait RandomSource {
    /// Value in `[lo, hi]`. Returns `lo` when `lo >= hi`.
    fn uniform(&mut self, lo: f32, hi: f32) -> f32;
}

/// PCG32 seeded from a `u64` (the default source)
#[derive(Debug, Clone)]
pub struct SeededRandom {
    seed: u64,
    rng: Pcg32,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { seed, rng: Pcg32::seed_from_u64(seed) }
    }

    /// Seeded from the OS entropy source
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        if lo >= hi {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }
}

/// Replays a fixed list of unit-interval fractions, cycling when exhausted.
///
/// `uniform(lo, hi)` returns `lo + f * (hi - lo)` for the next fraction `f`.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    fractions: Vec<f32>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(fractions: Vec<f32>) -> Self {
        Self { fractions, cursor: 0 }
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        if lo >= hi || self.fractions.is_empty() {
            return lo;
        }
        let f = self.fractions[self.cursor % self.fractions.len()].clamp(0.0, 1.0);
        self.cursor += 1;
        lo + f * (hi - lo)
    }
}
