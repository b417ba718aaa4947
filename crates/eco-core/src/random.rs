//! Uniform randomness shared by terrain generation, seeding and the tick loop.
//!
//! Every probabilistic decision draws from a single [`RandomSource`] handed in by the
//! caller; nothing in the simulation creates its own generator.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A source of uniformly distributed floats in `[0, 1)`.
pub trait RandomSource {
    fn uniform(&mut self) -> f64;

    /// `true` with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    /// Uniform index into a collection of `len` elements. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        let idx = (self.uniform() * len as f64).floor() as usize;
        idx.min(len.saturating_sub(1))
    }
}

/// ChaCha8-backed source, seeded or drawn from OS entropy.
#[derive(Debug, Clone)]
pub struct ChaChaSource {
    rng: ChaCha8Rng,
}

impl ChaChaSource {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Seeded when a seed is given, entropy otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }
}

impl RandomSource for ChaChaSource {
    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Always returns the same value. Useful for pinning branches in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedSource(pub f64);

impl RandomSource for FixedSource {
    fn uniform(&mut self) -> f64 {
        self.0
    }
}

/// Cycles through a fixed list of values.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl RandomSource for SequenceSource {
    fn uniform(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}
