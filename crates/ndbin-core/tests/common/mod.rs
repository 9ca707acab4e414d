//! Common test utilities for ndbin-core tests

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform samples in `[lo, hi)` from a fixed seed
pub fn uniform(n: usize, lo: f64, hi: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(lo..hi)).collect()
}

/// Uniform integers in `[lo, hi]` from a fixed seed
pub fn integers(n: usize, lo: i64, hi: i64, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(lo..=hi)).collect()
}
