//! Per-thread deterministic random number generation.
//!
//! Grounded on `original_source/common/src/random.cpp` and
//! `include/common/random.h`: each thread owns its own generator, seeded
//! once from a single master seed via a sequence generator (there,
//! `std::seed_seq`; here, a splitmix64 step) so the same `(seed,
//! n_threads)` pair always reproduces the same per-thread streams.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// One `ChaCha8Rng` per thread index, derived deterministically from a
/// single master seed.
pub struct SeededRngPool {
    generators: Vec<ChaCha8Rng>,
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

impl SeededRngPool {
    /// Derives `n_threads` independent generators from `seed`.
    pub fn new(seed: u64, n_threads: usize) -> Self {
        let generators = (0..n_threads)
            .map(|thread_index| {
                // two splitmix64 rounds give a full 128 bits of per-thread
                // seed material from the 64-bit master seed + thread index.
                let lo = splitmix64(seed.wrapping_add(thread_index as u64));
                let hi = splitmix64(lo ^ (thread_index as u64).wrapping_mul(0xD1B54A32D192ED03));
                let mut seed_bytes = [0u8; 32];
                seed_bytes[0..8].copy_from_slice(&lo.to_le_bytes());
                seed_bytes[8..16].copy_from_slice(&hi.to_le_bytes());
                ChaCha8Rng::from_seed(seed_bytes)
            })
            .collect();
        Self { generators }
    }

    pub fn n_threads(&self) -> usize {
        self.generators.len()
    }

    /// The generator owned by thread `i`. Panics if `i` is out of range,
    /// mirroring indexing a fixed-size per-thread array out of bounds.
    pub fn thread_rng(&mut self, i: usize) -> &mut ChaCha8Rng {
        &mut self.generators[i]
    }
}
