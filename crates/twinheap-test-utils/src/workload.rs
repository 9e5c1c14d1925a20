//! Seeded operation sequences.
//!
//! A [`Workload`] is a plain list of [`Op`]s generated from a ChaCha8 RNG,
//! so the same seed always produces the same sequence on every platform.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// One step of a workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Request `n` usable bytes.
    Allocate(u32),
    /// Release a live allocation. The value picks one modulo the number
    /// of live allocations at replay time; with none live it is skipped.
    Release(usize),
}

/// A reproducible sequence of operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workload {
    pub seed: u64,
    pub ops: Vec<Op>,
}

impl Workload {
    /// Probability that a generated step allocates rather than releases.
    pub const DEFAULT_ALLOCATE_RATIO: f64 = 0.6;

    /// `len` operations with requests in `0..=max_request`.
    pub fn generate(seed: u64, len: usize, max_request: u32) -> Self {
        Self::generate_with_ratio(seed, len, max_request, Self::DEFAULT_ALLOCATE_RATIO)
    }

    /// Like [`generate`](Self::generate), allocating with probability
    /// `allocate_ratio` (clamped to `0.0..=1.0`).
    pub fn generate_with_ratio(seed: u64, len: usize, max_request: u32, allocate_ratio: f64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let ratio = allocate_ratio.clamp(0.0, 1.0);
        let ops = (0..len)
            .map(|_| {
                if rng.random_bool(ratio) {
                    Op::Allocate(rng.random_range(0..=max_request))
                } else {
                    Op::Release(rng.random_range(0..usize::from(u16::MAX)))
                }
            })
            .collect();
        Self { seed, ops }
    }

    /// Number of allocate steps.
    pub fn allocations(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, Op::Allocate(_)))
            .count()
    }
}
