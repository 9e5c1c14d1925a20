//! Benchmark profiles for the twinheap allocator.
//!
//! - [`churn_profile`]: 1 MiB arena, mixed request sizes, balanced traffic
//! - [`small_block_profile`]: 64 KiB arena, header-sized requests
//! - [`pressure_profile`]: 16 KiB arena driven close to exhaustion
//!
//! [`replay`] runs a profile without the validation the test harness
//! performs, so the numbers reflect the engine alone.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::error::Error;

use twinheap_arena::{FatalPolicy, Heap, HeapConfig, HeapError, Pointer};
use twinheap_test_utils::{Op, Workload};

/// An arena size paired with the workload to replay against it.
pub struct BenchProfile {
    pub arena_size: u32,
    pub workload: Workload,
}

impl BenchProfile {
    /// A freshly initialised heap sized for this profile.
    pub fn heap(&self) -> Result<Heap, Box<dyn Error>> {
        let mut heap = Heap::new(HeapConfig::new().with_fatal_policy(FatalPolicy::Report))?;
        heap.init(self.arena_size)?;
        Ok(heap)
    }
}

/// 1 MiB arena, requests up to 4 KiB, 60% allocations.
pub fn churn_profile(seed: u64) -> BenchProfile {
    BenchProfile {
        arena_size: 1 << 20,
        workload: Workload::generate(seed, 10_000, 4096),
    }
}

/// 64 KiB arena, requests up to 48 bytes.
pub fn small_block_profile(seed: u64) -> BenchProfile {
    BenchProfile {
        arena_size: 1 << 16,
        workload: Workload::generate(seed, 10_000, 48),
    }
}

/// 16 KiB arena, 80% allocations, so most late requests find no space.
pub fn pressure_profile(seed: u64) -> BenchProfile {
    BenchProfile {
        arena_size: 1 << 14,
        workload: Workload::generate_with_ratio(seed, 5_000, 512, 0.8),
    }
}

/// Replay `workload` against `heap`, returning the number of successful
/// allocations. Live allocations are left in place.
pub fn replay(heap: &mut Heap, workload: &Workload) -> Result<usize, HeapError> {
    let mut live: Vec<Pointer> = Vec::new();
    let mut served = 0;
    for &op in &workload.ops {
        match op {
            Op::Allocate(n) => {
                if let Some(ptr) = heap.allocate(n)? {
                    live.push(ptr);
                    served += 1;
                }
            }
            Op::Release(pick) if !live.is_empty() => {
                let ptr = live.swap_remove(pick % live.len());
                heap.release(ptr)?;
            }
            Op::Release(_) => {}
        }
    }
    Ok(served)
}
