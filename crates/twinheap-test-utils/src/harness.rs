//! Invariant-checking replay harness.
//!
//! Every allocation's payload is filled with a byte unique to it, and the
//! byte is checked again at release. Overlapping blocks, or a split or
//! merge that writes a header into live data, show up as a mismatch.

use twinheap_arena::{BlockTag, FatalPolicy, Heap, HeapConfig, HeapError, Pointer};
use twinheap_core::layout::fit_size;

use crate::workload::{Op, Workload};

/// Counts from one replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub allocations: usize,
    pub failed_allocations: usize,
    pub releases: usize,
    pub skipped_releases: usize,
}

/// A heap under test plus the allocations it currently owes.
pub struct Harness {
    heap: Heap,
    live: Vec<(Pointer, u8)>,
    stamp: u8,
    stats: ReplayStats,
}

impl Harness {
    /// A harness over a fresh `arena_size` heap that reports fatal errors
    /// instead of aborting.
    pub fn new(arena_size: u32) -> Result<Self, HeapError> {
        let config = HeapConfig::new().with_fatal_policy(FatalPolicy::Report);
        let mut heap = Heap::new(config).expect("default limits are valid");
        heap.init(arena_size)?;
        Ok(Self::with_heap(heap))
    }

    /// Wrap an already initialised heap with no live allocations.
    pub fn with_heap(heap: Heap) -> Self {
        Self {
            heap,
            live: Vec::new(),
            stamp: 0,
            stats: ReplayStats::default(),
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn live(&self) -> impl Iterator<Item = Pointer> + '_ {
        self.live.iter().map(|&(ptr, _)| ptr)
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// Apply one operation, then check every invariant.
    ///
    /// # Panics
    ///
    /// Panics if an allocation has the wrong size, a payload was
    /// disturbed, or [`Heap::validate`] fails.
    pub fn apply(&mut self, op: Op) -> Result<(), HeapError> {
        match op {
            Op::Allocate(n) => match self.heap.allocate(n)? {
                Some(ptr) => {
                    let size = self.heap.block_at(ptr)?.size;
                    assert_eq!(Some(size), fit_size(n), "allocate({n}) block size");
                    self.stamp = self.stamp.wrapping_add(1);
                    self.heap.payload_mut(ptr)?.fill(self.stamp);
                    self.live.push((ptr, self.stamp));
                    self.stats.allocations += 1;
                }
                None => self.stats.failed_allocations += 1,
            },
            Op::Release(pick) => {
                if self.live.is_empty() {
                    self.stats.skipped_releases += 1;
                } else {
                    let (ptr, stamp) = self.live.swap_remove(pick % self.live.len());
                    self.check_payload(ptr, stamp)?;
                    self.heap.release(ptr)?;
                    self.stats.releases += 1;
                }
            }
        }
        self.check()
    }

    /// Replay every operation of `workload`.
    pub fn run(&mut self, workload: &Workload) -> Result<ReplayStats, HeapError> {
        for &op in &workload.ops {
            self.apply(op)?;
        }
        Ok(self.stats)
    }

    /// Release every live allocation, oldest first.
    pub fn drain(&mut self) -> Result<(), HeapError> {
        while !self.live.is_empty() {
            let (ptr, stamp) = self.live.remove(0);
            self.check_payload(ptr, stamp)?;
            self.heap.release(ptr)?;
            self.stats.releases += 1;
            self.check()?;
        }
        Ok(())
    }

    fn check_payload(&self, ptr: Pointer, stamp: u8) -> Result<(), HeapError> {
        let payload = self.heap.payload(ptr)?;
        assert!(
            payload.iter().all(|&b| b == stamp),
            "payload of {ptr} was overwritten"
        );
        Ok(())
    }

    fn check(&self) -> Result<(), HeapError> {
        self.heap.validate()?;
        assert_partition(&self.heap);
        let stats = self.heap.stats()?;
        assert_eq!(stats.allocated_blocks, self.live.len());
        Ok(())
    }
}

/// Assert that `heap`'s blocks tile its arena: contiguous, power-of-two,
/// aligned to their size, and summing to the arena size.
///
/// # Panics
///
/// Panics on the first violation, or if the heap is uninitialised.
pub fn assert_partition(heap: &Heap) {
    let arena_size = heap.arena_size().expect("heap is initialised");
    let mut expected = 0u64;
    let mut free = 0;
    for block in heap.blocks().expect("heap is initialised") {
        let block = block.unwrap_or_else(|e| panic!("unreadable block: {e}"));
        assert_eq!(u64::from(block.offset), expected, "gap or overlap");
        assert!(block.size.is_power_of_two(), "block {} size {}", block.offset, block.size);
        assert_eq!(block.offset % block.size, 0, "block {} misaligned", block.offset);
        if block.tag == BlockTag::Free {
            free += 1;
        }
        expected = block.end();
    }
    assert_eq!(expected, u64::from(arena_size), "blocks do not reach arena end");
    assert!(free > 0, "free list is empty");
}
