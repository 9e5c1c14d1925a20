//! Whole-heap integrity checks.
//!
//! [`Heap::validate`] walks the arena twice: once physically, block by
//! block, and once around the free list. The two walks must agree on
//! which blocks are free.

use twinheap_core::{BlockTag, FatalError, HeapError};

use crate::arena::Arena;
use crate::engine::Heap;
use crate::free_list::FreeList;
use crate::header::Header;
use crate::view::Blocks;

impl Heap {
    /// Check every structural invariant of the heap.
    ///
    /// - blocks tile the arena with no gaps or overlaps, each carrying a
    ///   known tag and a power-of-two size aligned to itself;
    /// - the free list holds every free block exactly once and nothing
    ///   else;
    /// - each member's successor points back at it;
    /// - the cycle ascends by offset with exactly one wrap.
    ///
    /// The first violation found is returned as [`HeapError::Fatal`]. The
    /// fatal policy is never applied here, so this is safe to call on a
    /// heap that is already known to be damaged.
    pub fn validate(&self) -> Result<(), HeapError> {
        let live = self.live()?;
        let free = free_offsets(&live.arena)?;
        check_free_list(&live.arena, &live.free, &free)?;
        Ok(())
    }
}

/// Offsets of every free block, in address order. Fails on the first
/// block that does not fit the layout.
fn free_offsets(arena: &Arena) -> Result<Vec<u32>, FatalError> {
    let mut free = Vec::new();
    for block in Blocks::new(arena) {
        let block = block?;
        if block.tag == BlockTag::Free {
            free.push(block.offset);
        }
    }
    Ok(free)
}

fn check_free_list(arena: &Arena, list: &FreeList, free: &[u32]) -> Result<(), FatalError> {
    let mut members: Vec<(u32, Header)> = Vec::new();
    list.walk(arena, |offset, header| {
        members.push((offset, *header));
        None::<()>
    })?;

    for (offset, header) in &members {
        if arena.free_header(header.next)?.prev != *offset {
            return Err(FatalError::BrokenFreeList {
                offset: header.next,
            });
        }
    }

    let wraps: Vec<u32> = members
        .iter()
        .filter(|(offset, header)| header.next < *offset)
        .map(|(offset, _)| *offset)
        .collect();
    if members.len() > 1 && wraps.len() != 1 {
        return Err(FatalError::BrokenFreeList {
            offset: wraps.get(1).copied().unwrap_or(list.anchor()),
        });
    }

    let mut listed: Vec<u32> = members.iter().map(|(offset, _)| *offset).collect();
    listed.sort_unstable();
    if listed != free {
        let stray = free
            .iter()
            .find(|offset| listed.binary_search(offset).is_err())
            .or_else(|| listed.iter().find(|offset| free.binary_search(offset).is_err()))
            .copied()
            .unwrap_or(list.anchor());
        return Err(FatalError::BrokenFreeList { offset: stray });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FatalPolicy, HeapConfig};
    use twinheap_core::layout::{fit_size, HEADER_SIZE};
    use twinheap_core::Pointer;

    fn fresh(size: u32) -> Heap {
        let config = HeapConfig::new().with_fatal_policy(FatalPolicy::Report);
        let mut heap = Heap::new(config).unwrap();
        heap.init(size).unwrap();
        heap
    }

    #[test]
    fn fresh_heap_is_valid() {
        for size in [0, 16, 64, 1000, 1 << 16] {
            fresh(size).validate().unwrap();
        }
    }

    #[test]
    fn uninitialised_heap_is_not_validated() {
        assert_eq!(Heap::default().validate(), Err(HeapError::Uninitialized));
    }

    #[test]
    fn valid_after_mixed_traffic() {
        let mut heap = fresh(4096);
        let a = heap.allocate(100).unwrap().unwrap();
        let b = heap.allocate(10).unwrap().unwrap();
        let c = heap.allocate(500).unwrap().unwrap();
        heap.validate().unwrap();
        heap.release(b).unwrap();
        heap.validate().unwrap();
        let d = heap.allocate(30).unwrap().unwrap();
        heap.release(a).unwrap();
        heap.release(c).unwrap();
        heap.validate().unwrap();
        heap.release(d).unwrap();
        heap.validate().unwrap();
        assert_eq!(heap.stats().unwrap().free_blocks, 1);
    }

    #[test]
    fn smashed_magic_is_bad_header() {
        let mut heap = fresh(256);
        let p = heap.allocate(10).unwrap().unwrap();
        let offset = p.block_offset().unwrap();
        heap.live_mut().arena.set_word(offset, 0x4141_4141);
        assert_eq!(
            heap.validate(),
            Err(HeapError::Fatal(FatalError::BadHeader {
                offset,
                magic: 0x4141_4141,
                size: 32,
            }))
        );
    }

    #[test]
    fn impossible_size_is_bad_header() {
        let mut heap = fresh(256);
        heap.allocate(10).unwrap().unwrap();
        heap.live_mut().arena.set_size(64, 48);
        assert!(matches!(
            heap.validate(),
            Err(HeapError::Fatal(FatalError::BadHeader { offset: 64, .. }))
        ));
    }

    #[test]
    fn asymmetric_link_is_reported() {
        let mut heap = fresh(256);
        heap.allocate(10).unwrap().unwrap();
        // Free list is 32 -> 64 -> 128 -> 32.
        heap.live_mut().arena.set_prev(64, 128);
        assert_eq!(
            heap.validate(),
            Err(HeapError::Fatal(FatalError::BrokenFreeList { offset: 64 }))
        );
    }

    #[test]
    fn out_of_order_cycle_is_reported() {
        let mut heap = fresh(256);
        heap.allocate(10).unwrap().unwrap();
        // Reorder to 32 -> 128 -> 64 -> 32, links kept symmetric.
        let arena = &mut heap.live_mut().arena;
        arena.set_next(32, 128);
        arena.set_prev(128, 32);
        arena.set_next(128, 64);
        arena.set_prev(64, 128);
        arena.set_next(64, 32);
        arena.set_prev(32, 64);
        assert!(matches!(
            heap.validate(),
            Err(HeapError::Fatal(FatalError::BrokenFreeList { .. }))
        ));
    }

    #[test]
    fn free_block_missing_from_list_is_reported() {
        let mut heap = fresh(256);
        let p = heap.allocate(10).unwrap().unwrap();
        // Retag without linking it in.
        heap.live_mut()
            .arena
            .set_tag(p.block_offset().unwrap(), BlockTag::Free);
        assert_eq!(
            heap.validate(),
            Err(HeapError::Fatal(FatalError::BrokenFreeList { offset: 0 }))
        );
    }

    /// Whether any two free blocks in address order are unmerged buddies.
    fn has_free_buddies(heap: &Heap) -> bool {
        let blocks: Vec<_> = heap.blocks().unwrap().map(Result::unwrap).collect();
        blocks.windows(2).any(|pair| {
            pair[0].tag == BlockTag::Free
                && pair[1].tag == BlockTag::Free
                && pair[0].size == pair[1].size
                && pair[0].offset % (2 * pair[0].size) == 0
        })
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn random_traffic_keeps_heap_valid(
                ops in proptest::collection::vec((any::<bool>(), 0u32..600), 1..80),
            ) {
                let mut heap = fresh(8192);
                let mut live: Vec<Pointer> = Vec::new();
                for (alloc, n) in ops {
                    if alloc || live.is_empty() {
                        if let Some(p) = heap.allocate(n).unwrap() {
                            let size = heap.usable_size(p).unwrap() + HEADER_SIZE;
                            prop_assert_eq!(Some(size), fit_size(n));
                            live.push(p);
                        }
                    } else {
                        let p = live.swap_remove(n as usize % live.len());
                        heap.release(p).unwrap();
                    }
                    prop_assert_eq!(heap.validate(), Ok(()));
                    prop_assert!(!has_free_buddies(&heap));

                    let stats = heap.stats().unwrap();
                    prop_assert_eq!(stats.free_bytes + stats.allocated_bytes, 8192);
                    prop_assert_eq!(stats.allocated_blocks, live.len());
                }

                for p in live {
                    heap.release(p).unwrap();
                }
                let stats = heap.stats().unwrap();
                prop_assert_eq!(stats.free_blocks, 1);
                prop_assert_eq!(stats.largest_free, 8192);
            }

            #[test]
            fn singleton_serves_only_splittable_requests(
                shift in 4u32..14,
                n in 0u32..10_000,
            ) {
                let size = 1u32 << shift;
                let mut heap = fresh(size);
                let served = heap.allocate(n).unwrap().is_some();
                prop_assert_eq!(served, u64::from(size) >= 2 * u64::from(n + HEADER_SIZE));
                prop_assert_eq!(heap.validate(), Ok(()));
            }
        }
    }
}
