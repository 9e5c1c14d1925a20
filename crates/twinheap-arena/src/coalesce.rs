//! Buddy coalescing.
//!
//! With the free list in address order, a block's buddy (if free) is
//! always its list successor. Merging is therefore a walk that compares
//! each member with the next one, repeated until a whole pass merges
//! nothing. No split history is stored; buddy-ness is recovered from
//! offsets and sizes alone.

use twinheap_core::layout::is_left_buddy;
use twinheap_core::FatalError;

use crate::arena::Arena;
use crate::free_list::FreeList;
use crate::header::Header;

/// Whether the free block at `offset` can absorb its list successor.
///
/// The successor must be free, physically adjacent, the same size, and
/// `offset` must be the left half of a buddy pair.
pub(crate) fn can_merge_next(arena: &Arena, offset: u32, header: &Header) -> Result<bool, FatalError> {
    let next = arena.free_header(header.next)?;
    Ok(is_left_buddy(offset, header.size)
        && next.size == header.size
        && header.next.wrapping_sub(offset) == header.size)
}

/// Absorb the successor of the free block at `offset` into it.
///
/// If the successor was the list's anchor, the anchor moves to the
/// surviving block.
pub(crate) fn merge_with_next(
    arena: &mut Arena,
    list: &mut FreeList,
    offset: u32,
) -> Result<(), FatalError> {
    let header = arena.free_header(offset)?;
    let absorbed = arena.free_header(header.next)?;

    if list.anchor() == header.next {
        list.set_anchor(offset);
    }

    arena.set_next(offset, absorbed.next);
    arena.set_prev(absorbed.next, offset);
    arena.set_size(offset, header.size * 2);

    log::trace!(
        "merged block {} into {offset}, now {} bytes",
        header.next,
        header.size * 2
    );
    Ok(())
}

/// Merge buddies until a full pass over the list finds none. Returns the
/// number of merges performed.
pub(crate) fn coalesce(arena: &mut Arena, list: &mut FreeList) -> Result<usize, FatalError> {
    let mut merges = 0;
    loop {
        let mut merged_this_pass = false;
        let mut cursor = list.anchor();
        for _ in 0..arena.max_blocks() {
            let header = arena.free_header(cursor)?;
            if can_merge_next(arena, cursor, &header)? {
                merge_with_next(arena, list, cursor)?;
                merged_this_pass = true;
                merges += 1;
            }
            cursor = arena.free_header(cursor)?.next;
            if cursor == list.anchor() {
                break;
            }
        }
        if cursor != list.anchor() {
            return Err(FatalError::BrokenFreeList { offset: cursor });
        }
        if !merged_this_pass {
            return Ok(merges);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Write free blocks `(offset, size)` as an ascending cycle.
    fn free_run(arena_size: u32, blocks: &[(u32, u32)]) -> (Arena, FreeList) {
        let mut arena = Arena::new(arena_size);
        let n = blocks.len();
        for (i, &(offset, size)) in blocks.iter().enumerate() {
            let next = blocks[(i + 1) % n].0;
            let prev = blocks[(i + n - 1) % n].0;
            arena.write_header(offset, &Header::free(size, next, prev));
        }
        (arena, FreeList::anchored_at(blocks[0].0))
    }

    #[test]
    fn siblings_are_buddies() {
        let (arena, _) = free_run(64, &[(0, 32), (32, 32)]);
        let header = arena.free_header(0).unwrap();
        assert!(can_merge_next(&arena, 0, &header).unwrap());
    }

    #[test]
    fn misaligned_neighbours_are_not_buddies() {
        // 32 and 64 are adjacent and equal-sized but 32 is a right half.
        let (arena, _) = free_run(128, &[(0, 32), (32, 32), (64, 32), (96, 32)]);
        let header = arena.free_header(32).unwrap();
        assert!(!can_merge_next(&arena, 32, &header).unwrap());
    }

    #[test]
    fn different_sizes_are_not_buddies() {
        let (arena, _) = free_run(128, &[(0, 32), (32, 32), (64, 64)]);
        let header = arena.free_header(32).unwrap();
        assert!(!can_merge_next(&arena, 32, &header).unwrap());
    }

    #[test]
    fn wrap_link_is_not_adjacency() {
        // 64 -> 0 wraps around; it must not look like a neighbour.
        let (arena, _) = free_run(128, &[(0, 64), (64, 64)]);
        let header = arena.free_header(64).unwrap();
        assert!(!can_merge_next(&arena, 64, &header).unwrap());
    }

    #[test]
    fn singleton_does_not_merge_with_itself() {
        let (arena, _) = free_run(64, &[(0, 64)]);
        let header = arena.free_header(0).unwrap();
        assert!(!can_merge_next(&arena, 0, &header).unwrap());
    }

    #[test]
    fn merge_pair_into_singleton() {
        let (mut arena, mut list) = free_run(64, &[(0, 32), (32, 32)]);
        merge_with_next(&mut arena, &mut list, 0).unwrap();
        let header = arena.free_header(0).unwrap();
        assert_eq!(header.size, 64);
        assert!(header.is_singleton(0));
    }

    #[test]
    fn merge_moves_anchor_off_absorbed_block() {
        let (mut arena, mut list) = free_run(128, &[(0, 32), (32, 32), (64, 64)]);
        list.set_anchor(32);
        merge_with_next(&mut arena, &mut list, 0).unwrap();
        assert_eq!(list.anchor(), 0);
    }

    #[test]
    fn coalesce_cascades_through_generations() {
        let (mut arena, mut list) =
            free_run(256, &[(0, 32), (32, 32), (64, 64), (128, 128)]);
        let merges = coalesce(&mut arena, &mut list).unwrap();
        assert_eq!(merges, 3);
        let header = arena.free_header(0).unwrap();
        assert_eq!(header.size, 256);
        assert!(header.is_singleton(0));
    }

    #[test]
    fn coalesce_stops_at_allocated_gap() {
        // Free 0..32 and 64..128, with 32..64 allocated (not on the list).
        let (mut arena, mut list) = free_run(128, &[(0, 32), (64, 64)]);
        assert_eq!(coalesce(&mut arena, &mut list).unwrap(), 0);
        assert_eq!(arena.free_header(0).unwrap().size, 32);
        assert_eq!(arena.free_header(64).unwrap().size, 64);
    }
}
