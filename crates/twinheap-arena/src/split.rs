//! Block splitting.
//!
//! A free block is halved in place: the left half keeps the original
//! header (with its size halved) and a fresh free header is written at the
//! midpoint. The right half is linked in directly after the left half,
//! which keeps the free list in address order.

use twinheap_core::layout::is_tight_fit;
use twinheap_core::FatalError;

use crate::arena::Arena;
use crate::header::Header;

/// Halve the free block at `offset`, returning the offset of the new
/// right half.
pub(crate) fn halve(arena: &mut Arena, offset: u32) -> Result<u32, FatalError> {
    let left = arena.free_header(offset)?;
    let half = left.size / 2;
    let right = offset + half;

    arena.write_header(right, &Header::free(half, left.next, offset));
    arena.set_size(offset, half);

    if left.is_singleton(offset) {
        arena.set_next(offset, right);
        arena.set_prev(offset, right);
    } else {
        arena.set_prev(left.next, right);
        arena.set_next(offset, right);
    }

    log::trace!("split block {offset} into two {half}-byte halves at {offset} and {right}");
    Ok(right)
}

/// Halve the free block at `offset` until it is a tight fit for `need`
/// bytes. Returns the final block size.
///
/// The block must already span at least `need` bytes.
pub(crate) fn split_to_fit(arena: &mut Arena, offset: u32, need: u32) -> Result<u32, FatalError> {
    loop {
        let size = arena.free_header(offset)?.size;
        if is_tight_fit(size, need) {
            return Ok(size);
        }
        if size < need {
            // Selection only ever hands over blocks that fit.
            return Err(FatalError::BrokenFreeList { offset });
        }
        halve(arena, offset)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn singleton(size: u32) -> Arena {
        let mut arena = Arena::new(size);
        arena.write_header(0, &Header::free(size, 0, 0));
        arena
    }

    #[test]
    fn halving_a_singleton_pairs_the_halves() {
        let mut arena = singleton(64);
        let right = halve(&mut arena, 0).unwrap();
        assert_eq!(right, 32);

        let left = arena.read_header(0).unwrap();
        let right = arena.read_header(32).unwrap();
        assert_eq!((left.size, left.next, left.prev), (32, 32, 32));
        assert_eq!((right.size, right.next, right.prev), (32, 0, 0));
    }

    #[test]
    fn halving_inside_a_list_splices_after_left() {
        // Free blocks 0 (64 bytes) and 64 (64 bytes).
        let mut arena = Arena::new(128);
        arena.write_header(0, &Header::free(64, 64, 64));
        arena.write_header(64, &Header::free(64, 0, 0));

        halve(&mut arena, 0).unwrap();

        assert_eq!(arena.read_header(0).unwrap().next, 32);
        let mid = arena.read_header(32).unwrap();
        assert_eq!((mid.size, mid.next, mid.prev), (32, 64, 0));
        assert_eq!(arena.read_header(64).unwrap().prev, 32);
        assert_eq!(arena.read_header(64).unwrap().next, 0);
        assert_eq!(arena.read_header(0).unwrap().prev, 64);
    }

    #[test]
    fn split_to_fit_stops_at_tight_fit() {
        let mut arena = singleton(1024);
        // 10 + header = 26 -> 32.
        assert_eq!(split_to_fit(&mut arena, 0, 26).unwrap(), 32);
        // Halves at 512, 256, 128, 64, 32 were produced on the way down.
        for (offset, size) in [(32, 32), (64, 64), (128, 128), (256, 256), (512, 512)] {
            assert_eq!(arena.free_header(offset).unwrap().size, size);
        }
    }

    #[test]
    fn split_to_fit_leaves_tight_block_alone() {
        let mut arena = singleton(32);
        assert_eq!(split_to_fit(&mut arena, 0, 32).unwrap(), 32);
        assert!(arena.read_header(0).unwrap().is_singleton(0));
    }

    #[test]
    fn split_to_fit_rejects_undersized_block() {
        let mut arena = singleton(32);
        assert!(split_to_fit(&mut arena, 0, 64).is_err());
    }
}
