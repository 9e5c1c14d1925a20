//! The intrusive circular free list.
//!
//! Free blocks are linked through the `next`/`prev` words of their own
//! headers; the only state held outside the arena is the anchor, the
//! offset at which traversals start. Every walk is bounded by
//! [`Arena::max_blocks`] so a corrupted cycle surfaces as
//! [`FatalError::BrokenFreeList`] rather than a hang.
//!
//! Outside an allocation in progress the list is kept in ascending offset
//! order around the cycle (one wrap from the highest offset back to the
//! lowest). Release depends on this to find insertion points, and
//! coalescing depends on it to see physical neighbours as list neighbours.

use twinheap_core::FatalError;

use crate::arena::Arena;
use crate::header::Header;

/// Anchor of the free list threaded through an [`Arena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FreeList {
    anchor: u32,
}

impl FreeList {
    /// A list anchored at `anchor`. The caller is responsible for having
    /// written a valid cycle through that block.
    pub(crate) fn anchored_at(anchor: u32) -> Self {
        Self { anchor }
    }

    pub(crate) fn anchor(&self) -> u32 {
        self.anchor
    }

    pub(crate) fn set_anchor(&mut self, anchor: u32) {
        self.anchor = anchor;
    }

    /// Visit every member once, starting at the anchor.
    ///
    /// `visit` may stop the walk early by returning `Some`.
    pub(crate) fn walk<T>(
        &self,
        arena: &Arena,
        mut visit: impl FnMut(u32, &Header) -> Option<T>,
    ) -> Result<Option<T>, FatalError> {
        self.walk_from(arena, self.anchor, &mut visit)
    }

    fn walk_from<T>(
        &self,
        arena: &Arena,
        start: u32,
        visit: &mut impl FnMut(u32, &Header) -> Option<T>,
    ) -> Result<Option<T>, FatalError> {
        let mut cursor = start;
        for _ in 0..arena.max_blocks() {
            let header = arena.free_header(cursor)?;
            if let Some(found) = visit(cursor, &header) {
                return Ok(Some(found));
            }
            cursor = header.next;
            if cursor == start {
                return Ok(None);
            }
        }
        Err(FatalError::BrokenFreeList { offset: cursor })
    }

    /// First member, in anchor order, spanning at least `need` bytes.
    pub(crate) fn first_fit(
        &self,
        arena: &Arena,
        need: u32,
    ) -> Result<Option<(u32, Header)>, FatalError> {
        self.walk(arena, |offset, header| {
            (header.size >= need).then_some((offset, *header))
        })
    }

    /// Smallest member strictly larger than `need`, walking the whole
    /// cycle from `start`.
    ///
    /// `start` itself is the initial best regardless of size, and a later
    /// member only replaces the best if it is strictly smaller, so ties
    /// go to whichever comes first after `start`.
    pub(crate) fn smallest_fit(
        &self,
        arena: &Arena,
        start: u32,
        need: u32,
    ) -> Result<u32, FatalError> {
        let first = arena.free_header(start)?;
        let mut best = (start, first.size);
        self.walk_from(arena, start, &mut |offset, header: &Header| {
            if header.size > need && header.size < best.1 {
                best = (offset, header.size);
            }
            None::<()>
        })?;
        Ok(best.0)
    }

    /// Lowest and highest member offsets.
    pub(crate) fn bounds(&self, arena: &Arena) -> Result<(u32, u32), FatalError> {
        let mut min = self.anchor;
        let mut max = self.anchor;
        self.walk(arena, |offset, _| {
            min = min.min(offset);
            max = max.max(offset);
            None::<()>
        })?;
        Ok((min, max))
    }

    /// Detach the member at `offset` by linking its neighbours to each other.
    ///
    /// The detached header's own links are left as they were. Returns
    /// the offset of its former successor.
    pub(crate) fn unlink(&self, arena: &mut Arena, offset: u32) -> Result<u32, FatalError> {
        let header = arena.free_header(offset)?;
        arena.free_header(header.next)?;
        arena.free_header(header.prev)?;
        arena.set_prev(header.next, header.prev);
        arena.set_next(header.prev, header.next);
        Ok(header.next)
    }

    /// Link the free block at `offset` into the list at its address-order
    /// position, and return the lowest member offset afterwards.
    ///
    /// A block below the current minimum or above the current maximum
    /// goes at the wrap point between them. Otherwise it goes between the
    /// member just below it and that member's successor.
    pub(crate) fn insert_ordered(&self, arena: &mut Arena, offset: u32) -> Result<u32, FatalError> {
        let (mut min, max) = self.bounds(arena)?;

        let (prev, next) = if offset < min || offset > max {
            let wrap = (max, min);
            if offset < min {
                min = offset;
            }
            wrap
        } else {
            let ordered = FreeList::anchored_at(min);
            let pair = ordered.walk(arena, |member, header| {
                (member < offset && header.next > offset).then_some((member, header.next))
            })?;
            pair.ok_or(FatalError::BrokenFreeList { offset })?
        };

        arena.set_next(offset, next);
        arena.set_prev(offset, prev);
        arena.set_prev(next, offset);
        arena.set_next(prev, offset);
        Ok(min)
    }
}
