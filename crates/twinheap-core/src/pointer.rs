//! Arena-relative payload pointers.

use std::fmt;

use crate::layout::HEADER_SIZE;

/// Location of an allocation's usable bytes within a heap arena.
///
/// A `Pointer` is the arena offset immediately past a block header. It is
/// only meaningful for the heap that produced it: pointers are plain
/// offsets, so two heaps can hand out equal pointers for unrelated blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer(pub u32);

impl Pointer {
    /// Pointer to the payload of the block whose header starts at `block_offset`.
    pub fn from_block(block_offset: u32) -> Self {
        Self(block_offset + HEADER_SIZE)
    }

    /// Arena offset of the payload.
    pub fn offset(self) -> u32 {
        self.0
    }

    /// Arena offset of the header this pointer sits behind.
    ///
    /// Returns `None` if the pointer is too small to have a header in
    /// front of it.
    pub fn block_offset(self) -> Option<u32> {
        self.0.checked_sub(HEADER_SIZE)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_block_skips_header() {
        let p = Pointer::from_block(64);
        assert_eq!(p.offset(), 64 + HEADER_SIZE);
        assert_eq!(p.block_offset(), Some(64));
    }

    #[test]
    fn pointer_inside_first_header_has_no_block() {
        assert_eq!(Pointer(HEADER_SIZE - 1).block_offset(), None);
        assert_eq!(Pointer(HEADER_SIZE).block_offset(), Some(0));
    }

    #[test]
    fn display_shows_offset() {
        assert_eq!(Pointer(48).to_string(), "@48");
    }
}
