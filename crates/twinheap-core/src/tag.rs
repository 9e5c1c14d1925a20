//! Block tags and their on-arena encoding.

use std::fmt;

/// Allocation state of a block, stored as the first word of its header.
///
/// The tag is the only record of whether a block is free. Any header word
/// that decodes to neither magic means the arena has been overwritten.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockTag {
    /// On the free list; `next`/`prev` are live links.
    Free,
    /// Handed out by `allocate`; `next`/`prev` are stale.
    Allocated,
}

impl BlockTag {
    /// Header magic marking a free block.
    pub const MAGIC_FREE: u32 = 0xDEAD_BEEF;

    /// Header magic marking an allocated block.
    pub const MAGIC_ALLOCATED: u32 = 0xBEEF_DEAD;

    /// Encode this tag as its header magic.
    pub fn magic(self) -> u32 {
        match self {
            Self::Free => Self::MAGIC_FREE,
            Self::Allocated => Self::MAGIC_ALLOCATED,
        }
    }

    /// Decode a header magic. Returns `None` for anything that is not one
    /// of the two known values.
    pub fn from_magic(magic: u32) -> Option<Self> {
        match magic {
            Self::MAGIC_FREE => Some(Self::Free),
            Self::MAGIC_ALLOCATED => Some(Self::Allocated),
            _ => None,
        }
    }

    /// Whether this is [`BlockTag::Free`].
    pub fn is_free(self) -> bool {
        self == Self::Free
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Allocated => write!(f, "allocated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_round_trip() {
        for tag in [BlockTag::Free, BlockTag::Allocated] {
            assert_eq!(BlockTag::from_magic(tag.magic()), Some(tag));
        }
    }

    #[test]
    fn unknown_magic_is_rejected() {
        assert_eq!(BlockTag::from_magic(0), None);
        assert_eq!(BlockTag::from_magic(0xFFFF_FFFF), None);
    }

    #[test]
    fn magics_are_distinct() {
        assert_ne!(BlockTag::MAGIC_FREE, BlockTag::MAGIC_ALLOCATED);
    }
}
