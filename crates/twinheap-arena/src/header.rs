//! In-place block headers.
//!
//! A header is never stored anywhere except at its block's offset in the
//! arena. [`Header`] is a decoded copy; writes go straight back to the
//! arena through the field setters so that a link update never clobbers
//! a neighbouring field.
//!
//! Reads come in two strengths. [`Arena::read_header`] only checks that
//! the offset can hold a header. [`Arena::expect_header`] additionally
//! requires a specific tag, and is what every algorithm step uses before
//! trusting a block's links.

use twinheap_core::layout::{HEADER_SIZE, MAGIC_FIELD, NEXT_FIELD, PREV_FIELD, SIZE_FIELD};
use twinheap_core::{BlockTag, FatalError};

use crate::arena::Arena;

/// Decoded copy of a block header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub magic: u32,
    pub size: u32,
    pub next: u32,
    pub prev: u32,
}

impl Header {
    /// A free header with the given size and links.
    pub(crate) fn free(size: u32, next: u32, prev: u32) -> Self {
        Self {
            magic: BlockTag::MAGIC_FREE,
            size,
            next,
            prev,
        }
    }

    /// The decoded tag, or `None` if the magic is unrecognised.
    pub(crate) fn tag(&self) -> Option<BlockTag> {
        BlockTag::from_magic(self.magic)
    }

    /// Whether this header is the only member of its free list.
    pub(crate) fn is_singleton(&self, offset: u32) -> bool {
        self.next == offset && self.prev == offset
    }
}

impl Arena {
    /// Whether a header could start at `offset`.
    ///
    /// Blocks are at least `HEADER_SIZE` bytes and power-of-two sized, so
    /// every block offset is a multiple of `HEADER_SIZE`.
    pub(crate) fn holds_header(&self, offset: u32) -> bool {
        offset % HEADER_SIZE == 0 && offset < self.size()
    }

    /// Decode the header at `offset` without checking its tag.
    pub(crate) fn read_header(&self, offset: u32) -> Result<Header, FatalError> {
        if !self.holds_header(offset) {
            return Err(FatalError::BrokenFreeList { offset });
        }
        Ok(Header {
            magic: self.word(offset + MAGIC_FIELD),
            size: self.word(offset + SIZE_FIELD),
            next: self.word(offset + NEXT_FIELD),
            prev: self.word(offset + PREV_FIELD),
        })
    }

    /// Decode the header at `offset`, requiring it to carry `tag`.
    pub(crate) fn expect_header(&self, offset: u32, tag: BlockTag) -> Result<Header, FatalError> {
        let header = self.read_header(offset)?;
        if header.magic != tag.magic() {
            return Err(FatalError::Corrupted {
                offset,
                expected: tag,
                found: header.magic,
            });
        }
        Ok(header)
    }

    /// Shorthand for `expect_header(offset, BlockTag::Free)`.
    pub(crate) fn free_header(&self, offset: u32) -> Result<Header, FatalError> {
        self.expect_header(offset, BlockTag::Free)
    }

    /// Write every field of `header` at `offset`.
    pub(crate) fn write_header(&mut self, offset: u32, header: &Header) {
        self.set_word(offset + MAGIC_FIELD, header.magic);
        self.set_word(offset + SIZE_FIELD, header.size);
        self.set_word(offset + NEXT_FIELD, header.next);
        self.set_word(offset + PREV_FIELD, header.prev);
    }

    pub(crate) fn set_tag(&mut self, offset: u32, tag: BlockTag) {
        self.set_word(offset + MAGIC_FIELD, tag.magic());
    }

    pub(crate) fn set_size(&mut self, offset: u32, size: u32) {
        self.set_word(offset + SIZE_FIELD, size);
    }

    pub(crate) fn set_next(&mut self, offset: u32, next: u32) {
        self.set_word(offset + NEXT_FIELD, next);
    }

    pub(crate) fn set_prev(&mut self, offset: u32, prev: u32) {
        self.set_word(offset + PREV_FIELD, prev);
    }
}
