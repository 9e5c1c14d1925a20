//! The owned byte region every block lives in.
//!
//! [`Arena`] is a zero-initialised `Vec<u8>` addressed by `u32` offsets.
//! It knows nothing about blocks; the header accessors in
//! [`header`](crate::header) layer block structure on top of it.

use twinheap_core::layout::HEADER_SIZE;

/// A fixed-size, power-of-two byte region.
pub(crate) struct Arena {
    bytes: Vec<u8>,
}

impl Arena {
    /// Allocate a zeroed arena of `size` bytes.
    ///
    /// `size` must already be a power of two no smaller than `HEADER_SIZE`.
    pub(crate) fn new(size: u32) -> Self {
        debug_assert!(size.is_power_of_two() && size >= HEADER_SIZE);
        Self {
            bytes: vec![0; size as usize],
        }
    }

    /// Size of the arena in bytes.
    pub(crate) fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// Upper bound on the number of blocks the arena can hold.
    ///
    /// Every block spans at least one header, so no walk over the blocks
    /// or the free list can take more steps than this without looping.
    pub(crate) fn max_blocks(&self) -> u32 {
        self.size() / HEADER_SIZE
    }

    /// Read the little-endian word at `at`.
    ///
    /// # Panics
    ///
    /// Panics if `at + 4` exceeds the arena.
    pub(crate) fn word(&self, at: u32) -> u32 {
        let at = at as usize;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.bytes[at..at + 4]);
        u32::from_le_bytes(buf)
    }

    /// Write `value` as a little-endian word at `at`.
    ///
    /// # Panics
    ///
    /// Panics if `at + 4` exceeds the arena.
    pub(crate) fn set_word(&mut self, at: u32, value: u32) {
        let at = at as usize;
        self.bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Borrow `len` bytes starting at `start`.
    pub(crate) fn slice(&self, start: u32, len: u32) -> &[u8] {
        let start = start as usize;
        &self.bytes[start..start + len as usize]
    }

    /// Mutably borrow `len` bytes starting at `start`.
    pub(crate) fn slice_mut(&mut self, start: u32, len: u32) -> &mut [u8] {
        let start = start as usize;
        &mut self.bytes[start..start + len as usize]
    }
}
