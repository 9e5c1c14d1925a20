//! Header layout and block-size arithmetic.
//!
//! Every block, free or allocated, starts with a 16-byte header of four
//! little-endian `u32` words:
//!
//! ```text
//! +0  magic   BlockTag::MAGIC_FREE | BlockTag::MAGIC_ALLOCATED
//! +4  size    block size in bytes, header included
//! +8  next    offset of the next free block (free blocks only)
//! +12 prev    offset of the previous free block (free blocks only)
//! ```
//!
//! Block sizes are powers of two no smaller than [`HEADER_SIZE`].

/// Size in bytes of an in-place block header.
pub const HEADER_SIZE: u32 = 16;

/// Byte offset of the magic word within a header.
pub const MAGIC_FIELD: u32 = 0;
/// Byte offset of the size word within a header.
pub const SIZE_FIELD: u32 = 4;
/// Byte offset of the next-link word within a header.
pub const NEXT_FIELD: u32 = 8;
/// Byte offset of the prev-link word within a header.
pub const PREV_FIELD: u32 = 12;

/// Largest arena a heap can manage. Offsets are `u32`, and the arena
/// size itself must be representable.
pub const MAX_ARENA_SIZE: u32 = 1 << 31;

/// Round a requested arena size up to the size actually used.
///
/// Non-powers of two round up to the next power of two; anything below
/// [`HEADER_SIZE`] becomes `HEADER_SIZE` so the arena can hold at least
/// one header. Returns `None` if the result would exceed [`MAX_ARENA_SIZE`].
pub fn arena_size_for(requested: u32) -> Option<u32> {
    requested
        .max(HEADER_SIZE)
        .checked_next_power_of_two()
        .filter(|&size| size <= MAX_ARENA_SIZE)
}

/// Bytes a block must span to serve an `n`-byte request: `n + HEADER_SIZE`.
///
/// Returns `None` when the sum does not fit in a `u32`; such a request
/// can never be satisfied.
pub fn block_need(n: u32) -> Option<u32> {
    n.checked_add(HEADER_SIZE)
}

/// Smallest power-of-two block size that serves an `n`-byte request.
pub fn fit_size(n: u32) -> Option<u32> {
    block_need(n)?.checked_next_power_of_two()
}

/// Whether a block of `size` bytes is a tight fit for `need` bytes:
/// it is large enough, and its half would not be.
pub fn is_tight_fit(size: u32, need: u32) -> bool {
    size >= need && size / 2 < need
}

/// Whether a block at `offset` of `size` bytes is the left half of a
/// buddy pair, i.e. `offset` is a multiple of `2 * size`.
///
/// Offset 0 is always a left half.
pub fn is_left_buddy(offset: u32, size: u32) -> bool {
    offset == 0 || u64::from(offset) % (2 * u64::from(size)) == 0
}
