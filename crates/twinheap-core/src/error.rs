//! Error types for the twinheap allocator.
//!
//! Two classes of failure exist. [`HeapError::Uninitialized`] and
//! [`HeapError::ArenaTooLarge`] are ordinary, recoverable usage errors.
//! [`FatalError`] covers protocol violations (double free, foreign
//! pointer) and invariant violations (corrupted headers, a broken free
//! list); after one of these the heap's contents can no longer be trusted.
//!
//! Running out of space is not an error: `allocate` reports it as
//! `Ok(None)`.

use std::error::Error;
use std::fmt;

use crate::tag::BlockTag;

/// Errors returned by heap operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// The heap has not been initialised, or has been shut down.
    Uninitialized,
    /// The requested arena, once rounded up, exceeds the configured maximum.
    ArenaTooLarge {
        /// Size passed to `init`.
        requested: u32,
        /// Largest arena the heap is configured to create.
        max: u32,
    },
    /// An unrecoverable protocol or invariant violation.
    Fatal(FatalError),
}

impl HeapError {
    /// Whether this error signals corruption or misuse the heap cannot
    /// recover from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "heap is not initialised"),
            Self::ArenaTooLarge { requested, max } => {
                write!(
                    f,
                    "arena of {requested} bytes exceeds the maximum of {max} bytes"
                )
            }
            Self::Fatal(e) => write!(f, "fatal heap error: {e}"),
        }
    }
}

impl Error for HeapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fatal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FatalError> for HeapError {
    fn from(e: FatalError) -> Self {
        Self::Fatal(e)
    }
}

/// Unrecoverable heap failures.
///
/// `NotAllocated` and `OutOfArena` are caller mistakes detected at
/// `release`; the rest mean the engine observed a state its own operations
/// can never produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FatalError {
    /// `release` found a header that is not tagged allocated: a double
    /// free, a pointer `allocate` never returned, or an overwritten header.
    NotAllocated {
        /// Offset of the header that was inspected.
        offset: u32,
        /// Raw magic word found there.
        found: u32,
    },
    /// `release` was given a pointer whose header would lie outside the arena.
    OutOfArena {
        /// The offending pointer's offset.
        pointer: u32,
        /// Size of the arena.
        arena_size: u32,
    },
    /// A header carried a different tag than the operation required.
    Corrupted {
        /// Offset of the header.
        offset: u32,
        /// Tag the operation expected.
        expected: BlockTag,
        /// Raw magic word found there.
        found: u32,
    },
    /// The free list's links are inconsistent at this block.
    BrokenFreeList {
        /// Offset of the block where the inconsistency was observed.
        offset: u32,
    },
    /// A header with an unrecognised magic, or a size that cannot belong
    /// to a block at this offset.
    BadHeader {
        /// Offset of the header.
        offset: u32,
        /// Raw magic word found there.
        magic: u32,
        /// Size word found there.
        size: u32,
    },
}

/// Render a raw header magic as a tag name where possible.
fn describe_magic(magic: u32) -> String {
    match BlockTag::from_magic(magic) {
        Some(tag) => tag.to_string(),
        None => format!("unknown magic {magic:#010x}"),
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAllocated { offset, found } => {
                write!(
                    f,
                    "attempt to free non-allocated memory: block at {offset} is {}",
                    describe_magic(*found)
                )
            }
            Self::OutOfArena {
                pointer,
                arena_size,
            } => {
                write!(
                    f,
                    "pointer {pointer} does not address a block in a {arena_size}-byte arena"
                )
            }
            Self::Corrupted {
                offset,
                expected,
                found,
            } => {
                write!(
                    f,
                    "corrupted header at {offset}: expected {expected}, found {}",
                    describe_magic(*found)
                )
            }
            Self::BrokenFreeList { offset } => {
                write!(f, "free list is inconsistent at block {offset}")
            }
            Self::BadHeader {
                offset,
                magic,
                size,
            } => {
                write!(
                    f,
                    "invalid header at {offset}: {} with size {size}",
                    describe_magic(*magic)
                )
            }
        }
    }
}

impl Error for FatalError {}
