//! Read-only views of heap state.
//!
//! These are what diagnostics consume. Nothing here mutates the heap or
//! applies the fatal policy: a view over a corrupted arena reports the
//! problem as an `Err` item and stops.

use twinheap_core::layout::HEADER_SIZE;
use twinheap_core::{BlockTag, FatalError, HeapError, Pointer};

use crate::arena::Arena;
use crate::engine::{allocated_block, Heap};
use crate::header::Header;

/// One block of the arena, free or allocated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Offset of the block's header.
    pub offset: u32,
    /// Block size in bytes, header included.
    pub size: u32,
    /// Allocation state.
    pub tag: BlockTag,
}

impl BlockInfo {
    /// One past the last byte of the block.
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.size)
    }

    /// Pointer to the block's payload.
    pub fn pointer(&self) -> Pointer {
        Pointer::from_block(self.offset)
    }
}

/// One member of the free list, with its links.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeBlockInfo {
    /// Offset of the block's header.
    pub offset: u32,
    /// Block size in bytes, header included.
    pub size: u32,
    /// Offset of the next free block.
    pub next: u32,
    /// Offset of the previous free block.
    pub prev: u32,
}

/// Aggregate counts over every block in the arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Size of the arena in bytes.
    pub arena_size: u32,
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Bytes in free blocks, headers included.
    pub free_bytes: u64,
    /// Number of allocated blocks.
    pub allocated_blocks: usize,
    /// Bytes in allocated blocks, headers included.
    pub allocated_bytes: u64,
    /// Size of the largest free block.
    pub largest_free: u32,
}

/// Whether `header` describes a plausible block at `offset` in `arena`:
/// known tag, power-of-two size of at least one header, aligned to its
/// own size, and ending inside the arena.
pub(crate) fn check_block(arena: &Arena, offset: u32, header: &Header) -> Result<BlockTag, FatalError> {
    let bad = FatalError::BadHeader {
        offset,
        magic: header.magic,
        size: header.size,
    };
    let tag = header.tag().ok_or_else(|| bad.clone())?;
    let size = header.size;
    if !size.is_power_of_two()
        || size < HEADER_SIZE
        || offset % size != 0
        || u64::from(offset) + u64::from(size) > u64::from(arena.size())
    {
        return Err(bad);
    }
    Ok(tag)
}

/// Iterator over every block in physical order. See [`Heap::blocks`].
pub struct Blocks<'a> {
    arena: &'a Arena,
    offset: u32,
    done: bool,
}

impl<'a> Blocks<'a> {
    pub(crate) fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            offset: 0,
            done: false,
        }
    }
}

impl Iterator for Blocks<'_> {
    type Item = Result<BlockInfo, FatalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.arena.size() {
            return None;
        }
        let offset = self.offset;
        let item = self.arena.read_header(offset).and_then(|header| {
            let tag = check_block(self.arena, offset, &header)?;
            Ok(BlockInfo {
                offset,
                size: header.size,
                tag,
            })
        });
        match &item {
            Ok(block) => self.offset = offset + block.size,
            Err(_) => self.done = true,
        }
        Some(item)
    }
}

/// Iterator over the free list from the anchor. See [`Heap::free_blocks`].
pub struct FreeBlocks<'a> {
    arena: &'a Arena,
    anchor: u32,
    cursor: u32,
    remaining: u32,
    done: bool,
}

impl Iterator for FreeBlocks<'_> {
    type Item = Result<FreeBlockInfo, FatalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.remaining == 0 {
            self.done = true;
            return Some(Err(FatalError::BrokenFreeList {
                offset: self.cursor,
            }));
        }
        self.remaining -= 1;

        let offset = self.cursor;
        match self.arena.free_header(offset) {
            Ok(header) => {
                self.cursor = header.next;
                self.done = header.next == self.anchor;
                Some(Ok(FreeBlockInfo {
                    offset,
                    size: header.size,
                    next: header.next,
                    prev: header.prev,
                }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl Heap {
    /// Iterate over every block in address order.
    pub fn blocks(&self) -> Result<Blocks<'_>, HeapError> {
        Ok(Blocks::new(&self.live()?.arena))
    }

    /// Iterate over the free list, starting at the anchor.
    pub fn free_blocks(&self) -> Result<FreeBlocks<'_>, HeapError> {
        let live = self.live()?;
        Ok(FreeBlocks {
            arena: &live.arena,
            anchor: live.free.anchor(),
            cursor: live.free.anchor(),
            remaining: live.arena.max_blocks(),
            done: false,
        })
    }

    /// Describe the allocated block behind `ptr`.
    ///
    /// Unlike [`Heap::usable_size`], a bad pointer is reported as an
    /// `Err` without consulting the fatal policy.
    pub fn block_at(&self, ptr: Pointer) -> Result<BlockInfo, HeapError> {
        let live = self.live()?;
        let (offset, size) = allocated_block(&live.arena, ptr)?;
        Ok(BlockInfo {
            offset,
            size,
            tag: BlockTag::Allocated,
        })
    }

    /// Count free and allocated blocks.
    pub fn stats(&self) -> Result<HeapStats, HeapError> {
        let mut stats = HeapStats {
            arena_size: self.arena_size().ok_or(HeapError::Uninitialized)?,
            ..HeapStats::default()
        };
        for block in self.blocks()? {
            let block = block?;
            match block.tag {
                BlockTag::Free => {
                    stats.free_blocks += 1;
                    stats.free_bytes += u64::from(block.size);
                    stats.largest_free = stats.largest_free.max(block.size);
                }
                BlockTag::Allocated => {
                    stats.allocated_blocks += 1;
                    stats.allocated_bytes += u64::from(block.size);
                }
            }
        }
        Ok(stats)
    }
}
