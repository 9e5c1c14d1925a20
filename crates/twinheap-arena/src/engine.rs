//! The allocation engine.
//!
//! [`Heap`] owns one arena and its free list and implements the four
//! public operations:
//!
//! 1. `init()`: create the arena as one free block spanning all of it
//! 2. `allocate()`: select a free block, split it to a tight fit, detach it
//! 3. `release()`: validate, reinsert in address order, coalesce
//! 4. `shutdown()`: drop the arena
//!
//! Every fatal error passes through the configured [`FatalPolicy`] before
//! it reaches the caller.

use std::fmt;

use twinheap_core::layout::{arena_size_for, block_need, HEADER_SIZE};
use twinheap_core::{BlockTag, FatalError, HeapError, Pointer};

use crate::arena::Arena;
use crate::coalesce::coalesce;
use crate::config::{ConfigError, FatalPolicy, HeapConfig};
use crate::free_list::FreeList;
use crate::header::Header;
use crate::split::split_to_fit;
use crate::view::check_block;

/// Arena plus free list, present only while the heap is initialised.
pub(crate) struct Live {
    pub(crate) arena: Arena,
    pub(crate) free: FreeList,
}

/// A buddy allocator over a single owned arena.
///
/// A heap starts uninitialised. [`Heap::init`] creates the arena; from
/// then on [`Heap::allocate`] and [`Heap::release`] hand out and take back
/// power-of-two blocks, each prefixed by a header living in the arena
/// itself. [`Heap::shutdown`] discards the arena and returns the heap to
/// the uninitialised state.
///
/// ```
/// use twinheap_arena::{FatalPolicy, Heap, HeapConfig};
///
/// let config = HeapConfig::new().with_fatal_policy(FatalPolicy::Report);
/// let mut heap = Heap::new(config).unwrap();
/// heap.init(1000).unwrap();
/// assert_eq!(heap.arena_size(), Some(1024));
///
/// let p = heap.allocate(100).unwrap().expect("fits");
/// heap.payload_mut(p).unwrap()[..5].copy_from_slice(b"hello");
/// heap.release(p).unwrap();
/// assert_eq!(heap.stats().unwrap().free_blocks, 1);
/// ```
pub struct Heap {
    config: HeapConfig,
    live: Option<Live>,
}

impl Heap {
    /// Create an uninitialised heap.
    ///
    /// Returns `Err(ConfigError)` if `config` fails validation.
    pub fn new(config: HeapConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, live: None })
    }

    /// The configuration this heap was built with.
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// Whether `init` has been called since construction or the last
    /// `shutdown`.
    pub fn is_initialized(&self) -> bool {
        self.live.is_some()
    }

    /// Size of the arena in bytes, if initialised.
    pub fn arena_size(&self) -> Option<u32> {
        self.live.as_ref().map(|live| live.arena.size())
    }

    /// Offset at which the next free-list search starts, if initialised.
    pub fn anchor(&self) -> Option<u32> {
        self.live.as_ref().map(|live| live.free.anchor())
    }

    /// Create the arena.
    ///
    /// `size` is rounded up to a power of two (and to at least one header).
    /// The whole arena becomes a single free block.
    ///
    /// Calling `init` on an already initialised heap does nothing, even if
    /// `size` differs from the current arena size.
    ///
    /// Returns `Err(HeapError::ArenaTooLarge)` if the rounded size exceeds
    /// [`HeapConfig::max_arena_size`].
    pub fn init(&mut self, size: u32) -> Result<(), HeapError> {
        if let Some(live) = &self.live {
            log::warn!(
                "heap already initialised with {} bytes; ignoring init({size})",
                live.arena.size()
            );
            return Ok(());
        }

        let arena_size = arena_size_for(size)
            .filter(|&s| s <= self.config.max_arena_size)
            .ok_or(HeapError::ArenaTooLarge {
                requested: size,
                max: self.config.max_arena_size,
            })?;

        let mut arena = Arena::new(arena_size);
        arena.write_header(0, &Header::free(arena_size, 0, 0));
        self.live = Some(Live {
            arena,
            free: FreeList::anchored_at(0),
        });

        log::debug!("heap initialised: requested {size} bytes, arena {arena_size} bytes");
        Ok(())
    }

    /// Allocate a block with at least `n` usable bytes.
    ///
    /// Returns `Ok(None)` when no free block can serve the request, in
    /// which case nothing has changed. A lone free block is only used if
    /// it can be split at least once, so the free list never empties.
    ///
    /// The returned block is the smallest power of two that holds `n`
    /// bytes plus a header.
    pub fn allocate(&mut self, n: u32) -> Result<Option<Pointer>, HeapError> {
        let result = self.try_allocate(n);
        self.settle(result)
    }

    fn try_allocate(&mut self, n: u32) -> Result<Option<Pointer>, HeapError> {
        let live = self.live.as_mut().ok_or(HeapError::Uninitialized)?;
        let Some(need) = block_need(n) else {
            log::trace!("allocate({n}): request overflows block size");
            return Ok(None);
        };

        let Some((first, first_header)) = live.free.first_fit(&live.arena, need)? else {
            log::trace!("allocate({n}): no free block of {need} bytes");
            return Ok(None);
        };

        if first_header.is_singleton(first) && u64::from(first_header.size) < 2 * u64::from(need) {
            log::trace!(
                "allocate({n}): sole free block of {} bytes cannot be split",
                first_header.size
            );
            return Ok(None);
        }

        live.free.set_anchor(first);
        let candidate = live.free.smallest_fit(&live.arena, first, need)?;
        let size = split_to_fit(&mut live.arena, candidate, need)?;

        // Unlink reads the candidate's links as a free block, so the tag
        // flips only once it is out of the list.
        let next = live.free.unlink(&mut live.arena, candidate)?;
        live.arena.set_tag(candidate, BlockTag::Allocated);
        live.free.set_anchor(next);

        let ptr = Pointer::from_block(candidate);
        log::trace!("allocate({n}) -> {ptr} ({size}-byte block at {candidate})");
        Ok(Some(ptr))
    }

    /// Return a block obtained from [`Heap::allocate`].
    ///
    /// Releasing a pointer this heap did not hand out, or one that has
    /// already been released, is a fatal error.
    pub fn release(&mut self, ptr: Pointer) -> Result<(), HeapError> {
        let result = self.try_release(ptr);
        self.settle(result)
    }

    fn try_release(&mut self, ptr: Pointer) -> Result<(), HeapError> {
        let live = self.live.as_mut().ok_or(HeapError::Uninitialized)?;
        let offset = allocated_block(&live.arena, ptr)?.0;

        live.arena.set_tag(offset, BlockTag::Free);
        let min = live.free.insert_ordered(&mut live.arena, offset)?;
        live.free.set_anchor(min);
        let merges = coalesce(&mut live.arena, &mut live.free)?;

        log::trace!("release({ptr}): block at {offset} freed, {merges} merges");
        Ok(())
    }

    /// Discard the arena. The heap can be initialised again afterwards.
    pub fn shutdown(&mut self) {
        if let Some(live) = self.live.take() {
            log::debug!("heap shut down ({} bytes released)", live.arena.size());
        }
    }

    /// Usable bytes in the allocated block behind `ptr`.
    pub fn usable_size(&self, ptr: Pointer) -> Result<u32, HeapError> {
        let result = self
            .live()
            .and_then(|live| Ok(allocated_block(&live.arena, ptr)?.1 - HEADER_SIZE));
        self.settle(result)
    }

    /// Borrow the usable bytes of the allocated block behind `ptr`.
    pub fn payload(&self, ptr: Pointer) -> Result<&[u8], HeapError> {
        let live = self.live()?;
        match allocated_block(&live.arena, ptr) {
            Ok((_, size)) => Ok(live.arena.slice(ptr.offset(), size - HEADER_SIZE)),
            Err(e) => self.settle(Err(e.into())),
        }
    }

    /// Mutably borrow the usable bytes of the allocated block behind `ptr`.
    pub fn payload_mut(&mut self, ptr: Pointer) -> Result<&mut [u8], HeapError> {
        let checked = self
            .live()
            .and_then(|live| Ok(allocated_block(&live.arena, ptr)?.1));
        let size = self.settle(checked)?;
        let live = self.live.as_mut().ok_or(HeapError::Uninitialized)?;
        Ok(live.arena.slice_mut(ptr.offset(), size - HEADER_SIZE))
    }

    pub(crate) fn live(&self) -> Result<&Live, HeapError> {
        self.live.as_ref().ok_or(HeapError::Uninitialized)
    }

    /// Direct access to the arena, for tests that plant corruption.
    #[cfg(test)]
    pub(crate) fn live_mut(&mut self) -> &mut Live {
        self.live.as_mut().expect("heap not initialised")
    }

    /// Apply the fatal policy to a result on its way out.
    fn settle<T>(&self, result: Result<T, HeapError>) -> Result<T, HeapError> {
        if let Err(HeapError::Fatal(e)) = &result {
            log::error!("{e}");
            if self.config.fatal_policy == FatalPolicy::Abort {
                std::process::abort();
            }
        }
        result
    }
}

/// Resolve `ptr` to its block, requiring the block to be allocated.
///
/// Returns `(block offset, block size)`.
pub(crate) fn allocated_block(arena: &Arena, ptr: Pointer) -> Result<(u32, u32), FatalError> {
    let offset = match ptr.block_offset() {
        Some(offset) if arena.holds_header(offset) => offset,
        _ => {
            return Err(FatalError::OutOfArena {
                pointer: ptr.offset(),
                arena_size: arena.size(),
            })
        }
    };
    let header = arena.read_header(offset)?;
    if header.tag() != Some(BlockTag::Allocated) {
        return Err(FatalError::NotAllocated {
            offset,
            found: header.magic,
        });
    }
    // The payload is caller-writable, so a forged header can sit behind
    // any pointer. Its size must still describe a real block.
    check_block(arena, offset, &header)?;
    Ok((offset, header.size))
}

impl Default for Heap {
    fn default() -> Self {
        Self {
            config: HeapConfig::default(),
            live: None,
        }
    }
}

impl fmt::Debug for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap")
            .field("config", &self.config)
            .field("arena_size", &self.arena_size())
            .field("anchor", &self.anchor())
            .finish()
    }
}
