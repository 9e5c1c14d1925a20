//! Buddy allocation engine over a single owned byte arena.
//!
//! A [`Heap`] manages one power-of-two arena. Every block, free or
//! allocated, carries a 16-byte header at its start; free blocks are
//! threaded into a circular doubly-linked list through the link words of
//! those headers, so the allocator keeps no bookkeeping outside the arena
//! apart from the list anchor.
//!
//! # Architecture
//!
//! ```text
//! Heap (engine)
//! ├── HeapConfig (fatal policy, arena ceiling)
//! └── Live (present between init and shutdown)
//!     ├── Arena: Vec<u8>, little-endian word access
//!     │   └── Header: magic / size / next / prev, decoded in place
//!     └── FreeList: anchor offset
//!         ├── split:    halve to a tight fit on allocate
//!         └── coalesce: merge buddies to a fixed point on release
//! ```
//!
//! Read-only views ([`Heap::blocks`], [`Heap::free_blocks`],
//! [`Heap::stats`]) and [`Heap::validate`] never mutate the heap and
//! never trigger the fatal policy.
//!
//! No `unsafe`: the arena is a byte vector addressed by `u32` offsets.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod arena;
mod coalesce;
pub mod config;
pub mod engine;
mod free_list;
mod header;
mod split;
mod validate;
pub mod view;

pub use config::{ConfigError, FatalPolicy, HeapConfig};
pub use engine::Heap;
pub use view::{BlockInfo, Blocks, FreeBlockInfo, FreeBlocks, HeapStats};

pub use twinheap_core::{BlockTag, FatalError, HeapError, Pointer, HEADER_SIZE};
