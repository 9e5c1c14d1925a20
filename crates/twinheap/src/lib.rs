//! twinheap: a buddy allocator over a single fixed-size byte arena.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the twinheap sub-crates. For most users, adding `twinheap` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use twinheap::prelude::*;
//!
//! let config = HeapConfig::new().with_fatal_policy(FatalPolicy::Report);
//! let mut heap = Heap::new(config).unwrap();
//! heap.init(64).unwrap();
//!
//! // 10 bytes plus a 16-byte header fit a 32-byte block.
//! let p = heap.allocate(10).unwrap().expect("space for one block");
//! assert_eq!(heap.usable_size(p).unwrap(), 16);
//!
//! // The other half is now alone and too small to split again.
//! assert_eq!(heap.allocate(10).unwrap(), None);
//!
//! heap.release(p).unwrap();
//! assert_eq!(heap.stats().unwrap().largest_free, 64);
//!
//! // Releasing twice is a protocol violation.
//! assert!(heap.release(p).unwrap_err().is_fatal());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `twinheap-core` | `Pointer`, `BlockTag`, header layout, errors |
//! | [`arena`] | `twinheap-arena` | `Heap`, configuration, read-only views |
//! | [`reveal`] | `twinheap-reveal` | Free-list report, layout grid, labels |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Pointers, tags, layout arithmetic and errors (`twinheap-core`).
pub use twinheap_core as types;

/// The allocation engine (`twinheap-arena`).
///
/// [`arena::Heap`] is the entry point; [`arena::HeapConfig`] selects the
/// fatal-error policy and arena ceiling.
pub use twinheap_arena as arena;

/// Diagnostics (`twinheap-reveal`).
///
/// [`reveal::FreeListReport`] dumps the free list;
/// [`reveal::LayoutGrid`] draws the whole arena.
pub use twinheap_reveal as reveal;

/// Common imports for typical twinheap usage.
///
/// ```rust
/// use twinheap::prelude::*;
/// ```
pub mod prelude {
    // Engine
    pub use twinheap_arena::{FatalPolicy, Heap, HeapConfig, HeapStats};

    // Core types and errors
    pub use twinheap_core::{BlockTag, FatalError, HeapError, Pointer, HEADER_SIZE};

    // Diagnostics
    pub use twinheap_reveal::{reveal, FreeListReport, Labels, LayoutGrid, RevealStyle};
}
