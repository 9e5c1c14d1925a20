//! Diagnostics for twinheap arenas.
//!
//! Everything here reads a [`Heap`] through its public views and never
//! mutates it. Two renderings are offered:
//!
//! - [`FreeListReport`]: the free list as text, one slot per entry with
//!   its size and links;
//! - [`LayoutGrid`]: the whole arena folded onto a 32 × 16 character grid,
//!   free blocks numbered and caller-[`Labels`] lettered, followed by a
//!   size table.
//!
//! ```
//! use twinheap_arena::{Heap, HeapConfig};
//! use twinheap_reveal::{reveal, Labels, RevealStyle};
//!
//! let mut heap = Heap::new(HeapConfig::new()).unwrap();
//! heap.init(1024).unwrap();
//! let mut labels = Labels::new();
//! labels.insert('a', heap.allocate(100).unwrap().unwrap()).unwrap();
//!
//! let text = reveal(&heap, &labels, RevealStyle::Plain).unwrap();
//! assert!(text.starts_with("|a"));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod grid;
pub mod labels;
pub mod report;
pub mod style;

pub use grid::{LayoutGrid, SizeEntry, SlotLabel, GRID_HEIGHT, GRID_WIDTH};
pub use labels::{LabelError, Labels};
pub use report::FreeListReport;
pub use style::RevealStyle;

use twinheap_arena::Heap;
use twinheap_core::HeapError;

/// Render `heap` as a layout diagram with its size table.
pub fn reveal(heap: &Heap, labels: &Labels, style: RevealStyle) -> Result<String, HeapError> {
    Ok(LayoutGrid::render(heap, labels)?
        .with_style(style)
        .to_string())
}
