//! Test utilities for twinheap development.
//!
//! - [`Workload`]: seeded, reproducible allocate/release sequences.
//! - [`Harness`]: replays operations against a [`Heap`](twinheap_arena::Heap),
//!   checking every invariant after each step.
//! - [`assert_partition`]: the block-tiling check on its own.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod harness;
pub mod workload;

pub use harness::{assert_partition, Harness, ReplayStats};
pub use workload::{Op, Workload};
