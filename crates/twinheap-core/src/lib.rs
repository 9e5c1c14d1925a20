//! Core types for the twinheap buddy allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the engine and its diagnostics: payload pointers,
//! block tags and their on-arena magics, header layout arithmetic, and
//! error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod layout;
pub mod pointer;
pub mod tag;

pub use error::{FatalError, HeapError};
pub use layout::HEADER_SIZE;
pub use pointer::Pointer;
pub use tag::BlockTag;
