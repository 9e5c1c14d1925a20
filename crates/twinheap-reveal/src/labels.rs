//! Caller-side names for live allocations.
//!
//! The heap itself does not remember who owns a block. [`Labels`] lets a
//! caller attach a letter to a pointer so the layout diagram can show it.

use std::error::Error;
use std::fmt;

use indexmap::IndexMap;
use twinheap_core::Pointer;

/// Registry of lettered allocations, `'a'..='z'`, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Labels {
    entries: IndexMap<char, Pointer>,
}

impl Labels {
    /// Most labels a registry can hold: one per lowercase letter.
    pub const CAPACITY: usize = 26;

    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `label` to `ptr`, returning the pointer it previously named.
    ///
    /// Re-inserting an existing label keeps its original position.
    pub fn insert(&mut self, label: char, ptr: Pointer) -> Result<Option<Pointer>, LabelError> {
        if !label.is_ascii_lowercase() {
            return Err(LabelError::InvalidLabel { label });
        }
        Ok(self.entries.insert(label, ptr))
    }

    /// Detach `label`, returning the pointer it named.
    pub fn remove(&mut self, label: char) -> Option<Pointer> {
        self.entries.shift_remove(&label)
    }

    /// The pointer named by `label`.
    pub fn get(&self, label: char) -> Option<Pointer> {
        self.entries.get(&label).copied()
    }

    /// The first label not yet in use, in alphabetical order.
    pub fn next_free(&self) -> Option<char> {
        ('a'..='z').find(|c| !self.entries.contains_key(c))
    }

    /// Labels and pointers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (char, Pointer)> + '_ {
        self.entries.iter().map(|(&label, &ptr)| (label, ptr))
    }

    /// Number of labels in use.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no labels are in use.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Errors from [`Labels::insert`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabelError {
    /// Labels are single lowercase ASCII letters.
    InvalidLabel {
        /// The rejected character.
        label: char,
    },
}

impl fmt::Display for LabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLabel { label } => {
                write!(f, "label {label:?} is not a lowercase letter a-z")
            }
        }
    }
}

impl Error for LabelError {}
