//! Heap configuration parameters.

use std::error::Error;
use std::fmt;

use twinheap_core::layout::{HEADER_SIZE, MAX_ARENA_SIZE};

/// What the heap does when it detects a fatal error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FatalPolicy {
    /// Log the error and abort the process.
    #[default]
    Abort,
    /// Log the error and return it as `HeapError::Fatal`.
    ///
    /// The heap's contents are unspecified afterwards; the only sensible
    /// next step is `shutdown`.
    Report,
}

/// Configuration for a [`Heap`](crate::Heap).
///
/// Fixed at construction. The arena size itself is not part of the
/// config; it is chosen by each `init` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapConfig {
    /// Reaction to double frees, foreign pointers and corrupted headers.
    ///
    /// Default: [`FatalPolicy::Abort`].
    pub fatal_policy: FatalPolicy,

    /// Largest arena `init` may create, in bytes, after rounding.
    ///
    /// Default: 2GB. Must be a power of two between `HEADER_SIZE` and
    /// `1 << 31`.
    pub max_arena_size: u32,
}

impl HeapConfig {
    /// Default ceiling on arena size.
    pub const DEFAULT_MAX_ARENA_SIZE: u32 = MAX_ARENA_SIZE;

    /// Create a config with default values.
    pub fn new() -> Self {
        Self {
            fatal_policy: FatalPolicy::default(),
            max_arena_size: Self::DEFAULT_MAX_ARENA_SIZE,
        }
    }

    /// Set the fatal-error policy.
    pub fn with_fatal_policy(mut self, policy: FatalPolicy) -> Self {
        self.fatal_policy = policy;
        self
    }

    /// Set the arena size ceiling.
    pub fn with_max_arena_size(mut self, max: u32) -> Self {
        self.max_arena_size = max;
        self
    }

    /// Check that the config describes a usable heap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_arena_size.is_power_of_two()
            || !(HEADER_SIZE..=MAX_ARENA_SIZE).contains(&self.max_arena_size)
        {
            return Err(ConfigError::InvalidMaxArenaSize {
                value: self.max_arena_size,
            });
        }
        Ok(())
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from [`HeapConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_arena_size` is not a power of two in the supported range.
    InvalidMaxArenaSize {
        /// The rejected value.
        value: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMaxArenaSize { value } => write!(
                f,
                "max_arena_size must be a power of two in {HEADER_SIZE}..={MAX_ARENA_SIZE} (got {value})"
            ),
        }
    }
}

impl Error for ConfigError {}
