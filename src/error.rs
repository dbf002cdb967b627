//! Error type shared by every map in the crate

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, MapError>;

/// Faults raised by map operations.
///
/// Argument faults (`InvalidToken`, `CapacityOverflow`, `TrimBelowLen`,
/// `InvalidBitsPerItem`) are rejected before any state changes. `StaleToken` and
/// `CorruptChain` both signal that the map changed underneath the caller, see
/// [`MapError::is_concurrent_modification`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// The `INVALID` sentinel, or a token that names no live entry, was used
    #[error("invalid token")]
    InvalidToken,
    /// The token was issued before the last structural mutation
    #[error("token version {token_version} does not match map version {map_version}")]
    StaleToken {
        /// Version stamped into the token
        token_version: u32,
        /// Current version of the map
        map_version: u32,
    },
    /// A collision chain walk visited more nodes than the map can hold
    #[error("collision chain exceeded {limit} nodes, the map was modified concurrently")]
    CorruptChain {
        /// Number of nodes the walk was allowed to visit
        limit: usize,
    },
    /// `check_integrity` found a region or chain violation
    #[error("integrity violation: {0}")]
    Integrity(String),
    /// Requested capacity does not fit the index space
    #[error("requested capacity {requested} exceeds maximum {max}")]
    CapacityOverflow {
        /// Capacity asked for
        requested: usize,
        /// Largest supported capacity
        max: usize,
    },
    /// `trim` was asked to go below the number of stored entries
    #[error("cannot trim to {requested}, map holds {len} entries")]
    TrimBelowLen {
        /// Capacity asked for
        requested: usize,
        /// Entries currently stored
        len: usize,
    },
    /// Bit-packed values need between 1 and 64 bits per item
    #[error("bits per item must be in 1..=64, got {0}")]
    InvalidBitsPerItem(u8),
}

impl MapError {
    /// Returns true for faults caused by mutation between two dependent calls
    #[must_use]
    pub fn is_concurrent_modification(&self) -> bool {
        matches!(self, Self::StaleToken { .. } | Self::CorruptChain { .. })
    }
}
