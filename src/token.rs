//! Version-stamped entry handles

use std::fmt;

/// Index reserved for the out-of-band null-key slot
pub const NULL_KEY_INDEX: u32 = 0x7FFF_FFFF;

/// Handle to one map entry, valid while the map's version is unchanged.
///
/// Packs `(version << 32) | index`. `index` is an entry position or
/// [`NULL_KEY_INDEX`]. [`Token::INVALID`] marks "no entry".
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(u64);

impl Token {
    /// Sentinel returned when there is no entry to point at
    pub const INVALID: Self = Self(u64::MAX);

    /// Packs a version and an index
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn new(version: u32, index: u32) -> Self {
        Self(((version as u64) << 32) | index as u64)
    }

    /// Rebuilds a token from its raw packed form
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw packed form
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Map version the token was issued at
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn version(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Entry index, or [`NULL_KEY_INDEX`]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns true for [`Token::INVALID`]
    #[must_use]
    pub const fn is_invalid(self) -> bool {
        self.0 == Self::INVALID.0
    }

    /// Returns true if the token names the null-key slot
    #[must_use]
    pub const fn is_null_key(self) -> bool {
        !self.is_invalid() && self.index() == NULL_KEY_INDEX
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_invalid() {
            return f.write_str("Token(INVALID)");
        }
        f.debug_struct("Token").field("version", &self.version()).field("index", &self.index()).finish()
    }
}
