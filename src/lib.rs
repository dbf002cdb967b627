//! # Lo/Hi Map
//!
//! Hash maps from primitive keys to primitive or bit-packed values, built on a
//! dual-region open-addressing table.
//!
//! One backing array is shared by two regions growing toward each other. Entries
//! that land in an empty bucket go to the **hi** region at the back of the array and
//! never pay for a link. Entries that collide go to the **lo** region at the front
//! and link to the rest of their chain. Removal moves the outermost entry of a
//! region into the freed slot, so both regions stay dense and iteration only has to
//! skip the single gap between them.
//!
//! The crate provides one generic map, [`LoHiMap`], and aliases for common shapes:
//!
//! - [`PrimitiveMap`]: primitive keys to primitive values (`IntIntMap`, `DoubleShortMap`, ...)
//! - [`BitsMap`]: primitive keys to values packed into a fixed number of bits
//!
//! ## Basic Usage
//!
//! ```rust
//! use lohimap::IntIntMap;
//!
//! # fn main() -> Result<(), lohimap::MapError> {
//! // Create a new map
//! let mut map = IntIntMap::new();
//!
//! // Insert values
//! assert!(map.put(1, 10)?);
//! assert!(map.put(2, 20)?);
//!
//! // Retrieve values
//! assert_eq!(map.get(&1)?, Some(10));
//!
//! // Update values
//! assert!(!map.put(1, 11)?);
//! assert_eq!(map.get(&1)?, Some(11));
//!
//! // Remove values
//! assert!(map.remove(&1)?);
//! assert_eq!(map.get(&1)?, None);
//! # Ok(())
//! # }
//! ```
//!
//! ## Tokens
//!
//! Tokens are version-stamped entry handles. Any structural change invalidates
//! tokens issued before it.
//!
//! ```rust
//! use lohimap::{DoubleBitsMap, MapError, Token};
//!
//! # fn main() -> Result<(), MapError> {
//! let mut map = DoubleBitsMap::with_bits(4, 16)?;
//! map.put(0.5, 3)?;
//! map.put(1.5, 7)?;
//! map.put_null_key(9);
//!
//! let mut token = map.token();
//! let mut sum = 0;
//! while token != Token::INVALID {
//!     sum += map.value(token)?;
//!     token = map.next_token(token)?;
//! }
//! assert_eq!(sum, 19);
//!
//! let stale = map.token();
//! map.remove(&0.5)?;
//! assert!(map.next_token(stale).unwrap_err().is_concurrent_modification());
//! # Ok(())
//! # }
//! ```

/// Fixed-width packed bit array
mod bits;
/// Error type shared by every map
mod error;
/// Primitive key trait and its implementations
mod key;
/// The dual-region map
mod lohi_map;
/// Prime capacity sizing
mod primes;
/// Value storage abstraction
mod store;
/// Version-stamped entry handles
mod token;
/// Utility traits for the maps
mod utils;

pub use bits::BitsList;
pub use error::{MapError, Result};
pub use key::MapKey;
pub use lohi_map::{
    BitsMap, DEFAULT_CAPACITY, DoubleBitsMap, DoubleShortMap, IntIntMap, Iter, LoHiMap, LongLongMap,
    PrimitiveMap, RegionStats,
};
pub use primes::{MAX_CAPACITY, MIN_CAPACITY, is_prime, next_prime};
pub use store::ValueStore;
pub use token::{NULL_KEY_INDEX, Token};
pub use utils::MapExtensions;
