//! Primitive key types accepted by the maps

use std::fmt::Debug;

/// A primitive key: copyable, with a 32-bit hash and its own notion of equality.
///
/// Hashes follow the usual boxed-primitive conventions: narrow integers hash to
/// themselves, 64-bit values fold their upper half into the lower one, floats
/// hash their bit pattern. Float keys compare by bit pattern so `NaN` can be
/// stored and found again.
pub trait MapKey: Copy + Default + Debug {
    /// 32-bit hash of the key
    fn hash_code(&self) -> i32;

    /// Key equality used by chain walks
    fn same_key(&self, other: &Self) -> bool;
}

/// Implements [`MapKey`] for integer types that fit in 32 bits
macro_rules! narrow_key {
    ($($ty:ty),*) => {$(
        impl MapKey for $ty {
            #[inline]
            fn hash_code(&self) -> i32 {
                i32::from(*self)
            }

            #[inline]
            fn same_key(&self, other: &Self) -> bool {
                self == other
            }
        }
    )*};
}

narrow_key!(i8, i16, i32, u8, u16);

/// Folds a 64-bit pattern into 32 bits
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn fold64(bits: u64) -> i32 {
    (bits ^ (bits >> 32)) as u32 as i32
}

impl MapKey for u32 {
    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    fn hash_code(&self) -> i32 {
        *self as i32
    }

    #[inline]
    fn same_key(&self, other: &Self) -> bool {
        self == other
    }
}

impl MapKey for char {
    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    fn hash_code(&self) -> i32 {
        u32::from(*self) as i32
    }

    #[inline]
    fn same_key(&self, other: &Self) -> bool {
        self == other
    }
}

impl MapKey for i64 {
    #[inline]
    #[allow(clippy::cast_sign_loss)]
    fn hash_code(&self) -> i32 {
        fold64(*self as u64)
    }

    #[inline]
    fn same_key(&self, other: &Self) -> bool {
        self == other
    }
}

impl MapKey for u64 {
    #[inline]
    fn hash_code(&self) -> i32 {
        fold64(*self)
    }

    #[inline]
    fn same_key(&self, other: &Self) -> bool {
        self == other
    }
}

impl MapKey for f32 {
    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    fn hash_code(&self) -> i32 {
        self.to_bits() as i32
    }

    #[inline]
    fn same_key(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl MapKey for f64 {
    #[inline]
    fn hash_code(&self) -> i32 {
        fold64(self.to_bits())
    }

    #[inline]
    fn same_key(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}
