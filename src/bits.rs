//! Fixed-width packed bit array used as value storage by bit-packed maps

use crate::error::{MapError, Result};

/// Bits in one backing word
const WORD_BITS: usize = 64;

/// A list of `len` items, each `bits_per_item` wide, packed into `u64` words.
///
/// Items may straddle a word boundary. Stored values are masked to the item width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitsList {
    /// Packed items
    words: Vec<u64>,
    /// Number of items
    len: usize,
    /// Width of one item in bits (1..=64)
    bits_per_item: u8,
}

impl BitsList {
    /// Creates a zeroed list of `len` items of `bits_per_item` bits each.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidBitsPerItem`] unless `bits_per_item` is in `1..=64`.
    pub fn new(bits_per_item: u8, len: usize) -> Result<Self> {
        if bits_per_item == 0 || usize::from(bits_per_item) > WORD_BITS {
            return Err(MapError::InvalidBitsPerItem(bits_per_item));
        }
        Ok(Self::zeroed(bits_per_item, len))
    }

    /// Allocates a zeroed list, width already validated
    fn zeroed(bits_per_item: u8, len: usize) -> Self {
        let total_bits = len.saturating_mul(usize::from(bits_per_item));
        Self { words: vec![0; total_bits.div_ceil(WORD_BITS)], len, bits_per_item }
    }

    /// Same width, new length, all items zero
    #[must_use]
    pub fn with_len(&self, len: usize) -> Self {
        Self::zeroed(self.bits_per_item, len)
    }

    /// Width of one item in bits
    #[must_use]
    pub fn bits_per_item(&self) -> u8 {
        self.bits_per_item
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list holds no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Largest value an item can hold
    #[must_use]
    pub fn mask(&self) -> u64 {
        u64::MAX >> (WORD_BITS.saturating_sub(usize::from(self.bits_per_item)))
    }

    /// Word index and bit offset of item `index`
    #[allow(clippy::arithmetic_side_effects)]
    fn locate(&self, index: usize) -> (usize, usize) {
        let bit = index * usize::from(self.bits_per_item);
        (bit / WORD_BITS, bit % WORD_BITS)
    }

    /// Reads item `index`, `None` when out of range
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)]
    pub fn get(&self, index: usize) -> Option<u64> {
        if index >= self.len {
            return None;
        }
        let (word, offset) = self.locate(index);
        let mut value = *self.words.get(word)? >> offset;
        if offset + usize::from(self.bits_per_item) > WORD_BITS {
            value |= *self.words.get(word + 1)? << (WORD_BITS - offset);
        }
        Some(value & self.mask())
    }

    /// Writes item `index`, masking `value` to the item width. Returns false when out of range.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn set(&mut self, index: usize, value: u64) -> bool {
        if index >= self.len {
            return false;
        }
        let mask = self.mask();
        let value = value & mask;
        let (word, offset) = self.locate(index);
        let spill = (offset + usize::from(self.bits_per_item)).saturating_sub(WORD_BITS);
        if let Some(slot) = self.words.get_mut(word) {
            *slot = (*slot & !(mask << offset)) | (value << offset);
        }
        if spill > 0 {
            let spill_mask = (1_u64 << spill) - 1;
            if let Some(slot) = self.words.get_mut(word + 1) {
                *slot = (*slot & !spill_mask) | (value >> (WORD_BITS - offset));
            }
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_width() {
        assert_eq!(BitsList::new(0, 4), Err(MapError::InvalidBitsPerItem(0)));
        assert_eq!(BitsList::new(65, 4), Err(MapError::InvalidBitsPerItem(65)));
        assert!(BitsList::new(64, 4).is_ok());
    }

    #[test]
    fn test_items_straddle_words() {
        let mut bits = BitsList::new(5, 40).unwrap();
        for i in 0..40 {
            assert!(bits.set(i, (i as u64 * 7) % 32));
        }
        for i in 0..40 {
            assert_eq!(bits.get(i), Some((i as u64 * 7) % 32), "item {i}");
        }
    }

    #[test]
    fn test_set_masks_value_and_leaves_neighbours() {
        let mut bits = BitsList::new(3, 30).unwrap();
        bits.set(20, 0b111);
        bits.set(21, 0xFF);
        assert_eq!(bits.get(20), Some(0b111));
        assert_eq!(bits.get(21), Some(0b111));
        bits.set(21, 0);
        assert_eq!(bits.get(20), Some(0b111));
        assert_eq!(bits.get(21), Some(0));
        assert_eq!(bits.get(22), Some(0));
    }

    #[test]
    fn test_full_width_items() {
        let mut bits = BitsList::new(64, 3).unwrap();
        bits.set(1, u64::MAX);
        assert_eq!(bits.get(0), Some(0));
        assert_eq!(bits.get(1), Some(u64::MAX));
        assert_eq!(bits.get(3), None);
        assert!(!bits.set(3, 1));
    }

    #[test]
    fn test_with_len_keeps_width() {
        let bits = BitsList::new(9, 4).unwrap();
        let grown = bits.with_len(100);
        assert_eq!(grown.bits_per_item(), 9);
        assert_eq!(grown.len(), 100);
        assert_eq!(grown.get(99), Some(0));
        assert_eq!(grown.mask(), 0x1FF);
    }
}
