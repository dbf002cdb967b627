//! Value storage backing a map's value column

use std::fmt::Debug;

use crate::bits::BitsList;

/// Positional value storage, parallel to a map's key array.
///
/// Out-of-range reads return `None` and out-of-range writes are ignored; the map
/// only ever addresses indices below the length it allocated.
pub trait ValueStore: Clone + Debug {
    /// The value type read and written by the map
    type Value: Copy + PartialEq + Debug;

    /// A store of the same configuration holding `len` default values
    #[must_use]
    fn with_len(&self, len: usize) -> Self;

    /// Number of slots
    fn slots(&self) -> usize;

    /// Reads slot `index`
    fn load(&self, index: usize) -> Option<Self::Value>;

    /// Writes slot `index`
    fn store(&mut self, index: usize, value: Self::Value);

    /// Copies slot `src` into slot `dst`
    fn copy_slot(&mut self, src: usize, dst: usize) {
        if let Some(value) = self.load(src) {
            self.store(dst, value);
        }
    }
}

impl<V> ValueStore for Vec<V>
where
    V: Copy + Default + PartialEq + Debug,
{
    type Value = V;

    fn with_len(&self, len: usize) -> Self {
        vec![V::default(); len]
    }

    fn slots(&self) -> usize {
        self.len()
    }

    #[inline]
    fn load(&self, index: usize) -> Option<V> {
        self.get(index).copied()
    }

    #[inline]
    fn store(&mut self, index: usize, value: V) {
        if let Some(slot) = self.get_mut(index) {
            *slot = value;
        }
    }
}

impl ValueStore for BitsList {
    type Value = u64;

    fn with_len(&self, len: usize) -> Self {
        Self::with_len(self, len)
    }

    fn slots(&self) -> usize {
        self.len()
    }

    #[inline]
    fn load(&self, index: usize) -> Option<u64> {
        self.get(index)
    }

    #[inline]
    fn store(&mut self, index: usize, value: u64) {
        self.set(index, value);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_store() {
        let template: Vec<i16> = Vec::new();
        let mut store = ValueStore::with_len(&template, 4);
        assert_eq!(store.slots(), 4);
        store.store(2, -9);
        store.copy_slot(2, 0);
        store.store(10, 1);
        assert_eq!(store.load(0), Some(-9));
        assert_eq!(store.load(1), Some(0));
        assert_eq!(store.load(10), None);
    }

    #[test]
    fn test_bits_store_masks() {
        let template = BitsList::new(4, 0).unwrap();
        let mut store = ValueStore::with_len(&template, 8);
        store.store(7, 0x1F);
        store.copy_slot(7, 3);
        assert_eq!(store.load(3), Some(0xF));
        assert_eq!(store.slots(), 8);
    }
}
