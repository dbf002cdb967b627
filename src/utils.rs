//! Utility functions and traits for `LoHiMap` implementations

use crate::{LoHiMap, MapKey, ValueStore};

/// Extension trait for map implementations that provides snapshot accessors.
///
/// The null-key entry has no key, so `keys` and `entries` leave it out while `values`
/// includes its value.
pub trait MapExtensions<K, V> {
    /// Returns the keys of the map as a Vec
    fn keys(&self) -> Vec<K>;

    /// Returns the values of the map as a Vec
    fn values(&self) -> Vec<V>;

    /// Returns the keyed entries of the map as a Vec
    fn entries(&self) -> Vec<(K, V)>;
}

impl<K, S> MapExtensions<K, S::Value> for LoHiMap<K, S>
where
    K: MapKey,
    S: ValueStore,
{
    fn keys(&self) -> Vec<K> {
        self.iter().filter_map(|(key, _)| key).collect()
    }

    fn values(&self) -> Vec<S::Value> {
        self.iter().map(|(_, value)| value).collect()
    }

    fn entries(&self) -> Vec<(K, S::Value)> {
        self.iter().filter_map(|(key, value)| key.map(|key| (key, value))).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::IntIntMap;

    #[test]
    fn test_keys_and_values() {
        let mut map = IntIntMap::new();
        map.put(1, 10).unwrap();
        map.put(2, 20).unwrap();
        map.put(3, 30).unwrap();
        map.put_null_key(40);

        let mut keys = map.keys();
        keys.sort_unstable();

        let mut values = map.values();
        values.sort_unstable();

        assert_eq!(keys, vec![1, 2, 3]);
        assert_eq!(values, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_entries_skip_null_key() {
        let mut map = IntIntMap::new();
        map.put(5, 50).unwrap();
        map.put_null_key(0);

        assert_eq!(map.entries(), vec![(5, 50)]);
    }
}
