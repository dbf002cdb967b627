#![allow(clippy::unwrap_used, clippy::missing_docs_in_private_items, clippy::arithmetic_side_effects)]

use std::collections::HashMap;

use lohimap::{BitsMap, IntIntMap, MapError, MapExtensions, Token};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Put(i32, i32),
    Remove(i32),
    PutNull(i32),
    RemoveNull,
    Ensure(usize),
    Shrink,
    Clear,
}

// Multiples of 7 share a bucket while the table is small
fn key() -> impl Strategy<Value = i32> {
    prop_oneof![(0..24_i32).prop_map(|k| k * 7), -40..40_i32]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (key(), any::<i32>()).prop_map(|(k, v)| Op::Put(k, v)),
        4 => key().prop_map(Op::Remove),
        1 => any::<i32>().prop_map(Op::PutNull),
        1 => Just(Op::RemoveNull),
        1 => (0..200_usize).prop_map(Op::Ensure),
        1 => Just(Op::Shrink),
        1 => Just(Op::Clear),
    ]
}

fn sorted_entries(map: &IntIntMap) -> Vec<(i32, i32)> {
    let mut entries = map.entries();
    entries.sort_unstable();
    entries
}

fn sorted_model(model: &HashMap<i32, i32>) -> Vec<(i32, i32)> {
    let mut entries: Vec<_> = model.iter().map(|(&k, &v)| (k, v)).collect();
    entries.sort_unstable();
    entries
}

proptest! {
    #[test]
    fn behaves_like_std_hash_map(ops in prop::collection::vec(op(), 1..300)) {
        let mut map = IntIntMap::with_capacity(7).unwrap();
        let mut model = HashMap::new();
        let mut null_value = None;

        for op in ops {
            let earlier = map.token();
            let capacity = map.capacity();
            let structural = match op {
                Op::Put(k, v) => {
                    let added = model.insert(k, v).is_none();
                    prop_assert_eq!(map.put(k, v).unwrap(), added);
                    added
                }
                Op::Remove(k) => {
                    let (lo, hi) = (map.lo_len(), map.hi_len());
                    let removed = map.remove(&k).unwrap();
                    prop_assert_eq!(removed, model.remove(&k).is_some());
                    if !removed {
                        prop_assert_eq!((map.lo_len(), map.hi_len()), (lo, hi));
                    }
                    removed
                }
                Op::PutNull(v) => {
                    let added = null_value.replace(v).is_none();
                    prop_assert_eq!(map.put_null_key(v), added);
                    added
                }
                Op::RemoveNull => {
                    let removed = null_value.take().is_some();
                    prop_assert_eq!(map.remove_null_key(), removed);
                    removed
                }
                Op::Ensure(n) => {
                    map.ensure_capacity(n).unwrap();
                    prop_assert!(map.capacity() >= n);
                    map.capacity() != capacity
                }
                Op::Shrink => {
                    map.shrink_to_fit();
                    map.capacity() != capacity
                }
                Op::Clear => {
                    map.clear();
                    model.clear();
                    null_value = None;
                    true
                }
            };

            // value overwrites and no-op calls keep earlier tokens usable
            if earlier != Token::INVALID {
                if structural {
                    let stale = matches!(map.next_token(earlier), Err(MapError::StaleToken { .. }));
                    prop_assert!(stale, "{:?} left {:?} usable", op, earlier);
                } else {
                    prop_assert!(map.next_token(earlier).is_ok());
                    prop_assert!(map.value(earlier).is_ok());
                }
            }

            map.check_integrity().unwrap();
            prop_assert_eq!(map.lo_len() + map.hi_len(), model.len());
            prop_assert_eq!(map.len(), model.len() + usize::from(null_value.is_some()));
            prop_assert_eq!(map.get_null_key(), null_value);
        }

        for (k, v) in &model {
            prop_assert_eq!(map.get(k).unwrap(), Some(*v));
        }
        prop_assert_eq!(sorted_entries(&map), sorted_model(&model));
    }

    #[test]
    fn resize_preserves_contents(
        pairs in prop::collection::hash_map(any::<i32>(), any::<i32>(), 0..150),
        target in 0..400_usize,
    ) {
        let mut map = IntIntMap::with_capacity(3).unwrap();
        for (&k, &v) in &pairs {
            map.put(k, v).unwrap();
        }
        let before = sorted_entries(&map);

        map.ensure_capacity(target).unwrap();
        prop_assert_eq!(sorted_entries(&map), before.clone());
        map.shrink_to_fit();
        prop_assert_eq!(sorted_entries(&map), before);
        map.check_integrity().unwrap();
    }

    #[test]
    fn tokens_visit_every_entry_once(
        pairs in prop::collection::hash_map(-500..500_i32, any::<i32>(), 0..100),
        null_value in proptest::option::of(any::<i32>()),
    ) {
        let mut map: IntIntMap = pairs.iter().map(|(&k, &v)| (k, v)).collect();
        if let Some(v) = null_value {
            map.put_null_key(v);
        }

        let mut seen = Vec::new();
        let mut token = map.token();
        while token != Token::INVALID {
            seen.push((map.key(token).unwrap(), map.value(token).unwrap()));
            token = map.next_token(token).unwrap();
        }

        if let Some(v) = null_value {
            prop_assert_eq!(seen.pop(), Some((None, v)));
        }
        let mut keyed: Vec<(i32, i32)> = seen.into_iter().map(|(k, v)| (k.unwrap(), v)).collect();
        keyed.sort_unstable();
        prop_assert_eq!(keyed, sorted_model(&pairs));
    }

    #[test]
    fn any_mutation_invalidates_tokens(
        keys in prop::collection::hash_set(0..1000_i32, 1..50),
        extra in 1000..2000_i32,
    ) {
        let mut map: IntIntMap = keys.iter().map(|&k| (k, k)).collect();
        let token = map.token();
        let index = token.index() as usize;

        map.put(extra, 0).unwrap();
        prop_assert!(map.next_token(token).unwrap_err().is_concurrent_modification());
        prop_assert!(map.key(token).is_err());
        // the unchecked cursor is not version checked
        let _next: Option<usize> = map.next_index_unchecked(Some(index));

        let token = map.token();
        map.remove(&extra).unwrap();
        prop_assert!(map.next_token(token).unwrap_err().is_concurrent_modification());
    }

    #[test]
    fn bits_map_stores_masked_values(
        pairs in prop::collection::hash_map(any::<u64>(), any::<u64>(), 0..100),
        bits in 1..=64_u8,
    ) {
        let mut map = BitsMap::<u64>::with_bits(bits, 5).unwrap();
        let mask = u64::MAX >> (64 - u32::from(bits));
        for (&k, &v) in &pairs {
            map.put(k, v).unwrap();
        }
        map.check_integrity().unwrap();
        for (k, v) in &pairs {
            prop_assert_eq!(map.get(k).unwrap(), Some(v & mask));
        }
        prop_assert!(map.values().iter().all(|v| *v <= mask));
    }
}
