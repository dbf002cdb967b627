#![allow(
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::similar_names
)]
use std::{collections::HashMap, hint::black_box};

use criterion::{Criterion, criterion_group, criterion_main};
use lohimap::{LongLongMap, Token};
use proptest::{
    collection::vec,
    prelude::{Strategy, any},
    strategy::ValueTree,
    test_runner::TestRunner,
};

const ITEMS_AMOUNT: usize = 1000;
const SAMPLE_SIZE: usize = 10;

fn hash_map_benches(c: &mut Criterion) {
    let mut runner = TestRunner::default();
    let items: Vec<(i64, i64)> =
        vec(any::<(i64, i64)>(), ITEMS_AMOUNT).new_tree(&mut runner).unwrap().current();

    let mut group = c.benchmark_group("Hash map comparison benchmark");
    group.sample_size(SAMPLE_SIZE);
    let mut lohi_map = LongLongMap::new();
    let mut rust_map = HashMap::new();
    group.bench_function("lohi insert", |b| {
        b.iter(|| {
            for &(key, value) in &items {
                lohi_map.put(key, value).unwrap();
            }
        });
    });
    group.bench_function("rust std insert", |b| {
        b.iter(|| {
            for &(key, value) in &items {
                rust_map.insert(key, value);
            }
        });
    });
    group.bench_function("lohi get", |b| {
        b.iter(|| {
            for (key, _) in &items {
                black_box(lohi_map.get(key).unwrap());
            }
        });
    });
    group.bench_function("rust std get", |b| {
        b.iter(|| {
            for (key, _) in &items {
                black_box(rust_map.get(key));
            }
        });
    });
    group.bench_function("lohi checked token walk", |b| {
        b.iter(|| {
            let mut sum = 0_i64;
            let mut token = lohi_map.token();
            while token != Token::INVALID {
                sum = sum.wrapping_add(lohi_map.value(token).unwrap());
                token = lohi_map.next_token(token).unwrap();
            }
            black_box(sum)
        });
    });
    group.bench_function("lohi unchecked index walk", |b| {
        b.iter(|| {
            let mut sum = 0_i64;
            let mut cursor = lohi_map.next_index_unchecked(None);
            while let Some(index) = cursor {
                sum = sum.wrapping_add(lohi_map.value_at(index).unwrap_or_default());
                cursor = lohi_map.next_index_unchecked(Some(index));
            }
            black_box(sum)
        });
    });
    group.bench_function("lohi remove and reinsert", |b| {
        b.iter(|| {
            for &(key, value) in &items {
                lohi_map.remove(&key).unwrap();
                lohi_map.put(key, value).unwrap();
            }
        });
    });
    group.finish();
}

criterion_group!(benches, hash_map_benches);

criterion_main!(benches);
