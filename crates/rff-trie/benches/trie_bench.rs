//! Criterion micro-benchmarks for the dictionary trie.
//!
//! Benchmarks:
//! - First insertion of distinct keys (allocation-heavy path)
//! - Re-query of known keys (lookup-only path)
//! - Mixed workload approximating a column with heavy duplication

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use rff_trie::Trie;

fn keys(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("sku-{:06}-{}", i, i % 97).into_bytes())
        .collect()
}

fn bench_insert_distinct(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie/insert_distinct");
    let input = keys(10_000);
    group.throughput(Throughput::Elements(input.len() as u64));

    group.bench_function("10k", |b| {
        b.iter_batched(
            Trie::new,
            |mut trie| {
                for key in &input {
                    black_box(trie.hash(key));
                }
                trie
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_lookup_known(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie/lookup_known");
    let input = keys(10_000);
    group.throughput(Throughput::Elements(input.len() as u64));

    let mut trie = Trie::new();
    for key in &input {
        trie.hash(key);
    }

    group.bench_function("10k", |b| {
        b.iter(|| {
            for key in &input {
                black_box(trie.hash(key));
            }
        });
    });

    group.finish();
}

fn bench_duplicated_column(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie/duplicated_column");
    // 100k cells drawn from 100 distinct values, the shape that makes the
    // dictionary pay off.
    let distinct = keys(100);
    let cells: Vec<&[u8]> = (0..100_000).map(|i| distinct[i % 100].as_slice()).collect();
    group.throughput(Throughput::Elements(cells.len() as u64));

    group.bench_function("100k_cells_100_values", |b| {
        b.iter_batched(
            Trie::new,
            |mut trie| {
                for cell in &cells {
                    black_box(trie.hash(cell));
                }
                trie
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_distinct,
    bench_lookup_known,
    bench_duplicated_column
);
criterion_main!(benches);
