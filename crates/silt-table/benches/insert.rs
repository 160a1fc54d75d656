//! Insert throughput for the concurrent hash table.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rand::{RngExt, SeedableRng};
use rand_chacha::ChaCha8Rng;
use silt_exec::ExecutionPolicy;
use silt_table::HashTable;

fn coords(n: usize) -> Vec<[i32; 3]> {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5117);
    (0..n)
        .map(|_| {
            [
                rng.random_range(-512..512),
                rng.random_range(-512..512),
                rng.random_range(-512..512),
            ]
        })
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let n = 1 << 16;
    let keys = coords(n);
    let mut group = c.benchmark_group("table_insert");
    group.throughput(Throughput::Elements(n as u64));

    group.bench_function("sequential", |b| {
        b.iter_batched(
            || HashTable::<3>::with_capacity(n as u32).unwrap(),
            |table| {
                for &coord in &keys {
                    let _ = table.insert(coord).unwrap();
                }
                table
            },
            BatchSize::SmallInput,
        )
    });

    let policy = ExecutionPolicy::multi_threaded();
    group.bench_function("parallel", |b| {
        b.iter_batched(
            || HashTable::<3>::with_capacity(n as u32).unwrap(),
            |table| {
                policy.for_each(0..keys.len(), |i| {
                    let _ = table.insert(keys[i]).unwrap();
                });
                policy.sync();
                table
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let n = 1 << 16;
    let keys = coords(n);
    let table = HashTable::<3>::with_capacity(n as u32).unwrap();
    for &coord in &keys {
        table.insert(coord).unwrap();
    }
    let mut group = c.benchmark_group("table_query");
    group.throughput(Throughput::Elements(n as u64));
    group.bench_function("hit", |b| {
        b.iter(|| {
            let mut found = 0u32;
            for &coord in &keys {
                if table.query(coord).is_some() {
                    found += 1;
                }
            }
            found
        })
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_query);
criterion_main!(benches);
