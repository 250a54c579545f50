//! Criterion benchmarks for whole-table runs.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use ringlock_bench::{large_ring_config, reference_config};
use ringlock_engine::Table;

fn bench_reference_table(c: &mut Criterion) {
    c.bench_function("table_5x7_instant", |b| {
        b.iter(|| {
            let table = Table::build(reference_config(42)).unwrap();
            let report = table.run_to_completion().unwrap();
            black_box(report.total_meals);
        });
    });
}

fn bench_large_ring(c: &mut Criterion) {
    let mut group = c.benchmark_group("large_ring");
    group.sample_size(10);
    group.bench_function("table_64x100_instant", |b| {
        b.iter(|| {
            let table = Table::build(large_ring_config(42)).unwrap();
            let report = table.run_to_completion().unwrap();
            black_box(report.total_meals);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_reference_table, bench_large_ring);
criterion_main!(benches);
