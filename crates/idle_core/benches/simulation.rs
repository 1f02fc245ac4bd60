//! Simulation benchmarks for idle_core.
//!
//! Run with: `cargo bench -p idle_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use idle_core::formulas::{bulk_price, max_affordable};
use idle_core::prelude::*;
use idle_test_utils::fixtures::{self, HOUR_MS, TICK_MS};

/// Live ticks of a busy automated economy.
pub fn tick_benchmark(c: &mut Criterion) {
    c.bench_function("tick_automated_economy", |b| {
        let mut sim = fixtures::automated_economy(42);
        let mut now = 0;
        b.iter(|| {
            now += TICK_MS;
            black_box(sim.tick(now));
        });
    });
}

/// Closed-form catch-up against replaying every missed tick.
pub fn offline_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("offline_hour");
    group.bench_function("closed_form", |b| {
        b.iter_batched(
            || fixtures::automated_economy(7),
            |mut sim| black_box(sim.catch_up(HOUR_MS)),
            criterion::BatchSize::LargeInput,
        );
    });
    group.sample_size(10);
    group.bench_function("tick_replay", |b| {
        b.iter_batched(
            || fixtures::automated_economy(7),
            |mut sim| black_box(fixtures::run_ticks(&mut sim, HOUR_MS / TICK_MS)),
            criterion::BatchSize::LargeInput,
        );
    });
    group.finish();
}

/// Bulk pricing and buy-max search at increasing ownership.
pub fn pricing_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pricing");
    let base = Cost::single(ResourceKind::Metal, 10.0);
    let ledger = ResourceLedger::new().with_entry(ResourceKind::Metal, 1.0e300, None);
    for owned in [0u64, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("bulk_price", owned), &owned, |b, &owned| {
            b.iter(|| bulk_price(black_box(10.0), black_box(1.15), owned, black_box(100)));
        });
        group.bench_with_input(BenchmarkId::new("max_affordable", owned), &owned, |b, &owned| {
            b.iter(|| max_affordable(&base, black_box(1.07), owned, 1.0, &ledger));
        });
    }
    group.finish();
}

criterion_group!(benches, tick_benchmark, offline_benchmark, pricing_benchmark);
criterion_main!(benches);
