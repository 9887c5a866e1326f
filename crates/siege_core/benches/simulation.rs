//! Simulation benchmarks for siege_core.
//!
//! Run with: `cargo bench -p siege_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use siege_core::prelude::*;
use siege_test_utils::fixtures::full_field;

/// Tick cost with both sides at capacity and fighting mid-field.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("full_field_tick", |b| {
        b.iter_batched(
            full_field,
            |mut sim| {
                for n in 1..=50 {
                    black_box(sim.tick(n * TICK_INTERVAL_MS));
                }
                sim
            },
            criterion::BatchSize::SmallInput,
        );
    });

    c.bench_function("state_hash", |b| {
        let sim = full_field();
        b.iter(|| black_box(sim.state_hash()));
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
