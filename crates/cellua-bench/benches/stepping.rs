//! Criterion benchmarks for whole-generation stepping.

use std::hint::black_box;

use cellua_bench::{life_soup, soup_3d};
use cellua_engine::{CacheConfig, EngineConfig};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

fn sequential() -> EngineConfig {
    EngineConfig {
        worker_count: Some(1),
        ..EngineConfig::default()
    }
}

/// Benchmark: one Life generation on a 128×128 torus, cache on.
fn bench_life_step_cached(c: &mut Criterion) {
    c.bench_function("life_128_step_cached", |b| {
        b.iter_batched(
            || life_soup(7, sequential()),
            |mut u| black_box(u.step(1, None).unwrap()),
            BatchSize::LargeInput,
        );
    });
}

/// Benchmark: the same generation with the transition cache off.
fn bench_life_step_uncached(c: &mut Criterion) {
    let engine = EngineConfig {
        cache: CacheConfig::disabled(),
        ..sequential()
    };
    c.bench_function("life_128_step_uncached", |b| {
        b.iter_batched(
            || life_soup(7, engine.clone()),
            |mut u| black_box(u.step(1, None).unwrap()),
            BatchSize::LargeInput,
        );
    });
}

/// Benchmark: 3D soup, sequential vs four workers.
fn bench_soup_3d_workers(c: &mut Criterion) {
    let mut group = c.benchmark_group("soup_3d_step");
    for workers in [1usize, 4] {
        let engine = EngineConfig {
            worker_count: Some(workers),
            parallel_threshold: 1024,
            ..EngineConfig::default()
        };
        group.bench_function(format!("workers_{workers}"), |b| {
            b.iter_batched(
                || soup_3d(11, engine.clone()),
                |mut u| black_box(u.step(1, None).unwrap()),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_life_step_cached,
    bench_life_step_uncached,
    bench_soup_3d_workers
);
criterion_main!(benches);
