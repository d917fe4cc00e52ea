//! Criterion micro-benchmarks for topology and neighborhood operations.

use std::hint::black_box;

use cellua_core::CellState;
use cellua_grid::GridStore;
use cellua_rule::NeighborhoodResolver;
use cellua_space::{BoundaryPolicy, NeighborhoodShape, ShapeLimits, SymmetryGroup, Topology};
use criterion::{criterion_group, criterion_main, Criterion};
use smallvec::smallvec;

/// Benchmark: canonicalize 10K coordinates on a Klein bottle.
fn bench_canonicalize_klein(c: &mut Criterion) {
    let topology = Topology::new(vec![
        BoundaryPolicy::looped_reflecting(0, 99, 1),
        BoundaryPolicy::looped(0, 99),
    ])
    .unwrap();

    c.bench_function("canonicalize_klein_10k", |b| {
        b.iter(|| {
            for x in -50i64..50 {
                for y in -50i64..50 {
                    black_box(topology.canonicalize(&[x * 3, y * 7]));
                }
            }
        });
    });
}

/// Benchmark: resolve Moore neighborhoods of a 100×100 block on a torus.
fn bench_resolve_moore_10k(c: &mut Criterion) {
    let topology = Topology::new(vec![BoundaryPolicy::looped(0, 99); 2]).unwrap();
    let resolver =
        NeighborhoodResolver::new(topology, &NeighborhoodShape::moore(1), &ShapeLimits::default())
            .unwrap();
    let mut grid = GridStore::new(2);
    for i in 0..2_000i64 {
        grid.set(smallvec![(i * 37) % 100, (i * 53) % 100], 1);
    }

    c.bench_function("resolve_moore_10k", |b| {
        let mut out: Vec<CellState> = Vec::with_capacity(8);
        b.iter(|| {
            for x in 0..100i64 {
                for y in 0..100i64 {
                    black_box(resolver.resolve_into(&[x, y], &grid, &mut out));
                }
            }
        });
    });
}

/// Benchmark: compile a fully symmetric 3D range-2 shape.
fn bench_compile_symmetric_shape(c: &mut Criterion) {
    let shape = NeighborhoodShape::moore(2).with_symmetry(SymmetryGroup::Full);
    c.bench_function("compile_moore2_3d_full", |b| {
        b.iter(|| black_box(shape.compile(3, &ShapeLimits::default()).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_canonicalize_klein,
    bench_resolve_moore_10k,
    bench_compile_symmetric_shape
);
criterion_main!(benches);
