//! Criterion benchmarks for image encoding, decoding and hashing.

use std::hint::black_box;

use cellua_bench::life_soup;
use cellua_engine::EngineConfig;
use cellua_persist::{decode_image, encode_image, universe_hash, UniverseImage};
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_encode_decode(c: &mut Criterion) {
    let universe = life_soup(3, EngineConfig::default());
    let image = UniverseImage::capture(&universe);
    let mut bytes = Vec::new();
    encode_image(&mut bytes, &image).unwrap();

    c.bench_function("encode_life_128", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(bytes.len());
            encode_image(&mut out, &image).unwrap();
            black_box(out)
        });
    });
    c.bench_function("decode_life_128", |b| {
        b.iter(|| black_box(decode_image(&mut bytes.as_slice()).unwrap()));
    });
    c.bench_function("hash_life_128", |b| {
        b.iter(|| black_box(universe_hash(&universe)));
    });
}

criterion_group!(benches, bench_encode_decode);
criterion_main!(benches);
