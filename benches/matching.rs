use criterion::{criterion_group, criterion_main, Criterion};
use sphpsm_core::genome::synthetic::{owner_genome, query_genome};
use sphpsm_core::protocol::{DataOwner, MarkerBuilder, MatchingEngine, MatchingMode};
use sphpsm_core::{Bn254ElGamal, PublicScheme, SecretScheme, Universe};
use std::sync::Arc;

fn bench_matching(c: &mut Criterion) {
    let scheme = Arc::new(Bn254ElGamal::setup().unwrap());
    let universe = Universe::new(1000).unwrap();
    let owner = DataOwner::new(scheme.clone(), universe, owner_genome(64, 20, 27, false)).unwrap();

    c.bench_function("build_range_chain_64", |b| {
        b.iter(|| owner.build_range().unwrap())
    });

    let chain = owner.build_range().unwrap();
    let window = chain.full_window().unwrap();
    let public = PublicScheme::new(scheme.clone());
    let marker = MarkerBuilder::new(&public, universe, 0)
        .build(&query_genome(20, 27, false))
        .unwrap();
    let engine = MatchingEngine::new(&public);

    c.bench_function("match_window_64x8_unoptimized", |b| {
        b.iter(|| {
            engine
                .match_window(&window.ciphers, marker.ciphers(), MatchingMode::Unoptimized)
                .unwrap()
        })
    });

    c.bench_function("match_window_64x8_incremental", |b| {
        b.iter(|| {
            engine
                .match_window(&window.ciphers, marker.ciphers(), MatchingMode::Incremental)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_matching);
criterion_main!(benches);
