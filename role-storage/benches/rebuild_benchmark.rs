//! Layered-rebuild throughput: confirms the batched path does meaningfully
//! fewer store round-trips than rebuilding one role at a time (§8 scenario 5).

use criterion::{criterion_group, criterion_main, Criterion};

use role_core::EngineConfig;
use role_storage::RoleEngine;

fn seed_chain(engine: &RoleEngine, depth: usize) -> Vec<role_core::types::RoleId> {
    let roles: Vec<_> = (0..depth)
        .map(|i| engine.create_role(&format!("r{i}"), None, None, "[]").unwrap())
        .collect();
    for pair in roles.windows(2) {
        engine.attach_parent(pair[0], pair[1]).unwrap();
    }
    roles
}

fn bench_unbatched_vs_batched(c: &mut Criterion) {
    c.bench_function("rebuild_chain_unbatched_200", |b| {
        b.iter(|| {
            let engine = RoleEngine::open_in_memory(EngineConfig::default()).unwrap();
            seed_chain(&engine, 200);
        });
    });

    c.bench_function("rebuild_chain_batched_200", |b| {
        b.iter(|| {
            let engine = RoleEngine::open_in_memory(EngineConfig::default()).unwrap();
            let guard = engine.batching(false).unwrap();
            seed_chain(&engine, 200);
            guard.finish().unwrap();
        });
    });

    c.bench_function("rebuild_all_chain_200", |b| {
        let engine = RoleEngine::open_in_memory(EngineConfig::default()).unwrap();
        seed_chain(&engine, 200);
        b.iter(|| engine.rebuild_all().unwrap());
    });
}

criterion_group!(benches, bench_unbatched_vs_batched);
criterion_main!(benches);
