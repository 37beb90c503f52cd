//! Property test for the order-independence-of-batched-edits law (§8):
//! any permutation of edge additions inside one batch produces the same
//! post-commit closure.

use std::collections::HashSet;

use proptest::prelude::*;
use role_core::EngineConfig;
use role_storage::RoleEngine;

/// A small fixed DAG's edges, shuffled by proptest, applied inside a batch.
fn closure_after_batched_edges(edges: &[(usize, usize)]) -> Vec<HashSet<i64>> {
    let engine = RoleEngine::open_in_memory(EngineConfig::default()).unwrap();
    let roles: Vec<_> = (0..5)
        .map(|i| engine.create_role(&format!("r{i}"), None, None, "[]").unwrap())
        .collect();

    let guard = engine.batching(false).unwrap();
    for &(from, to) in edges {
        engine.attach_parent(roles[from], roles[to]).unwrap();
    }
    guard.finish().unwrap();

    roles
        .iter()
        .map(|r| engine.ancestors_of(*r).unwrap().into_iter().map(|a| a.0).collect())
        .collect()
}

proptest! {
    #[test]
    fn permuting_batched_edges_yields_the_same_closure(seed in any::<u64>()) {
        // A fixed edge set on a 5-node DAG: 0->1, 1->2, 0->3, 3->2, 2->4.
        let base: Vec<(usize, usize)> = vec![(0, 1), (1, 2), (0, 3), (3, 2), (2, 4)];

        let mut shuffled = base.clone();
        // Deterministic shuffle from the proptest-supplied seed — no
        // wall-clock/thread-rng dependency.
        let mut state = seed;
        for i in (1..shuffled.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let j = (state >> 33) as usize % (i + 1);
            shuffled.swap(i, j);
        }

        let baseline = closure_after_batched_edges(&base);
        let permuted = closure_after_batched_edges(&shuffled);
        prop_assert_eq!(baseline, permuted);
    }
}
