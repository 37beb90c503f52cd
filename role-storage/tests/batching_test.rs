//! Batching context scenarios — §4.3.3, §8 scenario 5, and the nesting
//! error contract from §7.

use std::collections::HashSet;

use role_core::EngineConfig;
use role_storage::RoleEngine;

#[test]
fn batch_defers_until_commit() {
    let engine = RoleEngine::open_in_memory(EngineConfig::default()).unwrap();

    let guard = engine.batching(false).unwrap();
    let a = engine.create_role("a", None, None, "[]").unwrap();
    let b = engine.create_role("b", None, None, "[]").unwrap();
    let c = engine.create_role("c", None, None, "[]").unwrap();
    engine.attach_parent(a, b).unwrap();
    engine.attach_parent(b, c).unwrap();

    // Closure is stale while the batch is open (warning contract, §4.3.3):
    // roles were created but their self-rows haven't been committed yet.
    assert!(engine.ancestors_of(a).unwrap().is_empty());

    guard.finish().unwrap();

    let ancestors: HashSet<i64> = engine.ancestors_of(a).unwrap().into_iter().map(|r| r.0).collect();
    assert_eq!(ancestors, HashSet::from([a.0, b.0, c.0]));
}

#[test]
fn nested_batching_without_allow_nesting_errors() {
    let engine = RoleEngine::open_in_memory(EngineConfig::default()).unwrap();
    let _outer = engine.batching(false).unwrap();
    let inner = engine.batching(false);
    assert!(matches!(inner, Err(role_core::errors::EngineError::Nesting)));
}

#[test]
fn nested_batching_with_allow_nesting_is_a_noop() {
    let engine = RoleEngine::open_in_memory(EngineConfig::default()).unwrap();

    let outer = engine.batching(true).unwrap();
    let a = engine.create_role("a", None, None, "[]").unwrap();
    {
        let inner = engine.batching(true).unwrap();
        let b = engine.create_role("b", None, None, "[]").unwrap();
        engine.attach_parent(a, b).unwrap();
        inner.finish().unwrap();
        // Inner guard's exit neither cleared the flag nor rebuilt.
        assert!(engine.ancestors_of(a).unwrap().is_empty());
    }
    outer.finish().unwrap();

    assert_eq!(engine.ancestors_of(a).unwrap().len(), 2);
}
