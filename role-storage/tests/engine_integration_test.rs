//! End-to-end scenarios from §8: chain, diamond, cycle, remove-edge.

use std::collections::HashSet;

use role_core::types::RoleId;
use role_core::EngineConfig;
use role_storage::RoleEngine;

fn ancestor_set(engine: &RoleEngine, role: RoleId) -> HashSet<i64> {
    engine
        .ancestors_of(role)
        .unwrap()
        .into_iter()
        .map(|r| r.0)
        .collect()
}

#[test]
fn chain_a_b_c() {
    let engine = RoleEngine::open_in_memory(EngineConfig::default()).unwrap();

    let a = engine.create_role("a", None, None, "[]").unwrap();
    let b = engine.create_role("b", None, None, "[]").unwrap();
    let c = engine.create_role("c", None, None, "[]").unwrap();

    engine.attach_parent(a, b).unwrap();
    engine.attach_parent(b, c).unwrap();

    assert_eq!(ancestor_set(&engine, a), HashSet::from([a.0, b.0, c.0]));
    assert_eq!(ancestor_set(&engine, b), HashSet::from([b.0, c.0]));
    assert_eq!(ancestor_set(&engine, c), HashSet::from([c.0]));
}

#[test]
fn diamond_no_duplicates() {
    let engine = RoleEngine::open_in_memory(EngineConfig::default()).unwrap();

    let a = engine.create_role("a", None, None, "[]").unwrap();
    let b = engine.create_role("b", None, None, "[]").unwrap();
    let c = engine.create_role("c", None, None, "[]").unwrap();
    let d = engine.create_role("d", None, None, "[]").unwrap();

    engine.attach_parent(a, b).unwrap();
    engine.attach_parent(a, c).unwrap();
    engine.attach_parent(b, d).unwrap();
    engine.attach_parent(c, d).unwrap();

    let ancestors = engine.ancestors_of(a).unwrap();
    assert_eq!(ancestors.len(), 4, "no duplicate (descendent, ancestor) pairs");
    assert_eq!(
        ancestors.into_iter().map(|r| r.0).collect::<HashSet<_>>(),
        HashSet::from([a.0, b.0, c.0, d.0])
    );
}

#[test]
fn cycle_converges() {
    let engine = RoleEngine::open_in_memory(EngineConfig::default()).unwrap();

    let a = engine.create_role("a", None, None, "[]").unwrap();
    let b = engine.create_role("b", None, None, "[]").unwrap();
    let c = engine.create_role("c", None, None, "[]").unwrap();

    engine.attach_parent(a, b).unwrap();
    engine.attach_parent(b, c).unwrap();
    engine.attach_parent(c, a).unwrap();

    let full = HashSet::from([a.0, b.0, c.0]);
    assert_eq!(ancestor_set(&engine, a), full);
    assert_eq!(ancestor_set(&engine, b), full);
    assert_eq!(ancestor_set(&engine, c), full);
}

#[test]
fn remove_edge_shrinks_only_the_affected_role() {
    let engine = RoleEngine::open_in_memory(EngineConfig::default()).unwrap();

    let a = engine.create_role("a", None, None, "[]").unwrap();
    let b = engine.create_role("b", None, None, "[]").unwrap();
    let c = engine.create_role("c", None, None, "[]").unwrap();

    engine.attach_parent(a, b).unwrap();
    engine.attach_parent(b, c).unwrap();

    engine.detach_parent(a, b).unwrap();

    assert_eq!(ancestor_set(&engine, a), HashSet::from([a.0]));
    assert_eq!(ancestor_set(&engine, b), HashSet::from([b.0, c.0]));
    assert_eq!(ancestor_set(&engine, c), HashSet::from([c.0]));
}

#[test]
fn idempotence_of_on_role_mutated() {
    let engine = RoleEngine::open_in_memory(EngineConfig::default()).unwrap();
    let a = engine.create_role("a", None, None, "[]").unwrap();
    let b = engine.create_role("b", None, None, "[]").unwrap();
    engine.attach_parent(a, b).unwrap();

    let before = ancestor_set(&engine, a);
    engine.on_role_mutated(&[a]).unwrap();
    engine.on_role_mutated(&[a]).unwrap();
    assert_eq!(ancestor_set(&engine, a), before);
}

#[test]
fn rebuild_all_recovers_from_a_blank_closure() {
    let engine = RoleEngine::open_in_memory(EngineConfig::default()).unwrap();
    let a = engine.create_role("a", None, None, "[]").unwrap();
    let b = engine.create_role("b", None, None, "[]").unwrap();
    engine.attach_parent(a, b).unwrap();

    engine.with_writer(|conn| conn.execute("DELETE FROM ancestors", []).map(|_| ())
        .map_err(|e| role_core::errors::StoreError::Sqlite { message: e.to_string() })).unwrap();
    assert!(engine.ancestors_of(a).unwrap().is_empty());

    engine.rebuild_all().unwrap();
    assert_eq!(ancestor_set(&engine, a), HashSet::from([a.0, b.0]));
}
