//! `RoleEngine` — the single entry point for the role closure engine.
//!
//! Wraps `DatabaseManager` (read/write routing) and exposes the closure
//! operations and the query surface as one coherent API. All
//! reads go through `with_reader`, all writes through `with_writer`; no code
//! outside this module and `closure`/`queries` should touch a raw
//! `&Connection`.
//!
//! Pattern reference: the teacher's `DriftStorageEngine`.

use std::collections::HashSet;
use std::path::Path;

use role_core::errors::{EngineError, StoreError};
use role_core::types::{Accessor, RoleId, RoleRow};
use role_core::EngineConfig;

use crate::closure::{self, BatchingGuard};
use crate::connection::DatabaseManager;
use crate::queries;

/// The role closure engine.
pub struct RoleEngine {
    db: DatabaseManager,
    config: EngineConfig,
}

impl RoleEngine {
    /// Open a file-backed engine at `path`, running migrations.
    pub fn open(path: &Path, config: EngineConfig) -> Result<Self, EngineError> {
        let db = DatabaseManager::open(path, &config)?;
        Ok(Self { db, config })
    }

    /// Open an in-memory engine (tests, ephemeral tooling).
    pub fn open_in_memory(config: EngineConfig) -> Result<Self, EngineError> {
        let db = DatabaseManager::open_in_memory(&config)?;
        Ok(Self { db, config })
    }

    /// Database file path (`None` for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.db.path()
    }

    /// WAL checkpoint delegation.
    pub fn checkpoint(&self) -> Result<(), EngineError> {
        Ok(self.db.checkpoint()?)
    }

    // ─── Closure engine ───────────────────────────────────────────────

    /// The role set is potentially stale; rebuild now, or defer if a
    /// batching context is active.
    pub fn on_role_mutated(&self, role_ids: &[RoleId]) -> Result<(), EngineError> {
        let ids: Vec<i64> = role_ids.iter().map(|r| r.0).collect();
        closure::on_role_mutated(&self.db, &ids, &self.config)
    }

    /// Recovery path: rebuilds every role's closure from scratch.
    pub fn rebuild_all(&self) -> Result<(), EngineError> {
        closure::rebuild_all(&self.db, &self.config)
    }

    /// Scoped acquisition of the batching context. Call
    /// [`BatchingGuard::finish`] on the normal exit path to surface the
    /// deferred rebuild's outcome.
    pub fn batching(&self, allow_nesting: bool) -> Result<BatchingGuard<'_>, EngineError> {
        BatchingGuard::enter(&self.db, self.config.clone(), allow_nesting)
    }

    // ─── Role/parent mutation (owned by the engine's caller in the
    // surrounding application's data model, but exposed here since
    // `roles`/`parents` need *some* writer and the engine already owns the
    // connection) ────────────────────────────────────────────────────

    /// Create a role and give it its self-ancestor row.
    pub fn create_role(
        &self,
        role_field: &str,
        content_type: Option<i64>,
        object_id: Option<i64>,
        implicit_parents: &str,
    ) -> Result<RoleId, EngineError> {
        let id = self
            .db
            .with_writer(|conn| queries::roles::insert_role(conn, role_field, content_type, object_id, implicit_parents))?;
        self.on_role_mutated(&[id])?;
        Ok(id)
    }

    /// Delete a role. Cascades to `parents`/`ancestors`; does not need a
    /// rebuild of its own since the cascaded rows are simply gone, but any
    /// former children still need theirs recomputed.
    pub fn delete_role(&self, id: RoleId) -> Result<(), EngineError> {
        let children = self.db.with_writer(|conn| queries::parents::children_of(conn, id))?;
        self.db.with_writer(|conn| queries::roles::delete_role(conn, id))?;
        if !children.is_empty() {
            self.on_role_mutated(&children)?;
        }
        Ok(())
    }

    /// Attach a parent edge and rebuild the affected closure.
    pub fn attach_parent(&self, from_role: RoleId, to_role: RoleId) -> Result<(), EngineError> {
        self.db.with_writer(|conn| queries::parents::attach(conn, from_role, to_role))?;
        self.on_role_mutated(&[from_role])
    }

    /// Detach a parent edge and rebuild the affected closure.
    pub fn detach_parent(&self, from_role: RoleId, to_role: RoleId) -> Result<(), EngineError> {
        self.db.with_writer(|conn| queries::parents::detach(conn, from_role, to_role))?;
        self.on_role_mutated(&[from_role])
    }

    // ─── Query surface ──────────────────────────────────────────────

    /// Does `role`'s closure include any role owned by `accessor`?
    pub fn role_contains(
        &self,
        role: RoleId,
        accessor: Accessor,
        member_of: &dyn Fn(i64) -> Result<Vec<i64>, EngineError>,
    ) -> Result<bool, EngineError> {
        run_reader(&self.db, |conn| queries::surface::role_contains(conn, role, accessor, member_of))
    }

    /// `roles_on_resource(resource, accessor)`.
    pub fn roles_on_resource(
        &self,
        content_type: i64,
        object_id: i64,
        accessor: Accessor,
        member_of: &dyn Fn(i64) -> Result<Vec<i64>, EngineError>,
    ) -> Result<HashSet<String>, EngineError> {
        run_reader(&self.db, |conn| {
            queries::surface::roles_on_resource(conn, content_type, object_id, accessor, member_of)
        })
    }

    /// `visible_roles(principal)`.
    pub fn visible_roles(
        &self,
        principal: i64,
        member_of: &dyn Fn(i64) -> Result<Vec<i64>, EngineError>,
    ) -> Result<HashSet<RoleId>, EngineError> {
        run_reader(&self.db, |conn| queries::surface::visible_roles(conn, principal, member_of))
    }

    /// `singleton(name)`: returns the role with matching `singleton_name`,
    /// creating one (and its self-ancestor row) if absent.
    pub fn singleton(&self, name: &str) -> Result<RoleRow, EngineError> {
        let (role, created) = self.db.with_writer(|conn| queries::surface::singleton(conn, name))?;
        if created {
            self.on_role_mutated(&[role.id])?;
        }
        Ok(role)
    }

    /// `is_ancestor_of(R, R')`.
    pub fn is_ancestor_of(&self, r: RoleId, r_prime: RoleId) -> Result<bool, EngineError> {
        run_reader(&self.db, |conn| queries::surface::is_ancestor_of(conn, r, r_prime))
    }

    /// The full materialized ancestor set of `role`, including itself.
    /// Mainly useful for diagnostics and tests against the closure invariants.
    pub fn ancestors_of(&self, role: RoleId) -> Result<Vec<RoleId>, EngineError> {
        Ok(self.db.with_reader(|conn| queries::ancestors::ancestors_of(conn, role))?)
    }

    // ─── Escape hatches ──────────────────────────────────────────────

    /// Raw read access, for callers that need something outside the query
    /// surface above.
    pub fn with_reader<F, T>(&self, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, StoreError>,
    {
        Ok(self.db.with_reader(f)?)
    }

    /// Raw write access, for callers that need something outside the API
    /// above. Does not trigger a rebuild — call `on_role_mutated` yourself.
    pub fn with_writer<F, T>(&self, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, StoreError>,
    {
        Ok(self.db.with_writer(f)?)
    }
}

/// Runs `f` against a pooled read connection, flattening the
/// connection-level `StoreError` and the query-level `EngineError` into
/// one `Result`.
fn run_reader<F, T>(db: &DatabaseManager, f: F) -> Result<T, EngineError>
where
    F: FnOnce(&rusqlite::Connection) -> Result<T, EngineError>,
{
    let captured: Result<Result<T, EngineError>, StoreError> = db.with_reader(|conn| Ok(f(conn)));
    match captured {
        Ok(inner) => inner,
        Err(store_err) => Err(EngineError::Store(store_err)),
    }
}
