//! CRUD over the `parents` table (role-role inheritance edges).

use rusqlite::{params, Connection, Row};

use role_core::errors::StoreError;
use role_core::types::RoleId;

use crate::util::sqe;

/// Attach a parent edge `from_role -> to_role`. Idempotent: attaching an
/// edge that already exists is a no-op. Does not trigger a rebuild — the
/// caller is responsible for calling `on_role_mutated(&[from_role])`.
pub fn attach(conn: &Connection, from_role: RoleId, to_role: RoleId) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR IGNORE INTO parents (from_role, to_role) VALUES (?1, ?2)",
        params![from_role.0, to_role.0],
    )
    .map_err(sqe)?;
    Ok(())
}

/// Detach a parent edge. No-op if it doesn't exist.
pub fn detach(conn: &Connection, from_role: RoleId, to_role: RoleId) -> Result<usize, StoreError> {
    conn.execute(
        "DELETE FROM parents WHERE from_role = ?1 AND to_role = ?2",
        params![from_role.0, to_role.0],
    )
    .map_err(sqe)
}

/// Direct parents of `role`.
pub fn parents_of(conn: &Connection, role: RoleId) -> Result<Vec<RoleId>, StoreError> {
    let mut stmt = conn
        .prepare_cached("SELECT to_role FROM parents WHERE from_role = ?1")
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![role.0], |row| row.get::<_, i64>(0))
        .map_err(sqe)?;
    collect(rows)
}

/// Direct children of `role` (roles that list it as a parent).
pub fn children_of(conn: &Connection, role: RoleId) -> Result<Vec<RoleId>, StoreError> {
    let mut stmt = conn
        .prepare_cached("SELECT from_role FROM parents WHERE to_role = ?1")
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![role.0], |row| row.get::<_, i64>(0))
        .map_err(sqe)?;
    collect(rows)
}

fn collect(
    rows: rusqlite::MappedRows<'_, impl FnMut(&Row<'_>) -> rusqlite::Result<i64>>,
) -> Result<Vec<RoleId>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(RoleId(row.map_err(sqe)?));
    }
    Ok(out)
}
