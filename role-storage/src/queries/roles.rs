//! CRUD over the `roles` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use role_core::errors::StoreError;
use role_core::types::{RoleId, RoleRow};

use crate::util::sqe;

/// Create a role row. The caller is responsible for triggering a closure
/// rebuild afterwards (every role needs its self-ancestor row) — this
/// function only touches `roles`.
pub fn insert_role(
    conn: &Connection,
    role_field: &str,
    content_type: Option<i64>,
    object_id: Option<i64>,
    implicit_parents: &str,
) -> Result<RoleId, StoreError> {
    conn.execute(
        "INSERT INTO roles (role_field, content_type, object_id, implicit_parents)
         VALUES (?1, ?2, ?3, ?4)",
        params![role_field, content_type, object_id, implicit_parents],
    )
    .map_err(sqe)?;
    Ok(RoleId(conn.last_insert_rowid()))
}

/// Fetch a role by id, or `None` if it doesn't exist.
pub fn get_role(conn: &Connection, id: RoleId) -> Result<Option<RoleRow>, StoreError> {
    conn.prepare_cached(
        "SELECT id, role_field, content_type, object_id, singleton_name, implicit_parents
         FROM roles WHERE id = ?1",
    )
    .map_err(sqe)?
    .query_row(params![id.0], map_role_row)
    .optional()
    .map_err(sqe)
}

/// Delete a role. Cascades to `parents` and `ancestors` rows via the
/// schema's `ON DELETE CASCADE` foreign keys.
pub fn delete_role(conn: &Connection, id: RoleId) -> Result<usize, StoreError> {
    conn.execute("DELETE FROM roles WHERE id = ?1", params![id.0])
        .map_err(sqe)
}

/// All role ids currently in the store — used by `rebuild_all`.
pub fn all_ids(conn: &Connection) -> Result<Vec<RoleId>, StoreError> {
    let mut stmt = conn.prepare_cached("SELECT id FROM roles").map_err(sqe)?;
    let rows = stmt
        .query_map([], |row| row.get::<_, i64>(0))
        .map_err(sqe)?;
    collect_ids(rows)
}

/// Role ids bound to a given domain object (`Accessor::Object` dispatch).
pub fn ids_bound_to_object(
    conn: &Connection,
    content_type: i64,
    object_id: i64,
) -> Result<Vec<RoleId>, StoreError> {
    let mut stmt = conn
        .prepare_cached("SELECT id FROM roles WHERE content_type = ?1 AND object_id = ?2")
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![content_type, object_id], |row| row.get::<_, i64>(0))
        .map_err(sqe)?;
    collect_ids(rows)
}

fn collect_ids(
    rows: rusqlite::MappedRows<'_, impl FnMut(&Row<'_>) -> rusqlite::Result<i64>>,
) -> Result<Vec<RoleId>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(RoleId(row.map_err(sqe)?));
    }
    Ok(out)
}

fn map_role_row(row: &Row<'_>) -> rusqlite::Result<RoleRow> {
    Ok(RoleRow {
        id: RoleId(row.get(0)?),
        role_field: row.get(1)?,
        content_type: row.get(2)?,
        object_id: row.get(3)?,
        singleton_name: row.get(4)?,
        implicit_parents: row.get(5)?,
    })
}
