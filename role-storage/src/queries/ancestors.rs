//! Low-level reads over the materialized `ancestors` table. The closure
//! engine (`crate::closure`) is the only writer; everything here is
//! read-only, backed by the two composite indexes the schema defines.

use rusqlite::{params, params_from_iter, Connection, Row};

use role_core::errors::StoreError;
use role_core::types::RoleId;

use crate::util::{in_clause, sqe};

/// True iff `(descendent, ancestor)` is a materialized ancestor pair.
pub fn exists(conn: &Connection, descendent: RoleId, ancestor: RoleId) -> Result<bool, StoreError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM ancestors WHERE descendent = ?1 AND ancestor = ?2)",
        params![descendent.0, ancestor.0],
        |row| row.get(0),
    )
    .map_err(sqe)
}

/// True iff `descendent` has any ancestor row whose `ancestor` is in `candidates`.
pub fn any_ancestor_in(
    conn: &Connection,
    descendent: RoleId,
    candidates: &[RoleId],
) -> Result<bool, StoreError> {
    if candidates.is_empty() {
        return Ok(false);
    }
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM ancestors WHERE descendent = ? AND ancestor IN ({}))",
        in_clause(candidates.len())
    );
    let mut params: Vec<i64> = Vec::with_capacity(candidates.len() + 1);
    params.push(descendent.0);
    params.extend(candidates.iter().map(|r| r.0));
    conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))
        .map_err(sqe)
}

/// Distinct `role_field` values among ancestor rows where `ancestor` is one
/// of `owned` and `(content_type, object_id)` match the resource. Backed by
/// `idx_ancestors_object`.
pub fn role_fields_on_resource(
    conn: &Connection,
    owned: &[RoleId],
    content_type: i64,
    object_id: i64,
) -> Result<Vec<String>, StoreError> {
    if owned.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT DISTINCT role_field FROM ancestors
         WHERE ancestor IN ({}) AND content_type = ? AND object_id = ?",
        in_clause(owned.len())
    );
    let mut params: Vec<rusqlite::types::Value> =
        owned.iter().map(|r| rusqlite::types::Value::Integer(r.0)).collect();
    params.push(rusqlite::types::Value::Integer(content_type));
    params.push(rusqlite::types::Value::Integer(object_id));

    let mut stmt = conn.prepare_cached(&sql).map_err(sqe)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), |row| row.get::<_, String>(0))
        .map_err(sqe)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(sqe)?);
    }
    Ok(out)
}

/// Ancestors of `role` (roles it inherits from, including itself).
pub fn ancestors_of(conn: &Connection, role: RoleId) -> Result<Vec<RoleId>, StoreError> {
    let mut stmt = conn
        .prepare_cached("SELECT ancestor FROM ancestors WHERE descendent = ?1")
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![role.0], |row| row.get::<_, i64>(0))
        .map_err(sqe)?;
    collect(rows)
}

/// Descendents of `role` (roles that inherit from it, including itself).
pub fn descendents_of(conn: &Connection, role: RoleId) -> Result<Vec<RoleId>, StoreError> {
    let mut stmt = conn
        .prepare_cached("SELECT descendent FROM ancestors WHERE ancestor = ?1")
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
