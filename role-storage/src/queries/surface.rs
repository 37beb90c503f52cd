//! The read-only query surface: `role_contains`, `roles_on_resource`,
//! `visible_roles`, `singleton`, `is_ancestor_of`.
//!
//! Grounded on the original's `Role.__contains__`, `get_roles_on_resource`,
//! `Role.visible_roles`, `Role.singleton`, `Role.is_ancestor_of`. The
//! polymorphic dispatch those methods each re-implement is factored into
//! one shared `owned_role_ids` helper, so `role_contains` and
//! `roles_on_resource` share one code path instead of duplicating the
//! `isinstance`-style branch.

use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension};

use role_core::errors::{EngineError, StoreError};
use role_core::types::{Accessor, RoleId, RoleRow};

use super::{ancestors, roles};
use crate::util::sqe;

/// Resolves an [`Accessor`] to the set of role ids it directly owns.
///
/// `member_of(principal_id)` must return the role ids that principal
/// directly holds — principal/membership semantics are an external-
/// application concern, so this crate never assumes a schema for them.
fn owned_role_ids(
    conn: &Connection,
    accessor: Accessor,
    member_of: &dyn Fn(i64) -> Result<Vec<i64>, EngineError>,
) -> Result<Vec<RoleId>, EngineError> {
    match accessor {
        Accessor::Principal(user_id) => Ok(member_of(user_id)?.into_iter().map(RoleId).collect()),
        Accessor::Role(role_id) => Ok(vec![role_id]),
        Accessor::Group { member_role } => Ok(vec![member_role]),
        Accessor::Object {
            content_type,
            object_id,
        } => Ok(roles::ids_bound_to_object(conn, content_type, object_id)?),
    }
}

/// Does `role`'s closure include any role owned by `accessor`?
pub fn role_contains(
    conn: &Connection,
    role: RoleId,
    accessor: Accessor,
    member_of: &dyn Fn(i64) -> Result<Vec<i64>, EngineError>,
) -> Result<bool, EngineError> {
    let owned = owned_role_ids(conn, accessor, member_of)?;
    Ok(ancestors::any_ancestor_in(conn, role, &owned)?)
}

/// The distinct `role_field`s that `accessor` holds on
/// `(content_type, object_id)`.
pub fn roles_on_resource(
    conn: &Connection,
    content_type: i64,
    object_id: i64,
    accessor: Accessor,
    member_of: &dyn Fn(i64) -> Result<Vec<i64>, EngineError>,
) -> Result<HashSet<String>, EngineError> {
    let owned = owned_role_ids(conn, accessor, member_of)?;
    let fields = ancestors::role_fields_on_resource(conn, &owned, content_type, object_id)?;
    Ok(fields.into_iter().collect())
}

/// Every role that is either an ancestor or a descendent of any role the
/// principal directly holds.
pub fn visible_roles(
    conn: &Connection,
    principal: i64,
    member_of: &dyn Fn(i64) -> Result<Vec<i64>, EngineError>,
) -> Result<HashSet<RoleId>, EngineError> {
    let held: Vec<RoleId> = member_of(principal)?.into_iter().map(RoleId).collect();
    let mut visible = HashSet::new();
    for role in held {
        visible.extend(ancestors::ancestors_of(conn, role)?);
        visible.extend(ancestors::descendents_of(conn, role)?);
    }
    Ok(visible)
}

/// Returns the role with matching `singleton_name`, creating one if absent.
/// Never fails on lookup-miss. Returns whether a new row was created so the
/// caller can trigger the closure rebuild that gives every role its
/// self-ancestor row — this function touches only `roles`.
pub fn singleton(conn: &Connection, name: &str) -> Result<(RoleRow, bool), StoreError> {
    let existing = conn
        .prepare_cached(
            "SELECT id, role_field, content_type, object_id, singleton_name, implicit_parents
             FROM roles WHERE singleton_name = ?1",
        )
        .map_err(sqe)?
        .query_row(params![name], |row| {
            Ok(RoleRow {
                id: RoleId(row.get(0)?),
                role_field: row.get(1)?,
                content_type: row.get(2)?,
                object_id: row.get(3)?,
                singleton_name: row.get(4)?,
                implicit_parents: row.get(5)?,
            })
        })
        .optional()
        .map_err(sqe)?;

    if let Some(role) = existing {
        return Ok((role, false));
    }

    conn.execute(
        "INSERT INTO roles (role_field, singleton_name, implicit_parents) VALUES (?1, ?1, '[]')",
        params![name],
    )
    .map_err(sqe)?;
    let id = RoleId(conn.last_insert_rowid());

    Ok((
        RoleRow {
            id,
            role_field: name.to_string(),
            content_type: None,
            object_id: None,
            singleton_name: Some(name.to_string()),
            implicit_parents: "[]".to_string(),
        },
        true,
    ))
}

/// True iff ancestor row `(r_prime, r)` exists.
pub fn is_ancestor_of(conn: &Connection, r: RoleId, r_prime: RoleId) -> Result<bool, EngineError> {
    Ok(ancestors::exists(conn, r_prime, r)?)
}
