//! Shared data types for the role closure engine.

use serde::{Deserialize, Serialize};

/// Opaque role identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(pub i64);

impl From<i64> for RoleId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RoleId> for i64 {
    fn from(id: RoleId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A role row as stored in `roles`.
///
/// `content_type`/`object_id` are `None` together or `Some` together;
/// `NULL` is stored on disk but normalized to `0` in `ancestors` rows per
/// the denormalization invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRow {
    pub id: RoleId,
    pub role_field: String,
    pub content_type: Option<i64>,
    pub object_id: Option<i64>,
    pub singleton_name: Option<String>,
    pub implicit_parents: String,
}

/// A directed parent edge: `from_role` inherits from `to_role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentEdge {
    pub from_role: RoleId,
    pub to_role: RoleId,
}

/// A materialized row of the ancestor closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorRow {
    pub descendent: RoleId,
    pub ancestor: RoleId,
    pub role_field: String,
    pub content_type: i64,
    pub object_id: i64,
}

/// Anything that can hold roles: a principal, a role itself, a group-like
/// entity (resolved to its member role), or a domain object bound by
/// `(content_type, object_id)`.
///
/// A tagged variant rather than the original's `isinstance` chain, so the
/// dispatch in `queries::surface::owned_role_ids` is one exhaustive match
/// instead of a type-check cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    /// A principal (user) identified by an opaque id. Resolving "which
    /// roles does this principal directly hold" is the caller's
    /// responsibility — principal/membership semantics live in the
    /// surrounding application — see `member_of` callbacks on the query
    /// surface.
    Principal(i64),
    /// A role, used directly as the accessor.
    Role(RoleId),
    /// A group-like entity that grants membership through a single
    /// "member role" (the original's `Team.member_role`).
    Group { member_role: RoleId },
    /// A domain object bound by content-type and object id.
    Object { content_type: i64, object_id: i64 },
}
