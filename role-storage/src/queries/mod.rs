//! The query surface: CRUD helpers over `roles`/`parents`, and the
//! read-only operations (`role_contains`, `roles_on_resource`,
//! `visible_roles`, `singleton`, `is_ancestor_of`) layered on top.

pub mod ancestors;
pub mod parents;
pub mod roles;
pub mod surface;
