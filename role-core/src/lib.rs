//! # role-core
//!
//! Foundation crate for the role closure engine.
//! Defines the data types, errors, and config.
//! `role-storage` depends on this crate for everything except the concrete
//! SQLite wiring.

pub mod config;
pub mod errors;
pub mod types;

pub use config::EngineConfig;
pub use errors::{EngineError, EngineErrorCode, StoreError};
pub use types::{Accessor, AncestorRow, ParentEdge, RoleId, RoleRow};
