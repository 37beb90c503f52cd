//! # role-storage
//!
//! SQLite-backed implementation of the role closure engine: connection
//! management, forward-only migrations, the layered ancestor-closure
//! rebuild algorithm and its batching context, and the read query surface.
//!
//! `RoleEngine` is the entry point; everything else is reachable for
//! callers that need to drop below the convenience API.

pub mod closure;
pub mod connection;
pub mod engine;
pub mod migrations;
pub mod queries;
mod util;

pub use engine::RoleEngine;
