//! The closure engine: layered rebuild and the batching context.

mod batching;
mod rebuild;

pub use batching::BatchingGuard;
pub use rebuild::{on_role_mutated, rebuild_all};
