//! Closure-engine errors — everything `role-storage` can hand back to a caller.

use super::{error_code, EngineErrorCode, StoreError};

/// Errors that can occur while mutating or querying the role closure.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(
        "ancestry rebuild did not converge after {layers} layers (seed: {seed:?}); \
         this indicates data corruption or a bug in the rebuild algorithm"
    )]
    Consistency { seed: Vec<i64>, layers: u32 },

    #[error("cannot enter a batching context while already inside one (allow_nesting=false)")]
    Nesting,

    #[error("migration failed at version {version}: {message}")]
    Migration { version: u32, message: String },
}

impl EngineErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.error_code(),
            Self::Consistency { .. } => error_code::CONSISTENCY_ERROR,
            Self::Nesting => error_code::NESTING_ERROR,
            Self::Migration { .. } => error_code::MIGRATION_FAILED,
        }
    }
}
