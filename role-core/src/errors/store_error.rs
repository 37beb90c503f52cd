//! Store-adapter errors — failures from the underlying relational store.

use super::{error_code, EngineErrorCode};

/// Errors that can occur while talking to the transactional store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store error: {message}")]
    Sqlite { message: String },

    #[error("store busy (another operation in progress)")]
    Busy,

    #[error("store corrupt: {details}")]
    Corrupt { details: String },

    #[error("connection pool exhausted: {active} active connections")]
    ConnectionPoolExhausted { active: usize },
}

impl EngineErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Busy => error_code::DB_BUSY,
            Self::Corrupt { .. } => error_code::DB_CORRUPT,
            Self::ConnectionPoolExhausted { .. } => error_code::CONNECTION_POOL_EXHAUSTED,
            Self::Sqlite { .. } => error_code::STORE_ERROR,
        }
    }
}
