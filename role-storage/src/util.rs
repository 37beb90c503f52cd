//! Small cross-module helpers, in the style of the teacher's own `sqe()`
//! converter in `engine.rs`.

use role_core::errors::StoreError;

pub(crate) fn sqe(e: impl std::fmt::Display) -> StoreError {
    StoreError::Sqlite {
        message: e.to_string(),
    }
}

/// Builds a `?,?,...` placeholder list for a dynamic-width `IN (...)` clause.
pub(crate) fn in_clause(n: usize) -> String {
    std::iter::repeat("?").take(n).collect::<Vec<_>>().join(",")
}
