//! Batching context: defers closure rebuilds across many mutations
//! into a single pass on scope exit.
//!
//! Ported from the original's `tls = threading.local()` +
//! `batch_role_ancestor_rebuilding` context manager. Rust has no implicit
//! "current task" the way Python's `threading.local()` rides along a
//! thread, so this uses `thread_local!` directly (idiom: a `Cell` flag plus
//! a `RefCell`-wrapped accumulator, guarded by a type whose `Drop` impl
//! restores state on every exit path, as in a thread-local cache keyed by
//! scope rather than by value).

use std::cell::{Cell, RefCell};

use rustc_hash::FxHashSet;
use tracing::{error, info};

use role_core::errors::EngineError;
use role_core::EngineConfig;

use crate::connection::DatabaseManager;

use super::rebuild;

thread_local! {
    static BATCH_ACTIVE: Cell<bool> = Cell::new(false);
    static BATCH_IDS: RefCell<FxHashSet<i64>> = RefCell::new(FxHashSet::default());
    static LAST_BATCH_ERROR: RefCell<Option<EngineError>> = RefCell::new(None);
}

/// If a batching context is active on this thread, folds `ids` into the
/// accumulator and returns `true`. Otherwise returns `false` and touches
/// nothing.
pub(crate) fn accumulate_if_active(ids: &[i64]) -> bool {
    if !BATCH_ACTIVE.with(Cell::get) {
        return false;
    }
    BATCH_IDS.with(|set| set.borrow_mut().extend(ids.iter().copied()));
    true
}

/// A scoped handle on the batching context. Dropping it releases the
/// context; if this was the outermost entry, the accumulated role ids are
/// rebuilt in one transaction.
///
/// Because `Drop` cannot return a `Result`, prefer calling [`finish`] on the
/// normal exit path — it surfaces the rebuild's outcome. `Drop` alone (the
/// path taken on panic unwind) only logs failures via `tracing::error!`.
///
/// [`finish`]: BatchingGuard::finish
pub struct BatchingGuard<'a> {
    db: &'a DatabaseManager,
    config: EngineConfig,
    outermost: bool,
    released: bool,
}

impl<'a> BatchingGuard<'a> {
    /// Enters the batching context. Nested entry without `allow_nesting`
    /// fails before any state is touched; with `allow_nesting`,
    /// the inner guard is a no-op on both entry and exit.
    pub fn enter(
        db: &'a DatabaseManager,
        config: EngineConfig,
        allow_nesting: bool,
    ) -> Result<Self, EngineError> {
        let already_active = BATCH_ACTIVE.with(Cell::get);

        if already_active && !allow_nesting {
            return Err(EngineError::Nesting);
        }

        if already_active {
            return Ok(Self {
                db,
                config,
                outermost: false,
                released: false,
            });
        }

        BATCH_ACTIVE.with(|flag| flag.set(true));
        BATCH_IDS.with(|set| set.borrow_mut().clear());
        Ok(Self {
            db,
            config,
            outermost: true,
            released: false,
        })
    }

    /// Normal-exit release: runs the rebuild (if outermost) and surfaces its
    /// result, instead of relying on `Drop` to log-and-swallow it.
    pub fn finish(mut self) -> Result<(), EngineError> {
        self.release();
        LAST_BATCH_ERROR.with(|cell| cell.borrow_mut().take()).map_or(Ok(()), Err)
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if !self.outermost {
            return;
        }

        BATCH_ACTIVE.with(|flag| flag.set(false));
        let ids: Vec<i64> = BATCH_IDS.with(|set| set.borrow_mut().drain().collect());

        if ids.is_empty() {
            return;
        }

        info!("committing batched ancestry rebuild for {} role(s)", ids.len());
        if let Err(e) = rebuild::run_in_transaction(self.db, &ids, &self.config) {
            LAST_BATCH_ERROR.with(|cell| *cell.borrow_mut() = Some(e));
        }
    }
}

impl Drop for BatchingGuard<'_> {
    fn drop(&mut self) {
        self.release();
        if let Some(e) = LAST_BATCH_ERROR.with(|cell| cell.borrow_mut().take()) {
            error!("batched ancestry rebuild failed on scope exit: {e}");
        }
    }
}
