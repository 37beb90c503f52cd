//! SQLite connection management: one write connection, a small pool of
//! read connections, WAL mode, and the pragmas that make set-oriented
//! DELETE/INSERT-SELECT statements (closure/rebuild.rs) fast.
//!
//! Pattern reference: `DriftStorageEngine::open`/`with_reader`/`with_writer`
//! in the teacher crate — this module is the thing that sits behind those
//! methods.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use role_core::errors::StoreError;
use role_core::EngineConfig;
use rusqlite::Connection;

fn sqe(e: impl std::fmt::Display) -> StoreError {
    StoreError::Sqlite {
        message: e.to_string(),
    }
}

/// Owns the single write connection and a round-robin pool of read
/// connections to one SQLite database (file-backed or in-memory).
pub struct DatabaseManager {
    path: Option<PathBuf>,
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
}

impl DatabaseManager {
    /// Open a file-backed database at `path`. Runs migrations and applies
    /// pragmas on every connection opened.
    pub fn open(path: &Path, config: &EngineConfig) -> Result<Self, StoreError> {
        let writer = Connection::open(path).map_err(sqe)?;
        apply_pragmas(&writer, config)?;
        crate::migrations::run_migrations(&writer).map_err(|e| StoreError::Sqlite {
            message: e.to_string(),
        })?;

        let mut readers = Vec::with_capacity(config.effective_read_pool_size());
        for _ in 0..config.effective_read_pool_size() {
            let conn = Connection::open(path).map_err(sqe)?;
            apply_pragmas(&conn, config)?;
            readers.push(Mutex::new(conn));
        }

        Ok(Self {
            path: Some(path.to_path_buf()),
            writer: Mutex::new(writer),
            readers,
            next_reader: AtomicUsize::new(0),
        })
    }

    /// Open an in-memory database (for testing). Reads and writes share the
    /// same connection since `:memory:` databases are not shared across
    /// connections.
    pub fn open_in_memory(config: &EngineConfig) -> Result<Self, StoreError> {
        let writer = Connection::open_in_memory().map_err(sqe)?;
        apply_pragmas(&writer, config)?;
        crate::migrations::run_migrations(&writer).map_err(|e| StoreError::Sqlite {
            message: e.to_string(),
        })?;

        Ok(Self {
            path: None,
            writer: Mutex::new(writer),
            readers: Vec::new(),
            next_reader: AtomicUsize::new(0),
        })
    }

    /// Database file path (`None` for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` against the write connection.
    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.writer.lock().map_err(|_| StoreError::Sqlite {
            message: "write connection lock poisoned".to_string(),
        })?;
        f(&conn)
    }

    /// Run `f` against a pooled read connection, falling back to the write
    /// connection when the pool is empty (in-memory databases, or a pool
    /// size of zero).
    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        if self.readers.is_empty() {
            return self.with_writer(f);
        }
        let idx = self.next_reader.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[idx].lock().map_err(|_| StoreError::Sqlite {
            message: "read connection lock poisoned".to_string(),
        })?;
        f(&conn)
    }

    /// WAL checkpoint — folds the write-ahead log back into the main
    /// database file.
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        self.with_writer(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(sqe)
        })
    }
}

fn apply_pragmas(conn: &Connection, config: &EngineConfig) -> Result<(), StoreError> {
    if config.effective_wal_mode() {
        conn.execute_batch("PRAGMA journal_mode=WAL;").map_err(sqe)?;
    }
    conn.execute_batch(
        "PRAGMA foreign_keys=ON;
         PRAGMA synchronous=NORMAL;
         PRAGMA busy_timeout=5000;",
    )
    .map_err(sqe)
}
