//! Migration runner — version tracking, forward-only, one transaction per
//! migration.
//!
//! Pattern reference: `cortex-storage::migrations` (`current_version` /
//! `run_migrations`).

mod v001_initial_schema;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use role_core::errors::StoreError;

type MigrationFn = fn(&Connection) -> Result<(), StoreError>;

/// Total number of migrations.
pub const LATEST_VERSION: u32 = 1;

const MIGRATIONS: [(u32, &str, MigrationFn); 1] =
    [(1, "initial_schema", v001_initial_schema::migrate)];

/// Get the current schema version. Returns 0 if `schema_version` doesn't
/// exist yet.
pub fn current_version(conn: &Connection) -> Result<u32, StoreError> {
    let exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version'")
        .and_then(|mut stmt| stmt.exists([]))
        .map_err(|e| StoreError::Sqlite {
            message: e.to_string(),
        })?;

    if !exists {
        return Ok(0);
    }

    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| StoreError::Sqlite {
        message: e.to_string(),
    })
}

/// Run all pending migrations. Each migration runs in its own transaction.
pub fn run_migrations(conn: &Connection) -> Result<u32, StoreError> {
    // schema_version itself must exist before current_version can read it.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )
    .map_err(|e| StoreError::Sqlite {
        message: e.to_string(),
    })?;

    let current = current_version(conn)?;
    let mut applied = 0;

    if current >= LATEST_VERSION {
        debug!("role schema is up to date (v{current})");
        return Ok(0);
    }

    info!("running role schema migrations: v{} → v{}", current, LATEST_VERSION);

    for &(version, name, migrate_fn) in &MIGRATIONS {
        if version <= current {
            continue;
        }

        debug!("applying migration v{version:03}: {name}");
        conn.execute_batch("BEGIN IMMEDIATE").map_err(|e| StoreError::Sqlite {
            message: format!("begin transaction for v{version:03}: {e}"),
        })?;

        match migrate_fn(conn) {
            Ok(()) => {
                conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
                    .map_err(|e| StoreError::Sqlite {
                        message: format!("record version v{version:03}: {e}"),
                    })?;
                conn.execute_batch("COMMIT").map_err(|e| StoreError::Sqlite {
                    message: format!("commit v{version:03}: {e}"),
                })?;
                info!("applied migration v{version:03}: {name}");
                applied += 1;
            }
            Err(e) => {
                warn!("migration v{version:03} failed: {e}, rolling back");
                let _ = conn.execute_batch("ROLLBACK");
                return Err(StoreError::Sqlite {
                    message: format!("migration v{version:03} ({name}) failed: {e}"),
                });
            }
        }
    }

    info!("applied {applied} migration(s), now at v{LATEST_VERSION}");
    Ok(applied)
}
