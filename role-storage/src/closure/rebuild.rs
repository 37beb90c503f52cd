//! The layered ancestor-closure rebuild and its two entry points,
//! `on_role_mutated`/`rebuild_all`.
//!
//! Ported directly from `Role._simultaneous_ancestry_rebuild` in the
//! original source: seed purge once, then a delete/insert/descend loop
//! expressed as set-oriented SQL rather than row-at-a-time ORM calls.
//! The `IN (...)` id lists are bound as parameters instead of the
//! original's `','.join(str(x) for x in ids)` string interpolation.

use rusqlite::{params_from_iter, Connection};
use tracing::{debug, warn};

use role_core::errors::{EngineError, StoreError};
use role_core::EngineConfig;

use crate::connection::DatabaseManager;
use crate::util::{in_clause, sqe};

use super::batching;

/// Entry point for "some roles changed, make the closure consistent again".
///
/// If a batching context is active on this thread, the ids are
/// merely accumulated and this returns immediately. Otherwise the rebuild
/// runs now, inside its own transaction.
pub fn on_role_mutated(
    db: &DatabaseManager,
    role_ids: &[i64],
    config: &EngineConfig,
) -> Result<(), EngineError> {
    if role_ids.is_empty() {
        return Ok(());
    }

    if batching::accumulate_if_active(role_ids) {
        return Ok(());
    }

    run_in_transaction(db, role_ids, config)
}

/// Rebuild the entire closure from scratch. Equivalent to
/// `on_role_mutated(all role ids)`; the documented repair path for recovery.
pub fn rebuild_all(db: &DatabaseManager, config: &EngineConfig) -> Result<(), EngineError> {
    let ids: Vec<i64> = db
        .with_reader(|conn| {
            let mut stmt = conn.prepare_cached("SELECT id FROM roles").map_err(sqe)?;
            let rows = stmt
                .query_map([], |row| row.get(0))
                .map_err(sqe)?
                .collect::<Result<Vec<i64>, _>>()
                .map_err(sqe)?;
            Ok(rows)
        })
        .map_err(EngineError::Store)?;

    on_role_mutated(db, &ids, config)
}

/// Runs the layered rebuild for `seed` inside one freshly opened
/// transaction on the write connection. Shared by the immediate path above
/// and by `BatchingGuard`'s release path.
pub(crate) fn run_in_transaction(
    db: &DatabaseManager,
    seed: &[i64],
    config: &EngineConfig,
) -> Result<(), EngineError> {
    let outer: Result<Result<(), EngineError>, StoreError> = db.with_writer(|conn| {
        conn.execute_batch("BEGIN IMMEDIATE").map_err(sqe)?;
        let result = rebuild(conn, seed, config);
        match &result {
            Ok(()) => conn.execute_batch("COMMIT").map_err(sqe)?,
            Err(_) => {
                let _ = conn.execute_batch("ROLLBACK");
            }
        }
        Ok(result)
    });

    match outer {
        Ok(inner) => inner,
        Err(store_err) => Err(EngineError::Store(store_err)),
    }
}

/// The layered rebuild algorithm itself. Assumes the caller already
/// holds an open transaction on `conn`.
pub(crate) fn rebuild(
    conn: &Connection,
    seed: &[i64],
    config: &EngineConfig,
) -> Result<(), EngineError> {
    if seed.is_empty() {
        return Ok(());
    }

    // Step 1: seed purge. Removes every row whose ancestor lies in the seed,
    // once, before the loop starts — this is what makes cyclic graphs
    // converge: any stale closure a cycle could have produced that points
    // back into the seed is gone before recomputation begins.
    //
    // A narrower purge restricted to `descendent != ancestor` was tried in
    // the original and left disabled; kept broad here until profiling on
    // real data justifies the restriction (the loop below re-inserts
    // whatever the broad purge over-deleted, so correctness doesn't depend
    // on which form is used):
    //
    //   DELETE FROM ancestors WHERE ancestor IN (...) AND descendent != ancestor
    conn.execute(
        &format!(
            "DELETE FROM ancestors WHERE ancestor IN ({})",
            in_clause(seed.len())
        ),
        params_from_iter(seed.iter()),
    )
    .map_err(sqe)?;

    let mut current: Vec<i64> = seed.to_vec();
    let mut layer = 0u32;
    let safety_bound = config.effective_safety_bound();

    loop {
        if current.is_empty() {
            break;
        }

        layer += 1;
        if layer > safety_bound {
            return Err(EngineError::Consistency {
                seed: seed.to_vec(),
                layers: layer,
            });
        }
        if layer * 10 >= safety_bound * 8 {
            warn!(
                "closure rebuild at layer {layer}/{safety_bound} (seed len {}), approaching safety bound",
                seed.len()
            );
        }

        let ids = in_clause(current.len());

        // Step 2/3: delete rows whose (descendent, ancestor) no longer
        // belongs to the candidate set for this layer.
        let delete_sql = format!(
            "DELETE FROM ancestors
             WHERE descendent IN ({ids})
               AND id NOT IN (
                   SELECT ancestors.id FROM (
                       SELECT parents.from_role AS from_id, anc.ancestor AS to_id
                         FROM parents
                         LEFT JOIN ancestors AS anc ON parents.to_role = anc.descendent
                        WHERE parents.from_role IN ({ids}) AND anc.ancestor IS NOT NULL
                       UNION
                       SELECT id AS from_id, id AS to_id FROM roles WHERE id IN ({ids})
                   ) candidate
                   LEFT JOIN ancestors
                     ON candidate.from_id = ancestors.descendent
                    AND candidate.to_id = ancestors.ancestor
                   WHERE ancestors.id IS NOT NULL
               )"
        );
        let mut delete_params = Vec::with_capacity(current.len() * 3);
        delete_params.extend(current.iter());
        delete_params.extend(current.iter());
        delete_params.extend(current.iter());
        let delete_ct = conn
            .execute(&delete_sql, params_from_iter(delete_params.iter()))
            .map_err(sqe)?;

        // Candidate rows not yet present get inserted.
        let insert_sql = format!(
            "INSERT INTO ancestors (descendent, ancestor, role_field, content_type, object_id)
             SELECT from_id, to_id, role_field, content_type, object_id FROM (
                 SELECT parents.from_role AS from_id,
                        anc.ancestor AS to_id,
                        roles.role_field AS role_field,
                        COALESCE(roles.content_type, 0) AS content_type,
                        COALESCE(roles.object_id, 0) AS object_id
                   FROM parents
                   INNER JOIN roles ON parents.from_role = roles.id
                   LEFT JOIN ancestors AS anc ON parents.to_role = anc.descendent
                  WHERE parents.from_role IN ({ids}) AND anc.ancestor IS NOT NULL
                 UNION
                 SELECT id AS from_id,
                        id AS to_id,
                        role_field,
                        COALESCE(content_type, 0) AS content_type,
                        COALESCE(object_id, 0) AS object_id
                   FROM roles WHERE id IN ({ids})
             ) candidate
             LEFT JOIN ancestors
               ON candidate.from_id = ancestors.descendent
              AND candidate.to_id = ancestors.ancestor
             WHERE ancestors.id IS NULL"
        );
        let mut insert_params = Vec::with_capacity(current.len() * 2);
        insert_params.extend(current.iter());
        insert_params.extend(current.iter());
        let insert_ct = conn
            .execute(&insert_sql, params_from_iter(insert_params.iter()))
            .map_err(sqe)?;

        debug!("closure rebuild layer {layer}: {delete_ct} deleted, {insert_ct} inserted");

        // Step 4: descent. No work this layer means the graph below is
        // already consistent — terminate.
        if delete_ct == 0 && insert_ct == 0 {
            break;
        }

        let children_sql = format!(
            "SELECT DISTINCT from_role FROM parents WHERE to_role IN ({})",
            in_clause(current.len())
        );
        current = conn
            .prepare_cached(&children_sql)
            .map_err(sqe)?
            .query_map(params_from_iter(current.iter()), |row| row.get(0))
            .map_err(sqe)?
            .collect::<Result<Vec<i64>, _>>()
            .map_err(sqe)?;
    }

    Ok(())
}
