//! Project progress rollup.
//!
//! A project's `progress` is the rounded share of completed subtasks across
//! all of its tasks. It is recomputed after writes rather than kept in step
//! transactionally, so it can briefly lag behind concurrent writers.

use super::{Database, now_ms};
use crate::types::progress_percent;
use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::{debug, error};

/// Count `(completed, total)` subtasks under a project.
pub(crate) fn count_project_subtasks(conn: &Connection, project_id: &str) -> Result<(i64, i64)> {
    let counts = conn.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN s.status = 'completed' THEN 1 ELSE 0 END), 0),
            COUNT(s.id)
         FROM subtasks s
         JOIN tasks t ON t.id = s.task_id
         WHERE t.project_id = ?1",
        params![project_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(counts)
}

/// Recompute and store progress for one project using an existing connection.
pub(crate) fn calculate_project_progress(conn: &Connection, project_id: &str) -> Result<u8> {
    let (completed, total) = count_project_subtasks(conn, project_id)?;
    let progress = progress_percent(completed, total);

    conn.execute(
        "UPDATE projects SET progress = ?1, updated_at = ?2 WHERE id = ?3",
        params![progress, now_ms(), project_id],
    )?;

    Ok(progress)
}

impl Database {
    /// Recompute a project's progress from its subtasks and persist it.
    pub fn recalculate_progress(&self, project_id: &str) -> Result<u8> {
        self.with_conn(|conn| calculate_project_progress(conn, project_id))
    }

    /// Rollup run after a mutation. Failures are logged and dropped; the
    /// caller's write has already succeeded and is not undone.
    pub fn refresh_progress(&self, project_id: &str) {
        match self.recalculate_progress(project_id) {
            Ok(progress) => debug!(project_id, progress, "Project progress recalculated"),
            Err(e) => error!(project_id, error = %e, "Error calculating project progress"),
        }
    }

    /// Recompute progress for every project. Returns how many were updated.
    pub fn recalculate_all_progress(&self) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let ids: Vec<String> = {
                let mut stmt = tx.prepare("SELECT id FROM projects")?;
                stmt.query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<_>>()?
            };
            for id in &ids {
                calculate_project_progress(&tx, id)?;
            }
            tx.commit()?;
            Ok(ids.len())
        })
    }
}
