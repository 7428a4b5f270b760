//! Subtask CRUD and completion toggling.

use super::{Database, non_blank, now_ms, required_text};
use crate::error::ApiError;
use crate::types::{NewSubtask, Subtask, SubtaskPatch};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;
use uuid::Uuid;

pub fn parse_subtask_row(row: &Row) -> rusqlite::Result<Subtask> {
    Ok(Subtask {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        name: row.get("name")?,
        status: row.get("status")?,
        assignee: row.get("assignee")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Load subtasks grouped by task id, oldest first within each task.
pub(crate) fn load_subtasks(
    conn: &Connection,
    project_id: Option<&str>,
) -> Result<HashMap<String, Vec<Subtask>>> {
    let rows: Vec<Subtask> = match project_id {
        Some(pid) => {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.task_id, s.name, s.status, s.assignee, s.notes,
                        s.created_at, s.updated_at
                 FROM subtasks s
                 JOIN tasks t ON t.id = s.task_id
                 WHERE t.project_id = ?1
                 ORDER BY s.created_at ASC, s.rowid ASC",
            )?;
            stmt.query_map(params![pid], parse_subtask_row)?
                .collect::<rusqlite::Result<_>>()?
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, task_id, name, status, assignee, notes, created_at, updated_at
                 FROM subtasks ORDER BY created_at ASC, rowid ASC",
            )?;
            stmt.query_map([], parse_subtask_row)?
                .collect::<rusqlite::Result<_>>()?
        }
    };

    let mut grouped: HashMap<String, Vec<Subtask>> = HashMap::new();
    for subtask in rows {
        grouped
            .entry(subtask.task_id.clone())
            .or_default()
            .push(subtask);
    }
    Ok(grouped)
}

fn get_subtask_internal(conn: &Connection, subtask_id: &str) -> Result<Option<Subtask>> {
    let subtask = conn
        .query_row(
            "SELECT id, task_id, name, status, assignee, notes, created_at, updated_at
             FROM subtasks WHERE id = ?1",
            params![subtask_id],
            parse_subtask_row,
        )
        .optional()?;
    Ok(subtask)
}

/// Project that owns a subtask, via its task.
fn owning_project_id(conn: &Connection, subtask_id: &str) -> Result<Option<String>> {
    let project_id = conn
        .query_row(
            "SELECT t.project_id
             FROM subtasks s
             JOIN tasks t ON s.task_id = t.id
             WHERE s.id = ?1",
            params![subtask_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(project_id)
}

impl Database {
    pub fn get_subtask(&self, subtask_id: &str) -> Result<Option<Subtask>> {
        self.with_conn(|conn| get_subtask_internal(conn, subtask_id))
    }

    /// Create a subtask under an existing task.
    pub fn create_subtask(&self, input: NewSubtask) -> Result<Subtask> {
        let task_id = required_text(input.task_id.as_deref(), "taskId")?;
        let name = required_text(input.name.as_deref(), "name")?;

        let now = now_ms();
        let subtask = Subtask {
            id: Uuid::new_v4().to_string(),
            task_id,
            name,
            status: input.status.unwrap_or_default(),
            assignee: input.assignee,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        let project_id = self.with_conn(|conn| {
            let project_id: String = conn
                .query_row(
                    "SELECT project_id FROM tasks WHERE id = ?1",
                    params![&subtask.task_id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| ApiError::task_not_found(&subtask.task_id))?;

            conn.execute(
                "INSERT INTO subtasks (
                    id, task_id, name, status, assignee, notes, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    &subtask.id,
                    &subtask.task_id,
                    &subtask.name,
                    subtask.status,
                    &subtask.assignee,
                    &subtask.notes,
                    now,
                    now,
                ],
            )?;
            Ok(project_id)
        })?;

        self.refresh_progress(&project_id);
        Ok(subtask)
    }

    /// Apply a partial update to a subtask.
    pub fn update_subtask(&self, subtask_id: &str, patch: SubtaskPatch) -> Result<Subtask> {
        let name = non_blank(patch.name, "name")?;

        let (updated, project_id) = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let current = get_subtask_internal(&tx, subtask_id)?
                .ok_or_else(|| ApiError::subtask_not_found(subtask_id))?;
            let project_id = owning_project_id(&tx, subtask_id)?
                .ok_or_else(|| ApiError::subtask_not_found(subtask_id))?;

            tx.execute(
                "UPDATE subtasks
                 SET name = ?1, status = ?2, assignee = ?3, notes = ?4, updated_at = ?5
                 WHERE id = ?6",
                params![
                    name.unwrap_or(current.name),
                    patch.status.unwrap_or(current.status),
                    patch.assignee.unwrap_or(current.assignee),
                    patch.notes.unwrap_or(current.notes),
                    now_ms(),
                    subtask_id,
                ],
            )?;

            let updated = get_subtask_internal(&tx, subtask_id)?
                .ok_or_else(|| ApiError::subtask_not_found(subtask_id))?;
            tx.commit()?;
            Ok((updated, project_id))
        })?;

        self.refresh_progress(&project_id);
        Ok(updated)
    }

    /// Flip a subtask between pending and completed. Returns the subtask in
    /// its new state.
    pub fn toggle_subtask(&self, subtask_id: &str) -> Result<Subtask> {
        let (toggled, project_id) = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let current = get_subtask_internal(&tx, subtask_id)?
                .ok_or_else(|| ApiError::subtask_not_found(subtask_id))?;
            let project_id = owning_project_id(&tx, subtask_id)?
                .ok_or_else(|| ApiError::subtask_not_found(subtask_id))?;

            let now = now_ms();
            let new_status = current.status.toggled();
            tx.execute(
                "UPDATE subtasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![new_status, now, subtask_id],
            )?;
            tx.commit()?;

            Ok((
                Subtask {
                    status: new_status,
                    updated_at: now,
                    ..current
                },
                project_id,
            ))
        })?;

        self.refresh_progress(&project_id);
        Ok(toggled)
    }

    /// Delete a subtask. Returns the owning project id.
    pub fn delete_subtask(&self, subtask_id: &str) -> Result<String> {
        let project_id = self.with_conn(|conn| {
            let project_id = owning_project_id(conn, subtask_id)?
                .ok_or_else(|| ApiError::subtask_not_found(subtask_id))?;
            conn.execute("DELETE FROM subtasks WHERE id = ?1", params![subtask_id])?;
            Ok(project_id)
        })?;

        self.refresh_progress(&project_id);
        Ok(project_id)
    }
}
