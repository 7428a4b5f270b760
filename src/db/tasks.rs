//! Task CRUD. Every mutation is followed by a progress rollup of the owning
//! project.

use super::projects::project_exists;
use super::subtasks::load_subtasks;
use super::{Database, non_blank, now_ms, required_text};
use crate::error::ApiError;
use crate::types::{NewTask, Task, TaskPatch};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, project_id, name, description, status, priority, assignee, \
     due_date, estimated_hours, created_at, updated_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: row.get("status")?,
        priority: row.get("priority")?,
        assignee: row.get("assignee")?,
        due_date: row.get("due_date")?,
        estimated_hours: row.get("estimated_hours")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        subtasks: Vec::new(),
    })
}

/// Load tasks oldest first with their subtasks attached, optionally limited
/// to one project.
pub(crate) fn load_tasks(conn: &Connection, project_id: Option<&str>) -> Result<Vec<Task>> {
    let mut tasks: Vec<Task> = match project_id {
        Some(pid) => {
            let sql = format!(
                "SELECT {} FROM tasks WHERE project_id = ?1 ORDER BY created_at ASC, rowid ASC",
                TASK_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map(params![pid], parse_task_row)?
                .collect::<rusqlite::Result<_>>()?
        }
        None => {
            let sql = format!(
                "SELECT {} FROM tasks ORDER BY created_at ASC, rowid ASC",
                TASK_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map([], parse_task_row)?
                .collect::<rusqlite::Result<_>>()?
        }
    };

    let mut subtasks = load_subtasks(conn, project_id)?;
    for task in &mut tasks {
        task.subtasks = subtasks.remove(&task.id).unwrap_or_default();
    }

    Ok(tasks)
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
    let Some(mut task) = conn
        .query_row(&sql, params![task_id], parse_task_row)
        .optional()?
    else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT id, task_id, name, status, assignee, notes, created_at, updated_at
         FROM subtasks WHERE task_id = ?1 ORDER BY created_at ASC, rowid ASC",
    )?;
    task.subtasks = stmt
        .query_map(params![task_id], super::subtasks::parse_subtask_row)?
        .collect::<rusqlite::Result<_>>()?;

    Ok(Some(task))
}

impl Database {
    /// Tasks of one project with their subtasks. Unknown projects yield an
    /// empty list.
    pub fn list_tasks_for_project(&self, project_id: &str) -> Result<Vec<Task>> {
        self.with_conn(|conn| load_tasks(conn, Some(project_id)))
    }

    /// Get a task with its subtasks.
    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Create a task under an existing project.
    pub fn create_task(&self, input: NewTask) -> Result<Task> {
        let project_id = required_text(input.project_id.as_deref(), "projectId")?;
        let name = required_text(input.name.as_deref(), "name")?;

        let now = now_ms();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            project_id,
            name,
            description: input.description,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            assignee: input.assignee,
            due_date: input.due_date,
            estimated_hours: input.estimated_hours,
            created_at: now,
            updated_at: now,
            subtasks: Vec::new(),
        };

        self.with_conn(|conn| {
            if !project_exists(conn, &task.project_id)? {
                return Err(ApiError::project_not_found(&task.project_id).into());
            }

            conn.execute(
                "INSERT INTO tasks (
                    id, project_id, name, description, status, priority,
                    assignee, due_date, estimated_hours, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    &task.id,
                    &task.project_id,
                    &task.name,
                    &task.description,
                    task.status,
                    task.priority,
                    &task.assignee,
                    task.due_date,
                    task.estimated_hours,
                    now,
                    now,
                ],
            )?;
            Ok(())
        })?;

        self.refresh_progress(&task.project_id);
        Ok(task)
    }

    /// Apply a partial update to a task.
    pub fn update_task(&self, task_id: &str, patch: TaskPatch) -> Result<Task> {
        let name = non_blank(patch.name, "name")?;

        let updated = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let current = get_task_internal(&tx, task_id)?
                .ok_or_else(|| ApiError::task_not_found(task_id))?;

            tx.execute(
                "UPDATE tasks
                 SET name = ?1, description = ?2, status = ?3, priority = ?4,
                     assignee = ?5, due_date = ?6, estimated_hours = ?7, updated_at = ?8
                 WHERE id = ?9",
                params![
                    name.unwrap_or(current.name),
                    patch.description.unwrap_or(current.description),
                    patch.status.unwrap_or(current.status),
                    patch.priority.unwrap_or(current.priority),
                    patch.assignee.unwrap_or(current.assignee),
                    patch.due_date.unwrap_or(current.due_date),
                    patch.estimated_hours.unwrap_or(current.estimated_hours),
                    now_ms(),
                    task_id,
                ],
            )?;

            let updated = get_task_internal(&tx, task_id)?
                .ok_or_else(|| ApiError::task_not_found(task_id))?;
            tx.commit()?;
            Ok(updated)
        })?;

        self.refresh_progress(&updated.project_id);
        Ok(updated)
    }

    /// Delete a task and its subtasks. Returns the owning project id.
    pub fn delete_task(&self, task_id: &str) -> Result<String> {
        let project_id = self.with_conn(|conn| {
            let project_id: String = conn
                .query_row(
                    "SELECT project_id FROM tasks WHERE id = ?1",
                    params![task_id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| ApiError::task_not_found(task_id))?;

            conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            Ok(project_id)
        })?;

        self.refresh_progress(&project_id);
        Ok(project_id)
    }
}
