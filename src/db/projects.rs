//! Project CRUD and nested loading.

use super::tasks::load_tasks;
use super::{Database, non_blank, now_ms, required_text};
use crate::error::ApiError;
use crate::types::{NewProject, Project, ProjectPatch, Task};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;
use uuid::Uuid;

pub(crate) const PROJECT_COLUMNS: &str = "id, name, description, status, priority, start_date, due_date, \
     progress, team_members, created_at, updated_at";

/// Decode the JSON `team_members` column. Malformed text is a conversion
/// error, like an unknown status value.
fn team_members_from_row(row: &Row) -> rusqlite::Result<Vec<String>> {
    let Some(json) = row.get::<_, Option<String>>("team_members")? else {
        return Ok(Vec::new());
    };
    serde_json::from_str(&json).map_err(|e| {
        let idx = row.as_ref().column_index("team_members").unwrap_or_default();
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

pub fn parse_project_row(row: &Row) -> rusqlite::Result<Project> {

    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: row.get("status")?,
        priority: row.get("priority")?,
        start_date: row.get("start_date")?,
        due_date: row.get("due_date")?,
        progress: row.get("progress")?,
        team_members: team_members_from_row(row)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        tasks: Vec::new(),
    })
}

fn clean_team(members: Vec<String>) -> Vec<String> {
    members
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect()
}

pub(crate) fn check_date_order(start: NaiveDate, due: NaiveDate) -> Result<()> {
    if due < start {
        return Err(ApiError::invalid_value("dueDate", "dueDate must not be before startDate").into());
    }
    Ok(())
}

pub(crate) fn project_exists(conn: &Connection, project_id: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM projects WHERE id = ?1",
            params![project_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Load a single project row without its tasks.
fn get_project_row(conn: &Connection, project_id: &str) -> Result<Option<Project>> {
    let sql = format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS);
    let project = conn
        .query_row(&sql, params![project_id], parse_project_row)
        .optional()?;
    Ok(project)
}

/// Load a project with its tasks and subtasks.
fn get_project_internal(conn: &Connection, project_id: &str) -> Result<Option<Project>> {
    let Some(mut project) = get_project_row(conn, project_id)? else {
        return Ok(None);
    };
    project.tasks = load_tasks(conn, Some(project_id))?;
    Ok(Some(project))
}

/// Load every project, newest first, each with tasks and subtasks.
pub(crate) fn load_projects(conn: &Connection) -> Result<Vec<Project>> {
    let sql = format!(
        "SELECT {} FROM projects ORDER BY created_at DESC, rowid DESC",
        PROJECT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut projects: Vec<Project> = stmt
        .query_map([], parse_project_row)?
        .collect::<rusqlite::Result<_>>()?;

    let mut tasks_by_project: HashMap<String, Vec<Task>> = HashMap::new();
    for task in load_tasks(conn, None)? {
        tasks_by_project
            .entry(task.project_id.clone())
            .or_default()
            .push(task);
    }

    for project in &mut projects {
        project.tasks = tasks_by_project.remove(&project.id).unwrap_or_default();
    }

    Ok(projects)
}

impl Database {
    /// List all projects with nested tasks and subtasks.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        self.with_conn(load_projects)
    }

    /// Get a project with nested tasks and subtasks.
    pub fn get_project(&self, project_id: &str) -> Result<Option<Project>> {
        self.with_conn(|conn| get_project_internal(conn, project_id))
    }

    /// Create a project. Name, start date and due date are required.
    pub fn create_project(&self, input: NewProject) -> Result<Project> {
        let name = required_text(input.name.as_deref(), "name")?;
        let start_date = input
            .start_date
            .ok_or_else(|| ApiError::missing_field("startDate"))?;
        let due_date = input
            .due_date
            .ok_or_else(|| ApiError::missing_field("dueDate"))?;
        check_date_order(start_date, due_date)?;

        let now = now_ms();
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name,
            description: input.description,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            start_date,
            due_date,
            progress: 0,
            team_members: clean_team(input.team_members),
            created_at: now,
            updated_at: now,
            tasks: Vec::new(),
        };
        let team_json = serde_json::to_string(&project.team_members)?;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (
                    id, name, description, status, priority, start_date, due_date,
                    progress, team_members, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?10)",
                params![
                    &project.id,
                    &project.name,
                    &project.description,
                    project.status,
                    project.priority,
                    project.start_date,
                    project.due_date,
                    team_json,
                    now,
                    now,
                ],
            )?;
            Ok(())
        })?;

        Ok(project)
    }

    /// Apply a partial update. `progress` is never written here.
    pub fn update_project(&self, project_id: &str, patch: ProjectPatch) -> Result<Project> {
        let name = non_blank(patch.name, "name")?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let current = get_project_row(&tx, project_id)?
                .ok_or_else(|| ApiError::project_not_found(project_id))?;

            let start_date = patch.start_date.unwrap_or(current.start_date);
            let due_date = patch.due_date.unwrap_or(current.due_date);
            check_date_order(start_date, due_date)?;

            let team_members = patch
                .team_members
                .map(clean_team)
                .unwrap_or(current.team_members);

            tx.execute(
                "UPDATE projects
                 SET name = ?1, description = ?2, status = ?3, priority = ?4,
                     start_date = ?5, due_date = ?6, team_members = ?7, updated_at = ?8
                 WHERE id = ?9",
                params![
                    name.unwrap_or(current.name),
                    patch.description.unwrap_or(current.description),
                    patch.status.unwrap_or(current.status),
                    patch.priority.unwrap_or(current.priority),
                    start_date,
                    due_date,
                    serde_json::to_string(&team_members)?,
                    now_ms(),
                    project_id,
                ],
            )?;

            let updated = get_project_internal(&tx, project_id)?
                .ok_or_else(|| ApiError::project_not_found(project_id))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Delete a project. Tasks and subtasks go with it via the foreign keys.
    pub fn delete_project(&self, project_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
            if deleted == 0 {
                return Err(ApiError::project_not_found(project_id).into());
            }
            Ok(())
        })
    }
}
