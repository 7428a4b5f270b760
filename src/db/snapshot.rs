//! Whole-portfolio JSON snapshots.
//!
//! A snapshot is the nested project list (tasks and subtasks inline) plus a
//! small header. Files may be plain JSON or gzip; reading sniffs the gzip
//! magic bytes rather than trusting the extension.

use super::progress::calculate_project_progress;
use super::projects::{check_date_order, load_projects};
use super::{Database, required_text};
use crate::types::Project;
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tracing::info;

/// Snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    /// RFC 3339 time of export.
    pub exported_at: String,
    pub projects: Vec<Project>,
}

impl Snapshot {
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            projects,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a snapshot from any reader, gzip or plain.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        BufReader::new(reader).read_to_end(&mut bytes)?;

        let snapshot = if bytes.starts_with(&[0x1f, 0x8b]) {
            let decoder = flate2::read::GzDecoder::new(bytes.as_slice());
            serde_json::from_reader(decoder).context("invalid gzipped snapshot")?
        } else {
            serde_json::from_slice(&bytes).context("invalid snapshot JSON")?
        };
        Ok(snapshot)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Self::from_reader(file)
    }

    /// Write the snapshot as pretty JSON, optionally gzipped.
    pub fn write_to<W: Write>(&self, writer: W, gzip: bool) -> Result<()> {
        let json = self.to_json_pretty()?;
        if gzip {
            let mut encoder =
                flate2::write::GzEncoder::new(writer, flate2::Compression::default());
            encoder.write_all(json.as_bytes())?;
            encoder.finish()?;
        } else {
            let mut writer = writer;
            writer.write_all(json.as_bytes())?;
            writer.flush()?;
        }
        Ok(())
    }
}

/// Row counts from an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub projects_imported: usize,
    pub tasks_imported: usize,
    pub subtasks_imported: usize,
    /// Rows left alone because their id already existed.
    pub rows_skipped: usize,
    /// Projects removed before import in replace mode.
    pub projects_deleted: usize,
}

/// Whether a row with `id` is already in `table`.
fn row_exists(conn: &Connection, table: &str, id: &str) -> Result<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?1", table);
    let found = conn
        .query_row(&sql, params![id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Apply the same rules as the create paths to every row in a project tree.
fn validate_project_tree(project: &Project) -> Result<()> {
    required_text(Some(project.name.as_str()), "name")?;
    check_date_order(project.start_date, project.due_date)?;
    for task in &project.tasks {
        required_text(Some(task.name.as_str()), "name")
            .with_context(|| format!("task {}", task.id))?;
        for subtask in &task.subtasks {
            required_text(Some(subtask.name.as_str()), "name")
                .with_context(|| format!("subtask {}", subtask.id))?;
        }
    }
    Ok(())
}

/// Insert a project with its tasks and subtasks, skipping rows whose id is
/// already present. Stored progress starts at 0 and is recomputed by the
/// caller.
fn insert_project_tree(
    conn: &Connection,
    project: &Project,
    summary: &mut ImportSummary,
) -> Result<()> {
    validate_project_tree(project)?;

    if row_exists(conn, "projects", &project.id)? {
        summary.rows_skipped += 1;
    } else {
        conn.execute(
            "INSERT INTO projects (
                id, name, description, status, priority, start_date, due_date,
                progress, team_members, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?10)",
            params![
                &project.id,
                project.name.trim(),
                &project.description,
                project.status,
                project.priority,
                project.start_date,
                project.due_date,
                serde_json::to_string(&project.team_members)?,
                project.created_at,
                project.updated_at,
            ],
        )?;
        summary.projects_imported += 1;
    }

    for task in &project.tasks {
        if row_exists(conn, "tasks", &task.id)? {
            summary.rows_skipped += 1;
        } else {
            conn.execute(
                "INSERT INTO tasks (
                    id, project_id, name, description, status, priority,
                    assignee, due_date, estimated_hours, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    &task.id,
                    &project.id,
                    task.name.trim(),
                    &task.description,
                    task.status,
                    task.priority,
                    &task.assignee,
                    task.due_date,
                    task.estimated_hours,
                    task.created_at,
                    task.updated_at,
                ],
            )?;
            summary.tasks_imported += 1;
        }

        for subtask in &task.subtasks {
            if row_exists(conn, "subtasks", &subtask.id)? {
                summary.rows_skipped += 1;
                continue;
            }
            conn.execute(
                "INSERT INTO subtasks (
                    id, task_id, name, status, assignee, notes, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    &subtask.id,
                    &task.id,
                    subtask.name.trim(),
                    subtask.status,
                    &subtask.assignee,
                    &subtask.notes,
                    subtask.created_at,
                    subtask.updated_at,
                ],
            )?;
            summary.subtasks_imported += 1;
        }
    }

    Ok(())
}

impl Database {
    /// Snapshot of every project with tasks and subtasks.
    pub fn export_snapshot(&self) -> Result<Snapshot> {
        let projects = self.with_conn(load_projects)?;
        Ok(Snapshot::new(projects))
    }

    /// Load a snapshot in one transaction. With `replace`, existing projects
    /// (and by cascade their tasks and subtasks) are deleted first; otherwise
    /// rows whose id already exists are skipped. A row that fails validation
    /// aborts the whole import. Progress is recomputed for every project
    /// afterwards.
    pub fn import_snapshot(&self, snapshot: &Snapshot, replace: bool) -> Result<ImportSummary> {
        let summary = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut summary = ImportSummary::default();

            if replace {
                summary.projects_deleted = tx.execute("DELETE FROM projects", [])?;
            }

            for project in &snapshot.projects {
                insert_project_tree(&tx, project, &mut summary)
                    .with_context(|| format!("failed to import project {}", project.id))?;
            }

            let ids: Vec<String> = {
                let mut stmt = tx.prepare("SELECT id FROM projects")?;
                stmt.query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<_>>()?
            };
            for id in &ids {
                calculate_project_progress(&tx, id)?;
            }

            tx.commit()?;
            Ok(summary)
        })?;

        info!(
            projects = summary.projects_imported,
            tasks = summary.tasks_imported,
            subtasks = summary.subtasks_imported,
            skipped = summary.rows_skipped,
            replace,
            "Snapshot imported"
        );
        Ok(summary)
    }
}
