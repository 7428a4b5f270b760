//! Aggregation queries for the dashboard and the kanban board.

use super::Database;
use crate::types::{AssigneeWorkload, BoardCard, BoardColumn, DashboardStats, TaskStatus};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::params;
use std::collections::HashMap;

/// Label used for tasks that nobody is assigned to.
pub const UNASSIGNED: &str = "Unassigned";

impl Database {
    /// Portfolio counters. A project is overdue when it is not completed and
    /// its due date is strictly before `today`.
    pub fn dashboard_stats(&self, today: NaiveDate) -> Result<DashboardStats> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN status = 'in-progress' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status != 'completed' AND due_date < ?1 THEN 1 ELSE 0 END), 0)
                 FROM projects",
                params![today],
                |row| {
                    Ok(DashboardStats {
                        total_projects: row.get(0)?,
                        in_progress: row.get(1)?,
                        completed: row.get(2)?,
                        overdue: row.get(3)?,
                    })
                },
            )?;
            Ok(stats)
        })
    }

    /// Task counts and estimated hours per assignee, busiest first.
    pub fn workload(&self) -> Result<Vec<AssigneeWorkload>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT
                    COALESCE(NULLIF(TRIM(assignee), ''), ?1) AS who,
                    COUNT(*) AS total,
                    COALESCE(SUM(CASE WHEN status != 'done' THEN 1 ELSE 0 END), 0) AS open,
                    COALESCE(SUM(CASE WHEN status = 'done' THEN 1 ELSE 0 END), 0) AS done,
                    COALESCE(SUM(estimated_hours), 0) AS hours
                 FROM tasks
                 GROUP BY who
                 ORDER BY open DESC, total DESC, who ASC",
            )?;
            let rows = stmt
                .query_map(params![UNASSIGNED], |row| {
                    Ok(AssigneeWorkload {
                        assignee: row.get(0)?,
                        total_tasks: row.get(1)?,
                        open_tasks: row.get(2)?,
                        done_tasks: row.get(3)?,
                        estimated_hours: row.get(4)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Kanban board: one column per task status, in workflow order, empty
    /// columns included.
    pub fn board(&self, project_id: Option<&str>) -> Result<Vec<BoardColumn>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT
                    t.id, t.project_id, p.name, t.name, t.status, t.priority,
                    t.assignee, t.due_date,
                    COUNT(s.id),
                    COALESCE(SUM(CASE WHEN s.status = 'completed' THEN 1 ELSE 0 END), 0)
                 FROM tasks t
                 JOIN projects p ON p.id = t.project_id
                 LEFT JOIN subtasks s ON s.task_id = t.id
                 WHERE ?1 IS NULL OR t.project_id = ?1
                 GROUP BY t.id
                 ORDER BY t.created_at ASC, t.rowid ASC",
            )?;

            let mut by_status: HashMap<TaskStatus, Vec<BoardCard>> = HashMap::new();
            let rows = stmt.query_map(params![project_id], |row| {
                let status: TaskStatus = row.get(4)?;
                let card = BoardCard {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    project_name: row.get(2)?,
                    name: row.get(3)?,
                    priority: row.get(5)?,
                    assignee: row.get(6)?,
                    due_date: row.get(7)?,
                    subtasks_total: row.get(8)?,
                    subtasks_completed: row.get(9)?,
                };
                Ok((status, card))
            })?;
            for row in rows {
                let (status, card) = row?;
                by_status.entry(status).or_default().push(card);
            }

            Ok(TaskStatus::ALL
                .iter()
                .map(|status| BoardColumn {
                    status: *status,
                    cards: by_status.remove(status).unwrap_or_default(),
                })
                .collect())
        })
    }
}
