//! Core types for the project tracker.
//!
//! Status and priority enums are stored as their kebab-case text form and
//! travel over the wire the same way. Entity structs serialize as camelCase
//! JSON to match what the web client expects.

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A text value that does not name any variant of the target enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `Display`, `FromStr` and the rusqlite text conversions for an
/// enum that already provides `as_str` and `ALL`.
macro_rules! text_enum {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: UnknownVariant| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

/// Lifecycle state of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    NotStarted,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::NotStarted,
        ProjectStatus::InProgress,
        ProjectStatus::OnHold,
        ProjectStatus::Completed,
        ProjectStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::NotStarted => "not-started",
            ProjectStatus::InProgress => "in-progress",
            ProjectStatus::OnHold => "on-hold",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

text_enum!(ProjectStatus, "project status");

/// Kanban state of a task. `ALL` is in board column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    ToDo,
    InProgress,
    InReview,
    Blocked,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::ToDo,
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::Blocked,
        TaskStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "to-do",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::InReview => "in-review",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "done",
        }
    }
}

text_enum!(TaskStatus, "task status");

/// Completion state of a subtask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubtaskStatus {
    #[default]
    Pending,
    Completed,
}

impl SubtaskStatus {
    pub const ALL: [SubtaskStatus; 2] = [SubtaskStatus::Pending, SubtaskStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubtaskStatus::Pending => "pending",
            SubtaskStatus::Completed => "completed",
        }
    }

    /// The opposite state; used by the toggle endpoint.
    pub fn toggled(self) -> Self {
        match self {
            SubtaskStatus::Pending => SubtaskStatus::Completed,
            SubtaskStatus::Completed => SubtaskStatus::Pending,
        }
    }
}

text_enum!(SubtaskStatus, "subtask status");

/// Priority shared by projects and tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

text_enum!(Priority, "priority");

/// Rounded completion percentage, half-up. Zero when there is nothing to count.
pub fn progress_percent(completed: i64, total: i64) -> u8 {
    if total <= 0 {
        return 0;
    }
    let completed = completed.clamp(0, total);
    ((200 * completed + total) / (2 * total)) as u8
}

/// A subtask. Owned by exactly one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub task_id: String,
    pub name: String,
    pub status: SubtaskStatus,
    pub assignee: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task with its subtasks. Owned by exactly one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<u32>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    pub fn completed_subtasks(&self) -> usize {
        self.subtasks
            .iter()
            .filter(|s| s.status == SubtaskStatus::Completed)
            .count()
    }

    /// Completion of this task alone, from its own subtasks.
    pub fn progress(&self) -> u8 {
        progress_percent(self.completed_subtasks() as i64, self.subtasks.len() as i64)
    }
}

/// A project with its tasks. `progress` is derived from subtask completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub progress: u8,
    pub team_members: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Project {
    pub fn total_subtasks(&self) -> usize {
        self.tasks.iter().map(|t| t.subtasks.len()).sum()
    }

    pub fn completed_subtasks(&self) -> usize {
        self.tasks.iter().map(Task::completed_subtasks).sum()
    }
}

/// Request body for creating a project.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub team_members: Vec<String>,
}

/// Keeps a present `null` distinct from an absent key: with
/// `#[serde(default)]` a missing field is `None`, `null` is `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update for a project. Absent fields are left unchanged; `null`
/// clears a nullable field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub team_members: Option<Vec<String>>,
}

/// Request body for creating a task.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub project_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<u32>,
}

/// Partial update for a task. `null` clears a nullable field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "nullable")]
    pub assignee: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub estimated_hours: Option<Option<u32>>,
}

/// Request body for creating a subtask.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubtask {
    pub task_id: Option<String>,
    pub name: Option<String>,
    pub status: Option<SubtaskStatus>,
    pub assignee: Option<String>,
    pub notes: Option<String>,
}

/// Partial update for a subtask.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskPatch {
    pub name: Option<String>,
    pub status: Option<SubtaskStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub assignee: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

/// Portfolio counters shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_projects: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub overdue: i64,
}

/// Task load for one assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeWorkload {
    pub assignee: String,
    pub total_tasks: i64,
    pub open_tasks: i64,
    pub done_tasks: i64,
    pub estimated_hours: i64,
}

/// A task as shown on the kanban board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCard {
    pub id: String,
    pub project_id: String,
    pub project_name: String,
    pub name: String,
    pub priority: Priority,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub subtasks_total: i64,
    pub subtasks_completed: i64,
}

/// One kanban column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub status: TaskStatus,
    pub cards: Vec<BoardCard>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_forms() {
        assert_eq!(ProjectStatus::OnHold.as_str(), "on-hold");
        assert_eq!(TaskStatus::ToDo.to_string(), "to-do");
        assert_eq!("in-review".parse::<TaskStatus>(), Ok(TaskStatus::InReview));
        assert_eq!("high".parse::<Priority>(), Ok(Priority::High));

        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.to_string(), "invalid priority 'urgent'");
    }

    #[test]
    fn test_serde_matches_text_form() {
        for status in ProjectStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        for status in TaskStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_toggled_is_an_involution() {
        for status in SubtaskStatus::ALL {
            assert_ne!(status.toggled(), status);
            assert_eq!(status.toggled().toggled(), status);
        }
    }

    #[test]
    fn test_progress_percent_rounds_half_up() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(0, 4), 0);
        assert_eq!(progress_percent(1, 8), 13); // 12.5
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(5, 16), 31); // 31.25
        assert_eq!(progress_percent(4, 4), 100);
    }

    #[test]
    fn test_new_task_accepts_camel_case() {
        let body = r#"{"projectId":"p1","name":"Build","estimatedHours":8,"dueDate":"2025-03-01"}"#;
        let task: NewTask = serde_json::from_str(body).unwrap();
        assert_eq!(task.project_id.as_deref(), Some("p1"));
        assert_eq!(task.estimated_hours, Some(8));
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert!(task.status.is_none());
    }

    #[test]
    fn test_patch_separates_null_from_absent() {
        let patch: TaskPatch =
            serde_json::from_str(r#"{"assignee":null,"estimatedHours":4}"#).unwrap();
        assert_eq!(patch.assignee, Some(None));
        assert_eq!(patch.estimated_hours, Some(Some(4)));
        assert_eq!(patch.due_date, None);
        assert_eq!(patch.description, None);

        let patch: SubtaskPatch = serde_json::from_str(r#"{"notes":null}"#).unwrap();
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.assignee, None);
    }

    #[test]
    fn test_patch_rejects_unknown_status() {
        let result = serde_json::from_str::<TaskPatch>(r#"{"status":"finished"}"#);
        assert!(result.is_err());
    }
}
