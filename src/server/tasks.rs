//! Task endpoints. The database layer runs the progress rollup after each
//! mutation.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::{AppState, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::types::{NewTask, Task, TaskPatch};

/// GET /api/tasks/project/{project_id}
pub async fn list_project_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.db().list_tasks_for_project(&project_id)?))
}

/// GET /api/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    state
        .db()
        .get_task(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::task_not_found(&id))
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<NewTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(input) = body?;
    let task = state.db().create_task(input)?;
    tracing::info!(task_id = %task.id, project_id = %task.project_id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /api/tasks/{id}
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TaskPatch>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let Json(patch) = body?;
    Ok(Json(state.db().update_task(&id, patch)?))
}

/// DELETE /api/tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let project_id = state.db().delete_task(&id)?;
    tracing::info!(task_id = %id, %project_id, "Task deleted");
    Ok(Json(MessageResponse {
        message: "Task deleted successfully",
    }))
}
