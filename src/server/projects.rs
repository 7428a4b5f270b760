//! Project endpoints.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::{AppState, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::types::{NewProject, Project, ProjectPatch};

/// GET /api/projects - every project with tasks and subtasks, newest first.
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.db().list_projects()?))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    state
        .db()
        .get_project(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::project_not_found(&id))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    body: Result<Json<NewProject>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let Json(input) = body?;
    let project = state.db().create_project(input)?;
    tracing::info!(project_id = %project.id, name = %project.name, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/projects/{id} - partial update; `progress` is ignored.
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ProjectPatch>, JsonRejection>,
) -> ApiResult<Json<Project>> {
    let Json(patch) = body?;
    Ok(Json(state.db().update_project(&id, patch)?))
}

/// DELETE /api/projects/{id} - cascades to tasks and subtasks.
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.db().delete_project(&id)?;
    tracing::info!(project_id = %id, "Project deleted");
    Ok(Json(MessageResponse {
        message: "Project deleted successfully",
    }))
}
