//! Subtask endpoints.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;

use super::{AppState, MessageResponse};
use crate::error::{ApiError, ApiResult};
use crate::types::{NewSubtask, Subtask, SubtaskPatch, SubtaskStatus};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub message: &'static str,
    pub new_status: SubtaskStatus,
    pub subtask: Subtask,
}

/// GET /api/subtasks/{id}
pub async fn get_subtask(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Subtask>> {
    state
        .db()
        .get_subtask(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::subtask_not_found(&id))
}

/// POST /api/subtasks
pub async fn create_subtask(
    State(state): State<AppState>,
    body: Result<Json<NewSubtask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Subtask>)> {
    let Json(input) = body?;
    let subtask = state.db().create_subtask(input)?;
    Ok((StatusCode::CREATED, Json(subtask)))
}

/// PUT /api/subtasks/{id}
pub async fn update_subtask(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<SubtaskPatch>, JsonRejection>,
) -> ApiResult<Json<Subtask>> {
    let Json(patch) = body?;
    Ok(Json(state.db().update_subtask(&id, patch)?))
}

/// PATCH /api/subtasks/{id}/toggle
pub async fn toggle_subtask(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ToggleResponse>> {
    let subtask = state.db().toggle_subtask(&id)?;
    tracing::debug!(subtask_id = %id, status = %subtask.status, "Subtask toggled");
    Ok(Json(ToggleResponse {
        message: "Subtask status updated successfully",
        new_status: subtask.status,
        subtask,
    }))
}

/// DELETE /api/subtasks/{id}
pub async fn delete_subtask(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.db().delete_subtask(&id)?;
    Ok(Json(MessageResponse {
        message: "Subtask deleted successfully",
    }))
}
