//! Read-only aggregate endpoints: stats, workload, board and the HTML report.

use axum::{
    Json,
    extract::{Query, State},
    response::Html,
};
use chrono::Utc;
use serde::Deserialize;

use super::AppState;
use crate::error::ApiResult;
use crate::report::render_html_report;
use crate::types::{AssigneeWorkload, BoardColumn, DashboardStats};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardQuery {
    pub project_id: Option<String>,
}

/// GET /api/dashboard/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    let today = Utc::now().date_naive();
    Ok(Json(state.db().dashboard_stats(today)?))
}

/// GET /api/dashboard/workload
pub async fn workload(State(state): State<AppState>) -> ApiResult<Json<Vec<AssigneeWorkload>>> {
    Ok(Json(state.db().workload()?))
}

/// GET /api/board?projectId=
pub async fn board(
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> ApiResult<Json<Vec<BoardColumn>>> {
    let project_id = query.project_id.as_deref().filter(|id| !id.is_empty());
    Ok(Json(state.db().board(project_id)?))
}

/// GET /api/reports/html
pub async fn html_report(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let now = Utc::now();
    let projects = state.db().list_projects()?;
    let stats = state.db().dashboard_stats(now.date_naive())?;
    let generated_at = now.format("%Y-%m-%d %H:%M UTC").to_string();
    Ok(Html(render_html_report(&projects, &stats, &generated_at)))
}
