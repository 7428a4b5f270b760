//! HTTP server for the project tracker REST API.
//!
//! Handlers call the synchronous [`Database`] directly; the connection mutex
//! is held only for the duration of each query.

mod dashboard;
mod projects;
mod subtasks;
mod tasks;

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::{get, patch, post},
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::CorsConfig;
use crate::db::Database;
use crate::error::ApiError;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Database>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }
}

/// Body of delete responses.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    timestamp: String,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Project Management API is running",
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found() -> ApiError {
    ApiError::route_not_found()
}

/// CORS for the configured origins; an empty list allows any origin.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ]);

    if config.allowed_origins.is_empty() {
        info!("CORS: allowing all origins");
        return cors.allow_origin(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    info!(origins = ?config.allowed_origins, "CORS: allowing configured origins");

    cors.allow_origin(origins)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
}

/// Build the API router.
pub fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/api/health", get(health))
        // Dashboard and reporting
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route("/api/dashboard/workload", get(dashboard::workload))
        .route("/api/board", get(dashboard::board))
        .route("/api/reports/html", get(dashboard::html_report))
        // Projects
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        // Tasks
        .route(
            "/api/tasks/project/{project_id}",
            get(tasks::list_project_tasks),
        )
        .route("/api/tasks", post(tasks::create_task))
        .route(
            "/api/tasks/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        // Subtasks
        .route("/api/subtasks", post(subtasks::create_subtask))
        .route(
            "/api/subtasks/{id}",
            get(subtasks::get_subtask)
                .put(subtasks::update_subtask)
                .delete(subtasks::delete_subtask),
        )
        .route("/api/subtasks/{id}/toggle", patch(subtasks::toggle_subtask))
        .fallback(not_found)
        .layer(build_cors_layer(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve in a background task. Send on the returned channel (or
/// drop it) to shut down, then await the handle to let in-flight requests
/// finish.
pub async fn start_server(
    state: AppState,
    addr: &str,
    cors: &CorsConfig,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr, JoinHandle<()>)> {
    let app = build_router(state, cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Server listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Server shutting down");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr, handle))
}
