//! Structured error type for API responses.
//!
//! Database functions return `anyhow::Result`; domain failures travel inside
//! the `anyhow::Error` as an [`ApiError`] and are recovered by downcast at the
//! HTTP boundary. Anything else becomes a generic 500.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    InvalidBody,

    // Not found errors
    ProjectNotFound,
    TaskNotFound,
    SubtaskNotFound,
    RouteNotFound,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFieldValue
            | ErrorCode::InvalidBody => StatusCode::BAD_REQUEST,
            ErrorCode::ProjectNotFound
            | ErrorCode::TaskNotFound
            | ErrorCode::SubtaskNotFound
            | ErrorCode::RouteNotFound => StatusCode::NOT_FOUND,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured error returned to API clients as `{"error": ..., "code": ...}`.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    #[serde(rename = "error")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn invalid_body(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidBody, reason)
    }

    pub fn project_not_found(project_id: &str) -> Self {
        Self::new(
            ErrorCode::ProjectNotFound,
            format!("Project not found: {}", project_id),
        )
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn subtask_not_found(subtask_id: &str) -> Self {
        Self::new(
            ErrorCode::SubtaskNotFound,
            format!("Subtask not found: {}", subtask_id),
        )
    }

    pub fn route_not_found() -> Self {
        Self::new(ErrorCode::RouteNotFound, "API endpoint not found")
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    /// Generic 500. Details stay in the server log.
    pub fn internal() -> Self {
        Self::new(ErrorCode::InternalError, "Internal server error")
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ApiError>() {
            Ok(api_err) => return api_err,
            Err(err) => err,
        };
        tracing::error!(error = %format!("{:#}", err), "Unhandled error");
        match err.downcast_ref::<rusqlite::Error>() {
            Some(db_err) => ApiError::database(db_err),
            None => ApiError::internal(),
        }
    }
}

// Malformed bodies, wrong content type and values serde rejects (unknown
// enum text, bad dates) all surface as 400.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_body(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            // Database messages may leak schema details.
            let public = ApiError {
                code: self.code,
                message: "Internal server error".to_string(),
                field: None,
            };
            return (status, Json(public)).into_response();
        }
        (status, Json(self)).into_response()
    }
}

/// Result type for HTTP handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
