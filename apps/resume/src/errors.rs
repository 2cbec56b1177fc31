use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::compiler::CompileError;
use crate::projects::ProjectError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Compilation failed: {0}")]
    Compile(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ProjectError> for AppError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::NotFound(_) | ProjectError::FileNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            ProjectError::AlreadyExists(_) => AppError::Conflict(err.to_string()),
            ProjectError::InvalidName(_)
            | ProjectError::InvalidFileName(_)
            | ProjectError::Protected(_) => AppError::Validation(err.to_string()),
            ProjectError::Io(_) | ProjectError::Metadata(_) => {
                AppError::Internal(anyhow::Error::new(err))
            }
        }
    }
}

impl From<CompileError> for AppError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::Io(_) | CompileError::Join(_) => {
                AppError::Internal(anyhow::Error::new(err))
            }
            other => AppError::Compile(other.to_string()),
        }
    }
}

/// Malformed bodies and missing required fields are client errors.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Compile(msg) => {
                tracing::warn!("Compilation failed: {msg}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "COMPILE_ERROR",
                    msg.clone(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_errors_map_to_statuses() {
        let cases = [
            (ProjectError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ProjectError::AlreadyExists("x".into()), StatusCode::CONFLICT),
            (ProjectError::Protected("default".into()), StatusCode::BAD_REQUEST),
            (ProjectError::InvalidName("../x".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_compile_failure_is_unprocessable() {
        let response = AppError::from(CompileError::Timeout(30)).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
