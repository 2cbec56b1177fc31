use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

/// Name the browser sees, whatever the main document is called.
const PDF_DOWNLOAD_NAME: &str = "resume.pdf";

/// POST /api/compile
pub async fn handle_compile(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let current = state.projects.current_project().await;
    let dir = state.projects.existing_dir(&current).await?;
    state.compiler.compile_project(&dir).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Compilation successful"
    })))
}

/// GET /api/pdf
pub async fn handle_view_pdf(State(state): State<AppState>) -> Result<Response, AppError> {
    serve_pdf(&state, "inline").await
}

/// GET /api/pdf/download
pub async fn handle_download_pdf(State(state): State<AppState>) -> Result<Response, AppError> {
    serve_pdf(&state, "attachment").await
}

async fn serve_pdf(state: &AppState, disposition: &str) -> Result<Response, AppError> {
    let current = state.projects.current_project().await;
    let path = state
        .projects
        .pdf_path(&current, &state.compiler.pdf_name())
        .await
        .ok_or_else(|| AppError::NotFound("PDF not available".to_string()))?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("reading compiled PDF")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("{disposition}; filename=\"{PDF_DOWNLOAD_NAME}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
