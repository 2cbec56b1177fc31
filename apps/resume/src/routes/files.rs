use axum::{extract::Path, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::routes::ApiJson;
use crate::state::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub resume_files: Vec<String>,
    pub pdf_available: bool,
    pub resume_dir: String,
    pub current_project: String,
}

#[derive(Serialize)]
pub struct FileResponse {
    pub filename: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct SaveFileRequest {
    pub content: String,
}

/// GET /api/status
pub async fn handle_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    let current = state.projects.current_project().await;
    let resume_files = state.projects.list_files(&current).await?;
    let pdf_available = state
        .projects
        .pdf_path(&current, &state.compiler.pdf_name())
        .await
        .is_some();
    let resume_dir = state.projects.project_dir(&current)?.display().to_string();

    Ok(Json(StatusResponse {
        status: "ready",
        resume_files,
        pdf_available,
        resume_dir,
        current_project: current,
    }))
}

/// GET /api/files/:filename
pub async fn handle_get_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let current = state.projects.current_project().await;
    let content = state.projects.read_file(&current, &filename).await?;
    Ok(Json(FileResponse { filename, content }))
}

/// PUT /api/files/:filename
pub async fn handle_save_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    ApiJson(req): ApiJson<SaveFileRequest>,
) -> Result<Json<Value>, AppError> {
    let current = state.projects.current_project().await;
    state
        .projects
        .write_file(&current, &filename, req.content)
        .await?;
    Ok(Json(json!({ "success": true, "filename": filename })))
}
