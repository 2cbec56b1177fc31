use axum::{extract::Path, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::projects::{CreateProject, ProjectMeta};
use crate::routes::ApiJson;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectMeta>,
    pub current: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateRequest {
    pub new_name: String,
    pub new_display_name: String,
}

#[derive(Deserialize)]
pub struct SetCurrentRequest {
    pub project: String,
}

/// GET /api/projects
pub async fn handle_list_projects(
    State(state): State<AppState>,
) -> Result<Json<ProjectListResponse>, AppError> {
    let projects = state.projects.list_projects().await?;
    let current = state.projects.current_project().await;
    Ok(Json(ProjectListResponse { projects, current }))
}

/// POST /api/projects
pub async fn handle_create_project(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateProject>,
) -> Result<Json<Value>, AppError> {
    state.projects.create_project(&req).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Project created successfully"
    })))
}

/// POST /api/projects/:name/duplicate
pub async fn handle_duplicate_project(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ApiJson(req): ApiJson<DuplicateRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .projects
        .duplicate_project(&name, &req.new_name, &req.new_display_name)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Project duplicated successfully"
    })))
}

/// DELETE /api/projects/:name
pub async fn handle_delete_project(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.projects.delete_project(&name).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Project deleted successfully"
    })))
}

/// PUT /api/projects/current
pub async fn handle_set_current(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SetCurrentRequest>,
) -> Result<Json<Value>, AppError> {
    let current = state.projects.set_current_project(&req.project).await?;
    Ok(Json(json!({ "success": true, "current": current })))
}
