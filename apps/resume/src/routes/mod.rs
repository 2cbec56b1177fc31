pub mod compile;
pub mod files;
pub mod health;
pub mod projects;

use axum::{
    extract::FromRequest,
    http::{header, HeaderValue},
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer};

use crate::errors::AppError;
use crate::state::AppState;

/// `Json` whose rejections (bad syntax, missing fields) become
/// `AppError::Validation`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

pub fn build_router(state: AppState) -> Router {
    // Editor assets change during development; never let the browser cache them.
    let frontend = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .service(ServeDir::new(&state.config.frontend_dir).append_index_html_on_directories(true));

    Router::new()
        .route("/health", get(health::health_handler))
        // Projects
        .route(
            "/api/projects",
            get(projects::handle_list_projects).post(projects::handle_create_project),
        )
        .route("/api/projects/current", put(projects::handle_set_current))
        .route(
            "/api/projects/:name/duplicate",
            post(projects::handle_duplicate_project),
        )
        .route("/api/projects/:name", delete(projects::handle_delete_project))
        // Files of the current project
        .route("/api/status", get(files::handle_status))
        .route(
            "/api/files/:filename",
            get(files::handle_get_file).put(files::handle_save_file),
        )
        // Compilation
        .route("/api/compile", post(compile::handle_compile))
        .route("/api/pdf", get(compile::handle_view_pdf))
        .route("/api/pdf/download", get(compile::handle_download_pdf))
        .fallback_service(frontend)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::compiler::compile::tests::FakeEngine;
    use crate::config::Config;

    async fn test_app() -> (tempfile::TempDir, AppState, Router) {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::for_tests(tmp.path());
        std::fs::create_dir_all(&config.frontend_dir).unwrap();
        std::fs::write(config.frontend_dir.join("index.html"), "<h1>editor</h1>").unwrap();

        let state = AppState::new(config, Arc::new(FakeEngine::default()))
            .await
            .unwrap();
        let app = build_router(state.clone());
        (tmp, state, app)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (_tmp, _state, app) = test_app().await;
        let response = send(&app, Method::GET, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "instant-resume");
    }

    #[tokio::test]
    async fn test_project_lifecycle() {
        let (_tmp, _state, app) = test_app().await;

        let response = send(
            &app,
            Method::POST,
            "/api/projects",
            Some(json!({"name": "sre", "displayName": "SRE roles", "template": "default"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);

        let response = send(
            &app,
            Method::POST,
            "/api/projects/sre/duplicate",
            Some(json!({"newName": "sre-v2", "newDisplayName": "SRE v2"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let listing = json_body(send(&app, Method::GET, "/api/projects", None).await).await;
        let names: Vec<&str> = listing["projects"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"default"));
        assert!(names.contains(&"sre"));
        assert!(names.contains(&"sre-v2"));
        assert_eq!(listing["current"], "default");

        let response = send(&app, Method::DELETE, "/api/projects/sre", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&app, Method::DELETE, "/api/projects/sre", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let (_tmp, _state, app) = test_app().await;
        let body = json!({"name": "dup", "displayName": "Dup"});
        send(&app, Method::POST, "/api/projects", Some(body.clone())).await;
        let response = send(&app, Method::POST, "/api/projects", Some(body)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_missing_fields_are_bad_requests() {
        let (_tmp, _state, app) = test_app().await;
        let response = send(&app, Method::POST, "/api/projects", Some(json!({"name": "x"}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, Method::PUT, "/api/files/cv-llt.tex", Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, Method::PUT, "/api/projects/current", Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_default_project_is_protected() {
        let (_tmp, _state, app) = test_app().await;
        let response = send(&app, Method::DELETE, "/api/projects/default", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_switch_project_and_edit_files() {
        let (_tmp, state, app) = test_app().await;
        send(
            &app,
            Method::POST,
            "/api/projects",
            Some(json!({"name": "alt", "displayName": "Alt"})),
        )
        .await;

        let response = send(
            &app,
            Method::PUT,
            "/api/projects/current",
            Some(json!({"project": "alt"})),
        )
        .await;
        assert_eq!(json_body(response).await["current"], "alt");

        let response = send(
            &app,
            Method::PUT,
            "/api/files/skills.tex",
            Some(json!({"content": "\\begin{rubric}{Skills}"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let file = json_body(send(&app, Method::GET, "/api/files/skills.tex", None).await).await;
        assert_eq!(file["filename"], "skills.tex");
        assert_eq!(file["content"], "\\begin{rubric}{Skills}");

        let written = state.projects.project_dir("alt").unwrap().join("skills.tex");
        assert!(written.exists());

        let status = json_body(send(&app, Method::GET, "/api/status", None).await).await;
        assert_eq!(status["status"], "ready");
        assert_eq!(status["current_project"], "alt");
        assert_eq!(status["pdf_available"], false);
        assert!(status["resume_files"]
            .as_array()
            .unwrap()
            .contains(&json!("skills.tex")));
    }

    #[tokio::test]
    async fn test_unknown_project_cannot_become_current() {
        let (_tmp, _state, app) = test_app().await;
        let response = send(
            &app,
            Method::PUT,
            "/api/projects/current",
            Some(json!({"project": "ghost"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_file_errors() {
        let (_tmp, _state, app) = test_app().await;
        let response = send(&app, Method::GET, "/api/files/missing.tex", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(&app, Method::GET, "/api/files/project.json", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_compile_then_fetch_pdf() {
        let (_tmp, _state, app) = test_app().await;
        let response = send(&app, Method::GET, "/api/pdf", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        send(
            &app,
            Method::PUT,
            "/api/files/cv-llt.tex",
            Some(json!({"content": "\\documentclass{article}"})),
        )
        .await;
        let response = send(&app, Method::POST, "/api/compile", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);

        let response = send(&app, Method::GET, "/api/pdf", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "inline; filename=\"resume.pdf\""
        );

        let response = send(&app, Method::GET, "/api/pdf/download", None).await;
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"resume.pdf\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.5 stub");
    }

    #[tokio::test]
    async fn test_compile_failure_is_unprocessable() {
        let (_tmp, _state, app) = test_app().await;
        send(
            &app,
            Method::PUT,
            "/api/files/cv-llt.tex",
            Some(json!({"content": "\\fail"})),
        )
        .await;
        let response = send(&app, Method::POST, "/api/compile", None).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Undefined control sequence"));
    }

    #[tokio::test]
    async fn test_frontend_is_served_uncached() {
        let (_tmp, _state, app) = test_app().await;
        let response = send(&app, Method::GET, "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "no-cache, no-store, must-revalidate"
        );
    }
}
