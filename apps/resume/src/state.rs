use std::sync::Arc;

use crate::compiler::{LatexEngine, ResumeCompiler};
use crate::config::Config;
use crate::projects::{ProjectError, ProjectManager};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub projects: Arc<ProjectManager>,
    pub compiler: Arc<ResumeCompiler>,
}

impl AppState {
    /// Opens the projects root and makes sure the default project exists.
    pub async fn new(config: Config, engine: Arc<dyn LatexEngine>) -> Result<Self, ProjectError> {
        let projects =
            ProjectManager::open(config.projects_dir.clone(), config.default_project.clone()).await?;
        projects.ensure_default().await?;
        let compiler = ResumeCompiler::new(engine, config.main_tex.clone());
        Ok(AppState {
            config,
            projects: Arc::new(projects),
            compiler: Arc::new(compiler),
        })
    }
}
