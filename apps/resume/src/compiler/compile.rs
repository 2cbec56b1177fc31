use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::compiler::engine::LatexEngine;
use crate::compiler::CompileError;
use crate::config::pdf_name_for;

/// Compiles project directories to PDF.
///
/// Each compile runs in its own private temporary directory, so concurrent
/// compiles never see each other's aux files, and the project directory only
/// ever receives the finished PDF.
pub struct ResumeCompiler {
    engine: Arc<dyn LatexEngine>,
    main_tex: String,
}

impl ResumeCompiler {
    pub fn new(engine: Arc<dyn LatexEngine>, main_tex: impl Into<String>) -> Self {
        ResumeCompiler {
            engine,
            main_tex: main_tex.into(),
        }
    }

    pub fn pdf_name(&self) -> String {
        pdf_name_for(&self.main_tex)
    }

    /// Compiles `project_dir/<main_tex>`, copying the resulting PDF back into
    /// `project_dir`. Returns the PDF's path.
    pub async fn compile_project(&self, project_dir: &Path) -> Result<PathBuf, CompileError> {
        if !tokio::fs::try_exists(project_dir.join(&self.main_tex)).await? {
            return Err(CompileError::MissingMain(self.main_tex.clone()));
        }

        // Removed on drop, on every exit path including timeouts.
        let workdir = tempfile::Builder::new()
            .prefix("instant_resume-")
            .tempdir()?;
        let copied = stage_sources(project_dir.to_path_buf(), workdir.path().to_path_buf()).await?;
        info!(
            "Compiling {} ({copied} files staged in {})",
            project_dir.display(),
            workdir.path().display()
        );

        let output = self.engine.run(workdir.path(), &self.main_tex, None).await?;

        let pdf_name = self.pdf_name();
        let built_pdf = workdir.path().join(&pdf_name);
        if !tokio::fs::try_exists(&built_pdf).await? {
            warn!("No PDF produced for {}", project_dir.display());
            return Err(CompileError::Failed(output.diagnostics().to_string()));
        }
        if !output.success {
            // nonstopmode often yields a usable PDF alongside recoverable errors.
            warn!("Engine exited non-zero but produced {pdf_name}");
        }

        let target = project_dir.join(&pdf_name);
        tokio::fs::copy(&built_pdf, &target).await?;
        info!("Compilation successful: {}", target.display());
        Ok(target)
    }
}

/// Copies every regular top-level file except `.json` metadata into `workdir`.
async fn stage_sources(project_dir: PathBuf, workdir: PathBuf) -> Result<usize, CompileError> {
    tokio::task::spawn_blocking(move || -> Result<usize, CompileError> {
        let mut copied = 0;
        for entry in std::fs::read_dir(&project_dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_json = path.extension().is_some_and(|e| e == "json");
            if entry.file_type()?.is_file() && !is_json {
                std::fs::copy(&path, workdir.join(entry.file_name()))?;
                copied += 1;
            }
        }
        Ok(copied)
    })
    .await?
}
