//! The `build` command: compile the resume directory into a separate build
//! directory and keep the sources free of LaTeX auxiliary files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::compiler::engine::{EngineOutput, LatexEngine};
use crate::compiler::CompileError;
use crate::config::pdf_name_for;

pub const AUX_EXTENSIONS: &[&str] = &[
    ".aux",
    ".fdb_latexmk",
    ".fls",
    ".log",
    ".out",
    ".synctex.gz",
    ".bbl",
    ".blg",
    ".bcf",
    ".run.xml",
    ".cut",
    ".toc",
    ".lof",
    ".lot",
    ".nav",
    ".snm",
    ".vrb",
];

/// Matches on the file name's ending so multi-dot suffixes work.
pub fn is_aux_file(name: &str) -> bool {
    AUX_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

#[derive(Debug)]
pub struct BuildReport {
    pub success: bool,
    pub pdf: Option<PathBuf>,
    pub output: EngineOutput,
    pub moved_aux: usize,
}

pub struct Builder {
    resume_dir: PathBuf,
    build_dir: PathBuf,
    main_tex: String,
    verbose: bool,
    engine: Arc<dyn LatexEngine>,
}

impl Builder {
    pub fn new(
        resume_dir: PathBuf,
        build_dir: PathBuf,
        main_tex: impl Into<String>,
        verbose: bool,
        engine: Arc<dyn LatexEngine>,
    ) -> Self {
        Builder {
            resume_dir,
            build_dir,
            main_tex: main_tex.into(),
            verbose,
            engine,
        }
    }

    pub fn resume_dir(&self) -> &Path {
        &self.resume_dir
    }

    pub async fn build(&self, clean: bool) -> Result<BuildReport, CompileError> {
        if clean && tokio::fs::try_exists(&self.build_dir).await? {
            info!("Cleaning {}", self.build_dir.display());
            tokio::fs::remove_dir_all(&self.build_dir).await?;
        }
        tokio::fs::create_dir_all(&self.build_dir).await?;

        let removed = clean_aux_files(&self.resume_dir).await?;
        if removed > 0 {
            debug!("Removed {removed} stale aux files from {}", self.resume_dir.display());
        }

        // The engine runs inside the resume dir, so a relative build dir
        // would resolve against the wrong base.
        let outdir = std::path::absolute(&self.build_dir)?;
        info!("Building {} -> {}", self.main_tex, outdir.display());
        let output = self
            .engine
            .run(&self.resume_dir, &self.main_tex, Some(&outdir))
            .await?;

        if self.verbose {
            println!("{}", output.stdout);
            if !output.stderr.is_empty() {
                eprintln!("{}", output.stderr);
            }
        }

        let pdf = outdir.join(pdf_name_for(&self.main_tex));
        let pdf_exists = tokio::fs::try_exists(&pdf).await?;
        let moved_aux = move_aux_files(&self.resume_dir, &outdir).await?;

        let success = output.success && pdf_exists;
        if success {
            info!("Build successful: {}", pdf.display());
        } else {
            warn!("Build failed");
        }
        Ok(BuildReport {
            success,
            pdf: pdf_exists.then_some(pdf),
            output,
            moved_aux,
        })
    }
}

async fn aux_files_in(dir: &Path) -> Result<Vec<PathBuf>, CompileError> {
    let mut found = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() && is_aux_file(&entry.file_name().to_string_lossy()) {
            found.push(entry.path());
        }
    }
    Ok(found)
}

async fn clean_aux_files(dir: &Path) -> Result<usize, CompileError> {
    let files = aux_files_in(dir).await?;
    for file in &files {
        tokio::fs::remove_file(file).await?;
    }
    Ok(files.len())
}

async fn move_aux_files(from: &Path, to: &Path) -> Result<usize, CompileError> {
    let files = aux_files_in(from).await?;
    for file in &files {
        if let Some(name) = file.file_name() {
            tokio::fs::rename(file, to.join(name)).await?;
        }
    }
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile::tests::FakeEngine;

    fn setup(main: &str) -> (tempfile::TempDir, PathBuf, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let resume = tmp.path().join("resume");
        let build = tmp.path().join("build");
        std::fs::create_dir_all(&resume).unwrap();
        std::fs::write(resume.join("cv-llt.tex"), main).unwrap();
        (tmp, resume, build)
    }

    #[test]
    fn test_aux_suffixes() {
        assert!(is_aux_file("cv-llt.aux"));
        assert!(is_aux_file("cv-llt.synctex.gz"));
        assert!(is_aux_file("cv-llt.run.xml"));
        assert!(!is_aux_file("cv-llt.tex"));
        assert!(!is_aux_file("cv-llt.pdf"));
    }

    #[tokio::test]
    async fn test_build_writes_pdf_to_build_dir() {
        let (_tmp, resume, build) = setup("ok");
        std::fs::write(resume.join("old.aux"), "stale").unwrap();

        let builder = Builder::new(
            resume.clone(),
            build.clone(),
            "cv-llt.tex",
            false,
            Arc::new(FakeEngine::default()),
        );
        let report = builder.build(false).await.unwrap();

        assert!(report.success);
        assert_eq!(report.pdf, Some(build.join("cv-llt.pdf")));
        assert!(!resume.join("old.aux").exists());
        assert!(!build.join("old.aux").exists());
    }

    #[tokio::test]
    async fn test_clean_build_removes_previous_output() {
        let (_tmp, resume, build) = setup("ok");
        std::fs::create_dir_all(&build).unwrap();
        std::fs::write(build.join("leftover.txt"), "x").unwrap();

        let builder = Builder::new(resume, build.clone(), "cv-llt.tex", false, Arc::new(FakeEngine::default()));
        assert!(builder.build(true).await.unwrap().success);
        assert!(!build.join("leftover.txt").exists());
    }

    #[tokio::test]
    async fn test_failed_build_has_no_pdf() {
        let (_tmp, resume, build) = setup("\\fail");
        let builder = Builder::new(resume, build, "cv-llt.tex", false, Arc::new(FakeEngine::default()));
        let report = builder.build(false).await.unwrap();
        assert!(!report.success);
        assert!(report.pdf.is_none());
        assert!(report.output.diagnostics().contains("Undefined"));
    }

    #[tokio::test]
    async fn test_aux_files_left_in_sources_are_moved() {
        let tmp = tempfile::tempdir().unwrap();
        let (src, out) = (tmp.path().join("src"), tmp.path().join("out"));
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(src.join("cv.log"), "l").unwrap();
        std::fs::write(src.join("cv.tex"), "t").unwrap();

        assert_eq!(move_aux_files(&src, &out).await.unwrap(), 1);
        assert!(out.join("cv.log").exists());
        assert!(src.join("cv.tex").exists());
    }
}
