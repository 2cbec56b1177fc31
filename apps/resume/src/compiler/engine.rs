//! The external LaTeX engine behind a trait, so the compile pipeline can be
//! exercised without a TeX installation.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::compiler::CompileError;

/// Captured result of one engine run.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl EngineOutput {
    /// The most useful diagnostic text: stderr, or stdout when stderr is
    /// empty (pdflatex reports errors on stdout).
    pub fn diagnostics(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

#[async_trait]
pub trait LatexEngine: Send + Sync {
    /// Compiles `main_tex` inside `workdir`, optionally writing outputs to
    /// `outdir`. A non-zero exit is reported in `EngineOutput`, not as `Err`.
    async fn run(
        &self,
        workdir: &Path,
        main_tex: &str,
        outdir: Option<&Path>,
    ) -> Result<EngineOutput, CompileError>;
}

/// `pdflatex` (or a compatible engine) as a subprocess.
#[derive(Debug, Clone)]
pub struct PdfLatex {
    program: String,
    timeout: Duration,
}

impl PdfLatex {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        PdfLatex {
            program: program.into(),
            timeout,
        }
    }

    pub fn args(main_tex: &str, outdir: Option<&Path>) -> Vec<String> {
        let mut args = vec!["-interaction=nonstopmode".to_string()];
        if let Some(outdir) = outdir {
            args.push(format!("-output-directory={}", outdir.display()));
        }
        args.push(main_tex.to_string());
        args
    }
}

#[async_trait]
impl LatexEngine for PdfLatex {
    async fn run(
        &self,
        workdir: &Path,
        main_tex: &str,
        outdir: Option<&Path>,
    ) -> Result<EngineOutput, CompileError> {
        let args = Self::args(main_tex, outdir);
        debug!("Running: {} {}", self.program, args.join(" "));

        let child = Command::new(&self.program)
            .args(&args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Err(_) => return Err(CompileError::Timeout(self.timeout.as_secs())),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CompileError::EngineMissing(self.program.clone()))
            }
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(output)) => output,
        };

        Ok(EngineOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Checks that the engine binary runs. Used at startup to warn early.
pub async fn probe_engine(program: &str) -> bool {
    match Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
    {
        Ok(output) if output.status.success() => {
            info!("{program} is available");
            true
        }
        _ => {
            warn!("{program} not found - PDF compilation will fail");
            false
        }
    }
}
