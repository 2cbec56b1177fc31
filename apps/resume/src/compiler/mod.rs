pub mod build;
pub mod compile;
pub mod engine;
pub mod watch;

use thiserror::Error;

pub use build::Builder;
pub use compile::ResumeCompiler;
pub use engine::{probe_engine, LatexEngine, PdfLatex};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("LaTeX engine '{0}' not found. Please install a TeX distribution")]
    EngineMissing(String),

    #[error("Compilation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Main document '{0}' not found")]
    MissingMain(String),

    #[error("Compilation failed: {0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
