// Project management: named résumé directories under the projects root,
// each with a `project.json` and the LaTeX sources the editor works on.

pub mod files;
pub mod manager;
pub mod metadata;

use thiserror::Error;

pub use manager::{CreateProject, ProjectManager};
pub use metadata::ProjectMeta;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project '{0}' not found")]
    NotFound(String),

    #[error("Project '{0}' already exists")]
    AlreadyExists(String),

    #[error("Project '{0}' cannot be deleted")]
    Protected(String),

    #[error("Invalid project name '{0}'")]
    InvalidName(String),

    #[error("Invalid file name '{0}'")]
    InvalidFileName(String),

    #[error("File '{0}' not found")]
    FileNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

const MAX_PROJECT_NAME: usize = 64;
const MAX_FILE_NAME: usize = 128;

/// Extensions the editor may read and write.
pub const EDITABLE_EXTENSIONS: &[&str] = &["tex", "sty", "bib", "cls"];

/// A single path component of `[A-Za-z0-9._-]`, not hidden, not `..`.
fn is_safe_component(name: &str, max_len: usize) -> bool {
    !name.is_empty()
        && name.len() <= max_len
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

pub fn validate_project_name(name: &str) -> Result<(), ProjectError> {
    if is_safe_component(name, MAX_PROJECT_NAME) {
        Ok(())
    } else {
        Err(ProjectError::InvalidName(name.to_string()))
    }
}

pub fn validate_file_name(name: &str) -> Result<(), ProjectError> {
    let editable = name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| EDITABLE_EXTENSIONS.contains(&ext));
    if editable && is_safe_component(name, MAX_FILE_NAME) {
        Ok(())
    } else {
        Err(ProjectError::InvalidFileName(name.to_string()))
    }
}
