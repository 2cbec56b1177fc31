// Structured résumé content: the YAML source every renderer reads from.

pub mod model;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub use model::{Contact, Degree, Job, Project, ProjectKind, ResumeContent, SkillList, SkillTable};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid résumé YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ResumeContent {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ContentError> {
        // An empty document parses as YAML null; treat it as empty content.
        if yaml.trim().is_empty() {
            return Ok(ResumeContent::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Reads and parses a `content.yaml` file.
pub fn load_content(path: &Path) -> Result<ResumeContent, ContentError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| ContentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let content = ResumeContent::from_yaml_str(&yaml)?;
    debug!(
        "Loaded {} jobs, {} degrees, {} projects, {} skill categories from {}",
        content.employment.len(),
        content.education.len(),
        content.projects.len(),
        content.skills.len(),
        path.display()
    );
    Ok(content)
}
