// Word document output, from YAML content or from a project's `.tex` sections.

pub mod layout;
pub mod writer;

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::content::{Contact, ContentError, ResumeContent};
use crate::latex::{clean_latex, parse_project_dir};

pub use layout::{build_blocks, build_blocks_with, ContactLabels, DocStyle};
pub use writer::write_docx;

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("failed to pack document: {0}")]
    Pack(String),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Contact card and summary for documents built from `.tex` sections, which
/// carry neither.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactSheet {
    pub contact: Contact,
    pub summary: String,
}

/// Renders `content` in `style` and writes it to `path`.
pub fn generate_docx(content: &ResumeContent, style: DocStyle, path: &Path) -> Result<(), DocxError> {
    let bytes = write_docx(&build_blocks(content, style), style)?;
    write_bytes(path, &bytes)?;
    info!("Generated {:?} Word document: {}", style, path.display());
    Ok(())
}

/// Builds a machine-readable document from a project's hand-edited `.tex`
/// sections. Contact items are labelled (`Email: ...`) since there is no
/// styling to tell them apart.
pub fn docx_from_tex(project_dir: &Path, sheet: ContactSheet, path: &Path) -> Result<(), DocxError> {
    let content = content_from_tex(project_dir, sheet)?;

    let blocks = build_blocks_with(&content, DocStyle::Ats, ContactLabels::Labelled);
    let bytes = write_docx(&blocks, DocStyle::Ats)?;
    write_bytes(path, &bytes)?;
    info!(
        "Generated Word document from {} ({} jobs, {} degrees, {} projects): {}",
        project_dir.display(),
        content.employment.len(),
        content.education.len(),
        content.projects.len(),
        path.display()
    );
    Ok(())
}

/// Parsed sections plus the contact sheet. The summary may be pasted from
/// a `.tex` file, so it gets the same cleanup as the sections.
fn content_from_tex(project_dir: &Path, sheet: ContactSheet) -> Result<ResumeContent, DocxError> {
    let mut content = parse_project_dir(project_dir)?;
    content.contact = sheet.contact;
    content.summary = clean_latex(&sheet.summary);
    Ok(content)
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), DocxError> {
    std::fs::write(path, bytes).map_err(|source| DocxError::Write {
        path: path.display().to_string(),
        source,
    })
}
