use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::projects::ProjectError;

pub const META_FILE: &str = "project.json";

/// Contents of a project's `project.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub created: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub last_modified: Option<DateTime<Utc>>,
    /// Keys this version doesn't know about, carried through rewrites.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Accepts RFC 3339 timestamps and zone-less ISO 8601 ones (read as UTC).
/// Anything else is treated as unknown rather than failing the whole file.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| parse_timestamp(&s)))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

impl ProjectMeta {
    /// Fresh metadata with both timestamps set to now.
    pub fn new(name: &str, display_name: &str, description: &str) -> Self {
        let now = Utc::now();
        ProjectMeta {
            name: name.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            created: Some(now),
            last_modified: Some(now),
            extra: serde_json::Map::new(),
        }
    }

    /// Stand-in for a project whose metadata is unreadable. No timestamps:
    /// nothing is known about the project's history.
    pub fn fallback(dir_name: &str) -> Self {
        ProjectMeta {
            name: dir_name.to_string(),
            display_name: dir_name.to_string(),
            description: String::new(),
            created: None,
            last_modified: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn touch(&mut self) {
        self.last_modified = Some(Utc::now());
    }
}

/// Outcome of reading `project.json`.
#[derive(Debug)]
pub enum MetaRead {
    Found(ProjectMeta),
    Missing,
    Corrupt,
}

pub fn meta_path(project_dir: &Path) -> PathBuf {
    project_dir.join(META_FILE)
}

pub async fn read_meta(project_dir: &Path) -> Result<MetaRead, ProjectError> {
    let path = meta_path(project_dir);
    let raw = match tokio::fs::read(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(MetaRead::Missing),
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_slice::<ProjectMeta>(&raw) {
        Ok(meta) => Ok(MetaRead::Found(meta)),
        Err(e) => {
            warn!("Corrupt metadata at {}: {e}", path.display());
            Ok(MetaRead::Corrupt)
        }
    }
}

/// Writes `project.json` atomically: a reader never sees a half-written file.
pub async fn write_meta(project_dir: &Path, meta: &ProjectMeta) -> Result<(), ProjectError> {
    let json = serde_json::to_vec_pretty(meta)?;
    write_atomic(meta_path(project_dir), json).await
}

/// Writes `bytes` to a temp file beside `path`, then renames it into place.
pub async fn write_atomic(path: PathBuf, bytes: Vec<u8>) -> Result<(), ProjectError> {
    tokio::task::spawn_blocking(move || -> Result<(), ProjectError> {
        use std::io::Write;

        let dir = path
            .parent()
            .ok_or_else(|| ProjectError::Io(std::io::Error::other("path has no parent")))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| ProjectError::Io(e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| ProjectError::Io(std::io::Error::other(e)))?
}
