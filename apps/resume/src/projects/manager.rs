//! Project lifecycle: list, create, duplicate, delete, and the current selection.
//!
//! # Consistency
//! Every mutation of a project directory or its `project.json` holds
//! `lifecycle`, so a metadata read-modify-write never interleaves with another
//! one or with the directory being created, copied or removed underneath it.
//! Plain reads (file contents, the PDF) take no lock; metadata itself is
//! always replaced atomically, so readers see either the old or the new file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::projects::metadata::{read_meta, write_meta, MetaRead, ProjectMeta};
use crate::projects::{validate_project_name, ProjectError};

/// Files copied from a template project into a new one.
const TEMPLATE_EXTENSIONS: &[&str] = &["tex", "sty", "jpg", "png"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub template: Option<String>,
}

pub struct ProjectManager {
    root: PathBuf,
    default_project: String,
    current: RwLock<String>,
    lifecycle: Mutex<()>,
}

impl ProjectManager {
    /// Opens (and creates if needed) the projects root. The current project
    /// starts as the default one.
    pub async fn open(root: PathBuf, default_project: String) -> Result<Self, ProjectError> {
        validate_project_name(&default_project)?;
        tokio::fs::create_dir_all(&root).await?;
        Ok(ProjectManager {
            root,
            current: RwLock::new(default_project.clone()),
            default_project,
            lifecycle: Mutex::new(()),
        })
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lifecycle.lock().await
    }

    /// Directory of a validated project name. Does not check existence.
    pub fn project_dir(&self, name: &str) -> Result<PathBuf, ProjectError> {
        validate_project_name(name)?;
        Ok(self.root.join(name))
    }

    /// Directory of an existing project.
    pub async fn existing_dir(&self, name: &str) -> Result<PathBuf, ProjectError> {
        let dir = self.project_dir(name)?;
        if is_dir(&dir).await {
            Ok(dir)
        } else {
            Err(ProjectError::NotFound(name.to_string()))
        }
    }

    pub async fn current_project(&self) -> String {
        self.current.read().await.clone()
    }

    /// Holds the lifecycle lock so the project can't be deleted between the
    /// existence check and the switch.
    pub async fn set_current_project(&self, name: &str) -> Result<String, ProjectError> {
        let _guard = self.lock().await;
        self.existing_dir(name).await?;
        let mut current = self.current.write().await;
        *current = name.to_string();
        info!("Current project is now '{name}'");
        Ok(current.clone())
    }

    /// Every project directory's metadata, sorted by name.
    ///
    /// Corrupt metadata is reported with a fallback entry and left on disk
    /// for the user to fix; missing metadata is synthesized and written.
    pub async fn list_projects(&self) -> Result<Vec<ProjectMeta>, ProjectError> {
        let mut projects = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy().into_owned();
            if validate_project_name(&dir_name).is_err() {
                continue;
            }

            let meta = match read_meta(&entry.path()).await? {
                MetaRead::Found(meta) => meta,
                MetaRead::Corrupt => ProjectMeta::fallback(&dir_name),
                MetaRead::Missing => self.synthesize_meta(&entry.path(), &dir_name).await?,
            };
            projects.push(meta);
        }

        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn synthesize_meta(&self, dir: &Path, dir_name: &str) -> Result<ProjectMeta, ProjectError> {
        let _guard = self.lock().await;
        // Another request may have written it while we waited.
        if let MetaRead::Found(meta) = read_meta(dir).await? {
            return Ok(meta);
        }
        let meta = ProjectMeta::new(dir_name, dir_name, "");
        write_meta(dir, &meta).await?;
        info!("Created missing metadata for project '{dir_name}'");
        Ok(meta)
    }

    pub async fn create_project(&self, request: &CreateProject) -> Result<ProjectMeta, ProjectError> {
        let dir = self.project_dir(&request.name)?;
        let template_dir = match &request.template {
            Some(template) if !template.is_empty() => Some(self.project_dir(template)?),
            _ => None,
        };

        let _guard = self.lock().await;
        if tokio::fs::try_exists(&dir).await? {
            return Err(ProjectError::AlreadyExists(request.name.clone()));
        }
        tokio::fs::create_dir_all(&dir).await?;

        let result: Result<ProjectMeta, ProjectError> = async {
            if let Some(template_dir) = template_dir {
                if is_dir(&template_dir).await {
                    let copied = copy_template_files(template_dir, dir.clone()).await?;
                    info!("Copied {copied} template files into '{}'", request.name);
                } else {
                    warn!(
                        "Template project {} not found; creating '{}' empty",
                        template_dir.display(),
                        request.name
                    );
                }
            }
            let meta = ProjectMeta::new(&request.name, &request.display_name, &request.description);
            write_meta(&dir, &meta).await?;
            Ok(meta)
        }
        .await;

        if result.is_err() {
            remove_partial(&dir).await;
        } else {
            info!("Created project '{}'", request.name);
        }
        result
    }

    pub async fn duplicate_project(
        &self,
        source: &str,
        new_name: &str,
        new_display_name: &str,
    ) -> Result<ProjectMeta, ProjectError> {
        let source_dir = self.project_dir(source)?;
        let new_dir = self.project_dir(new_name)?;

        let _guard = self.lock().await;
        if !is_dir(&source_dir).await {
            return Err(ProjectError::NotFound(source.to_string()));
        }
        if tokio::fs::try_exists(&new_dir).await? {
            return Err(ProjectError::AlreadyExists(new_name.to_string()));
        }

        let result: Result<ProjectMeta, ProjectError> = async {
            copy_dir_recursive(source_dir, new_dir.clone()).await?;

            let mut meta = match read_meta(&new_dir).await? {
                MetaRead::Found(meta) => meta,
                MetaRead::Missing | MetaRead::Corrupt => ProjectMeta::fallback(new_name),
            };
            let fresh = ProjectMeta::new(new_name, new_display_name, "");
            meta.name = fresh.name;
            meta.display_name = fresh.display_name;
            meta.created = fresh.created;
            meta.last_modified = fresh.last_modified;
            write_meta(&new_dir, &meta).await?;
            Ok(meta)
        }
        .await;

        if result.is_err() {
            remove_partial(&new_dir).await;
        } else {
            info!("Duplicated project '{source}' as '{new_name}'");
        }
        result
    }

    pub async fn delete_project(&self, name: &str) -> Result<(), ProjectError> {
        let dir = self.project_dir(name)?;
        if name == self.default_project {
            return Err(ProjectError::Protected(name.to_string()));
        }

        let _guard = self.lock().await;
        if !is_dir(&dir).await {
            return Err(ProjectError::NotFound(name.to_string()));
        }
        tokio::fs::remove_dir_all(&dir).await?;

        let mut current = self.current.write().await;
        if *current == name {
            *current = self.default_project.clone();
            info!("Deleted the current project; switched to '{}'", self.default_project);
        }
        info!("Deleted project '{name}'");
        Ok(())
    }

    /// Creates the default project if it is missing.
    pub async fn ensure_default(&self) -> Result<(), ProjectError> {
        let dir = self.project_dir(&self.default_project)?;
        if is_dir(&dir).await {
            return Ok(());
        }
        warn!("Default project not found, creating...");
        let request = CreateProject {
            name: self.default_project.clone(),
            display_name: "My Resume".to_string(),
            description: "Main resume project".to_string(),
            template: None,
        };
        match self.create_project(&request).await {
            Ok(_) | Err(ProjectError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Rewrites `lastModified` in a project's metadata. Caller holds the lock.
    pub(crate) async fn touch_locked(&self, dir: &Path, name: &str) -> Result<(), ProjectError> {
        let mut meta = match read_meta(dir).await? {
            MetaRead::Found(meta) => meta,
            // Don't clobber a file the user may want to repair by hand.
            MetaRead::Corrupt => return Ok(()),
            MetaRead::Missing => ProjectMeta::new(name, name, ""),
        };
        meta.touch();
        write_meta(dir, &meta).await
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

async fn remove_partial(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        warn!("Failed to clean up partial project {}: {e}", dir.display());
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.contains(&e))
}

/// Copies top-level template files (sources and images) into `dest`.
async fn copy_template_files(src: PathBuf, dest: PathBuf) -> Result<usize, ProjectError> {
    tokio::task::spawn_blocking(move || -> Result<usize, ProjectError> {
        let mut copied = 0;
        for entry in std::fs::read_dir(&src)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && has_extension(&path, TEMPLATE_EXTENSIONS) {
                std::fs::copy(&path, dest.join(entry.file_name()))?;
                copied += 1;
            }
        }
        Ok(copied)
    })
    .await
    .map_err(|e| ProjectError::Io(std::io::Error::other(e)))?
}

/// Recursively copies `src` to a new directory `dest`. Symlinks are skipped.
async fn copy_dir_recursive(src: PathBuf, dest: PathBuf) -> Result<(), ProjectError> {
    tokio::task::spawn_blocking(move || -> Result<(), ProjectError> {
        std::fs::create_dir_all(&dest)?;
        for entry in WalkDir::new(&src).min_depth(1) {
            let entry = entry.map_err(|e| ProjectError::Io(e.into()))?;
            let relative = entry
                .path()
                .strip_prefix(&src)
                .map_err(|e| ProjectError::Io(std::io::Error::other(e)))?;
            let target = dest.join(relative);
            let file_type = entry.file_type();
            if file_type.is_dir() {
                std::fs::create_dir_all(&target)?;
            } else if file_type.is_file() {
                std::fs::copy(entry.path(), &target)?;
            }
        }
        Ok(())
    })
    .await
    .map_err(|e| ProjectError::Io(std::io::Error::other(e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn manager() -> (tempfile::TempDir, ProjectManager) {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ProjectManager::open(tmp.path().join("projects"), "default".to_string())
            .await
            .unwrap();
        manager.ensure_default().await.unwrap();
        (tmp, manager)
    }

    fn create(name: &str, template: Option<&str>) -> CreateProject {
        CreateProject {
            name: name.to_string(),
            display_name: format!("{name} display"),
            description: "desc".to_string(),
            template: template.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_ensure_default_creates_metadata() {
        let (_tmp, manager) = manager().await;
        let projects = manager.list_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "default");
        assert_eq!(projects[0].display_name, "My Resume");
    }

    #[tokio::test]
    async fn test_create_copies_template_sources_only() {
        let (_tmp, manager) = manager().await;
        let default_dir = manager.project_dir("default").unwrap();
        std::fs::write(default_dir.join("cv-llt.tex"), "main").unwrap();
        std::fs::write(default_dir.join("photo.png"), [0u8; 4]).unwrap();
        std::fs::write(default_dir.join("cv-llt.pdf"), "pdf").unwrap();

        manager.create_project(&create("sre", Some("default"))).await.unwrap();
        let dir = manager.project_dir("sre").unwrap();
        assert!(dir.join("cv-llt.tex").is_file());
        assert!(dir.join("photo.png").is_file());
        assert!(!dir.join("cv-llt.pdf").exists());
        assert!(dir.join("project.json").is_file());
    }

    #[tokio::test]
    async fn test_create_rejects_existing_and_invalid() {
        let (_tmp, manager) = manager().await;
        assert!(matches!(
            manager.create_project(&create("default", None)).await,
            Err(ProjectError::AlreadyExists(_))
        ));
        assert!(matches!(
            manager.create_project(&create("../escape", None)).await,
            Err(ProjectError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_rewrites_identity_keeps_description() {
        let (_tmp, manager) = manager().await;
        let source_dir = manager.project_dir("default").unwrap();
        std::fs::create_dir(source_dir.join("figures")).unwrap();
        std::fs::write(source_dir.join("figures").join("a.png"), [1u8]).unwrap();

        let meta = manager
            .duplicate_project("default", "copy", "Copy of resume")
            .await
            .unwrap();
        assert_eq!(meta.name, "copy");
        assert_eq!(meta.display_name, "Copy of resume");
        assert_eq!(meta.description, "Main resume project");
        assert!(manager.project_dir("copy").unwrap().join("figures/a.png").is_file());
    }

    #[tokio::test]
    async fn test_duplicate_errors() {
        let (_tmp, manager) = manager().await;
        assert!(matches!(
            manager.duplicate_project("missing", "x", "X").await,
            Err(ProjectError::NotFound(_))
        ));
        assert!(matches!(
            manager.duplicate_project("default", "default", "X").await,
            Err(ProjectError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_protects_default_and_resets_current() {
        let (_tmp, manager) = manager().await;
        assert!(matches!(
            manager.delete_project("default").await,
            Err(ProjectError::Protected(_))
        ));

        manager.create_project(&create("temp", None)).await.unwrap();
        manager.set_current_project("temp").await.unwrap();
        manager.delete_project("temp").await.unwrap();
        assert_eq!(manager.current_project().await, "default");
        assert!(matches!(
            manager.delete_project("temp").await,
            Err(ProjectError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_set_current_requires_existing_project() {
        let (_tmp, manager) = manager().await;
        assert!(matches!(
            manager.set_current_project("nope").await,
            Err(ProjectError::NotFound(_))
        ));
        assert_eq!(manager.current_project().await, "default");
    }

    #[tokio::test]
    async fn test_list_handles_missing_and_corrupt_metadata() {
        let (tmp, manager) = manager().await;
        let root = tmp.path().join("projects");
        std::fs::create_dir(root.join("bare")).unwrap();
        std::fs::create_dir(root.join("broken")).unwrap();
        std::fs::write(root.join("broken").join("project.json"), "{").unwrap();
        std::fs::write(root.join("stray.txt"), "not a project").unwrap();

        let projects = manager.list_projects().await.unwrap();
        let names: Vec<_> = projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["bare", "broken", "default"]);
        assert!(root.join("bare").join("project.json").is_file());
        // Corrupt file left untouched.
        assert_eq!(std::fs::read_to_string(root.join("broken/project.json")).unwrap(), "{");
    }

    #[tokio::test]
    async fn test_concurrent_creates_of_same_name_yield_one_winner() {
        let (_tmp, manager) = manager().await;
        let manager = Arc::new(manager);
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.create_project(&create("race", None)).await })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(ProjectError::AlreadyExists(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_duplicate_keeps_unknown_metadata_keys() {
        let (_tmp, manager) = manager().await;
        let dir = manager.project_dir("default").unwrap();
        std::fs::write(
            dir.join("project.json"),
            r#"{"name": "default", "displayName": "My Resume", "tags": ["sre"], "targetRole": "SRE"}"#,
        )
        .unwrap();

        let meta = manager.duplicate_project("default", "copy", "Copy").await.unwrap();
        assert_eq!(meta.extra["targetRole"], "SRE");
        let written =
            std::fs::read_to_string(manager.project_dir("copy").unwrap().join("project.json")).unwrap();
        assert!(written.contains("targetRole"));
        assert!(written.contains("tags"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_current_never_points_at_a_deleted_project() {
        let (_tmp, manager) = manager().await;
        let manager = Arc::new(manager);

        for round in 0..100 {
            let name = format!("p{round}");
            manager.create_project(&create(&name, None)).await.unwrap();

            let switch = {
                let manager = Arc::clone(&manager);
                let name = name.clone();
                tokio::spawn(async move { manager.set_current_project(&name).await })
            };
            let delete = {
                let manager = Arc::clone(&manager);
                let name = name.clone();
                tokio::spawn(async move { manager.delete_project(&name).await })
            };
            let _ = switch.await.unwrap();
            delete.await.unwrap().unwrap();

            let current = manager.current_project().await;
            assert!(
                manager.project_dir(&current).unwrap().is_dir(),
                "current project '{current}' was deleted in round {round}"
            );
        }
    }
}
