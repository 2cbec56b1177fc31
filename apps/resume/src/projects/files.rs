//! File CRUD on a project's LaTeX sources.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::projects::metadata::write_atomic;
use crate::projects::{validate_file_name, ProjectError, ProjectManager};

/// Extensions listed in the editor's file picker.
const LISTED_EXTENSIONS: &[&str] = &["tex", "sty"];

impl ProjectManager {
    /// Sorted `.tex` and `.sty` file names of a project. An unknown project
    /// has no files.
    pub async fn list_files(&self, project: &str) -> Result<Vec<String>, ProjectError> {
        let dir = match self.existing_dir(project).await {
            Ok(dir) => dir,
            Err(ProjectError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let listed = name
                .rsplit_once('.')
                .is_some_and(|(_, ext)| LISTED_EXTENSIONS.contains(&ext));
            if listed {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }

    pub async fn read_file(&self, project: &str, file_name: &str) -> Result<String, ProjectError> {
        validate_file_name(file_name)?;
        let path = self.existing_dir(project).await?.join(file_name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ProjectError::FileNotFound(file_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically replaces (or creates) a source file, then bumps the
    /// project's `lastModified`.
    pub async fn write_file(
        &self,
        project: &str,
        file_name: &str,
        content: String,
    ) -> Result<(), ProjectError> {
        validate_file_name(file_name)?;

        let _guard = self.lock().await;
        // Checked under the lock: the project may be deleted concurrently.
        let dir = self.existing_dir(project).await?;
        write_atomic(dir.join(file_name), content.into_bytes()).await?;
        self.touch_locked(&dir, project).await?;

        info!("Saved {file_name} in project '{project}'");
        Ok(())
    }

    /// Path of the project's compiled PDF, if there is one.
    pub async fn pdf_path(&self, project: &str, pdf_name: &str) -> Option<PathBuf> {
        let dir = self.existing_dir(project).await.ok()?;
        let path = dir.join(pdf_name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => {
                debug!("No PDF at {}", path.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::projects::metadata::{read_meta, MetaRead};
    use crate::projects::{ProjectError, ProjectManager};

    async fn manager() -> (tempfile::TempDir, ProjectManager) {
        let tmp = tempfile::tempdir().unwrap();
        let manager = ProjectManager::open(tmp.path().join("projects"), "default".to_string())
            .await
            .unwrap();
        manager.ensure_default().await.unwrap();
        (tmp, manager)
    }

    #[tokio::test]
    async fn test_write_then_read_and_list() {
        let (_tmp, manager) = manager().await;
        manager
            .write_file("default", "skills.tex", "\\begin{rubric}".to_string())
            .await
            .unwrap();
        manager
            .write_file("default", "cv-llt.tex", "main".to_string())
            .await
            .unwrap();
        manager
            .write_file("default", "refs.bib", "@book{}".to_string())
            .await
            .unwrap();

        assert_eq!(
            manager.read_file("default", "skills.tex").await.unwrap(),
            "\\begin{rubric}"
        );
        // .bib is editable but not listed.
        assert_eq!(
            manager.list_files("default").await.unwrap(),
            vec!["cv-llt.tex".to_string(), "skills.tex".to_string()]
        );
    }

    #[tokio::test]
    async fn test_write_bumps_last_modified() {
        let (_tmp, manager) = manager().await;
        let dir = manager.project_dir("default").unwrap();
        let before = match read_meta(&dir).await.unwrap() {
            MetaRead::Found(meta) => meta.last_modified,
            other => panic!("{other:?}"),
        };
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        manager
            .write_file("default", "a.tex", String::new())
            .await
            .unwrap();
        let after = match read_meta(&dir).await.unwrap() {
            MetaRead::Found(meta) => meta.last_modified,
            other => panic!("{other:?}"),
        };
        assert!(after > before);
    }

    #[tokio::test]
    async fn test_read_errors() {
        let (_tmp, manager) = manager().await;
        assert!(matches!(
            manager.read_file("default", "missing.tex").await,
            Err(ProjectError::FileNotFound(_))
        ));
        assert!(matches!(
            manager.read_file("default", "project.json").await,
            Err(ProjectError::InvalidFileName(_))
        ));
        assert!(matches!(
            manager.read_file("ghost", "cv.tex").await,
            Err(ProjectError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_write_to_deleted_project_fails() {
        let (_tmp, manager) = manager().await;
        assert!(matches!(
            manager.write_file("ghost", "a.tex", String::new()).await,
            Err(ProjectError::NotFound(_))
        ));
        assert!(!manager.project_dir("ghost").unwrap().exists());
    }

    #[tokio::test]
    async fn test_pdf_path_only_when_present() {
        let (_tmp, manager) = manager().await;
        assert!(manager.pdf_path("default", "cv-llt.pdf").await.is_none());
        let dir = manager.project_dir("default").unwrap();
        std::fs::write(dir.join("cv-llt.pdf"), b"%PDF").unwrap();
        assert_eq!(
            manager.pdf_path("default", "cv-llt.pdf").await,
            Some(dir.join("cv-llt.pdf"))
        );
    }

    #[tokio::test]
    async fn test_list_files_of_unknown_project_is_empty() {
        let (_tmp, manager) = manager().await;
        assert!(manager.list_files("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_keeps_unknown_metadata_keys() {
        let (_tmp, manager) = manager().await;
        let dir = manager.project_dir("default").unwrap();
        std::fs::write(
            dir.join("project.json"),
            r#"{"name": "default", "displayName": "My Resume", "tags": ["sre"], "targetRole": "SRE"}"#,
        )
        .unwrap();

        manager
            .write_file("default", "a.tex", String::new())
            .await
            .unwrap();
        let after = std::fs::read_to_string(dir.join("project.json")).unwrap();
        assert!(after.contains("targetRole"));
        assert!(after.contains("\"sre\""));
        assert!(after.contains("lastModified"));
    }
}
