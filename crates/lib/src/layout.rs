//! Directory layout of the local mirror.
//!
//! Every path the library touches is built here so the on-disk contract stays in
//! one place:
//!
//! ```text
//! <root>/users.json
//! <root>/<alias>/projects.json
//! <root>/<alias>/<project_id>/augmentations.json
//! <root>/<alias>/<project_id>/qr/{admin,pub}/
//! <root>/<alias>/<project_id>/<augmentation_id>/{augmented_file,cxs,target_image}/
//! ```
//!
//! Project and augmentation directories are keyed by [`RemoteId`], never by title.

use std::path::{Path, PathBuf};

use crate::{
    constants::{
        AUGMENTATIONS_MANIFEST, MODEL_DIR, PROJECTS_MANIFEST, QR_DIR, QR_PRIVATE_DIR,
        QR_PUBLIC_DIR, SESSION_DIR, TARGET_IMAGE_DIR, USERS_MANIFEST,
    },
    model::{FileKind, RemoteId, id::is_path_safe_name},
};

/// Path builder rooted at the installation directory.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn users_manifest(&self) -> PathBuf {
        self.root.join(USERS_MANIFEST)
    }

    /// Aliases are validated before they reach here, so they are safe as directory names.
    pub fn user_dir(&self, alias: &str) -> PathBuf {
        self.root.join(alias)
    }

    pub fn projects_manifest(&self, alias: &str) -> PathBuf {
        self.user_dir(alias).join(PROJECTS_MANIFEST)
    }

    pub fn project_dir(&self, alias: &str, project: &RemoteId) -> PathBuf {
        self.user_dir(alias).join(project.as_str())
    }

    pub fn augmentations_manifest(&self, alias: &str, project: &RemoteId) -> PathBuf {
        self.project_dir(alias, project).join(AUGMENTATIONS_MANIFEST)
    }

    pub fn qr_dir(&self, alias: &str, project: &RemoteId, field: QrVisibility) -> PathBuf {
        let leaf = match field {
            QrVisibility::Public => QR_PUBLIC_DIR,
            QrVisibility::Private => QR_PRIVATE_DIR,
        };
        self.project_dir(alias, project).join(QR_DIR).join(leaf)
    }

    pub fn augmentation_dir(
        &self,
        alias: &str,
        project: &RemoteId,
        augmentation: &RemoteId,
    ) -> PathBuf {
        self.project_dir(alias, project).join(augmentation.as_str())
    }

    /// Directory holding the single file of an augmentation field.
    ///
    /// Returns `None` for project-level fields.
    pub fn augmentation_field_dir(
        &self,
        alias: &str,
        project: &RemoteId,
        augmentation: &RemoteId,
        field: FileKind,
    ) -> Option<PathBuf> {
        let leaf = match field {
            FileKind::Model => MODEL_DIR,
            FileKind::Session => SESSION_DIR,
            FileKind::TargetImage => TARGET_IMAGE_DIR,
            FileKind::QrPublic | FileKind::QrPrivate => return None,
        };
        Some(self.augmentation_dir(alias, project, augmentation).join(leaf))
    }

    /// Names inside a project directory that are never augmentation directories.
    pub fn is_reserved_project_entry(name: &str) -> bool {
        name == QR_DIR || name == AUGMENTATIONS_MANIFEST
    }

    /// True if `name` can be a project directory inside a user directory.
    pub fn is_project_dir_name(name: &str) -> bool {
        is_path_safe_name(name) && name != PROJECTS_MANIFEST
    }

    /// True if `name` can be an augmentation directory inside a project directory.
    pub fn is_augmentation_dir_name(name: &str) -> bool {
        is_path_safe_name(name) && !Self::is_reserved_project_entry(name)
    }
}

/// Which half of a project's QR pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrVisibility {
    Public,
    Private,
}

impl QrVisibility {
    pub fn field(&self) -> FileKind {
        match self {
            QrVisibility::Public => FileKind::QrPublic,
            QrVisibility::Private => FileKind::QrPrivate,
        }
    }
}

/// Create `dir` and its parents, then return it.
pub(crate) async fn ensure_dir(dir: PathBuf) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(&dir).await?;
    Ok(dir)
}

/// Remove every regular file directly inside `dir`, keeping the directory.
pub(crate) async fn empty_dir(dir: &Path) -> std::io::Result<()> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            tokio::fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}

/// First non-hidden regular file in `dir`, in name order.
pub(crate) async fn first_file(dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_keyed_by_remote_id() {
        let layout = Layout::new("/data");
        let project = RemoteId::new("QR1");
        let aug = RemoteId::new("A1");
        assert_eq!(
            layout.augmentations_manifest("alice", &project),
            PathBuf::from("/data/alice/QR1/augmentations.json")
        );
        assert_eq!(
            layout.qr_dir("alice", &project, QrVisibility::Private),
            PathBuf::from("/data/alice/QR1/qr/admin")
        );
        assert_eq!(
            layout.augmentation_field_dir("alice", &project, &aug, FileKind::Session),
            Some(PathBuf::from("/data/alice/QR1/A1/cxs"))
        );
        assert_eq!(
            layout.augmentation_field_dir("alice", &project, &aug, FileKind::QrPublic),
            None
        );
    }

    #[test]
    fn test_reserved_entries() {
        assert!(Layout::is_reserved_project_entry("qr"));
        assert!(Layout::is_reserved_project_entry("augmentations.json"));
        assert!(!Layout::is_reserved_project_entry("A1"));
    }

    #[test]
    fn test_dir_names_stay_below_parent() {
        assert!(Layout::is_project_dir_name("QR1"));
        assert!(!Layout::is_project_dir_name("projects.json"));
        assert!(!Layout::is_project_dir_name(".."));
        assert!(Layout::is_augmentation_dir_name("A1"));
        assert!(!Layout::is_augmentation_dir_name("qr"));
        assert!(!Layout::is_augmentation_dir_name("a/../b"));
    }

    #[tokio::test]
    async fn test_first_file_skips_hidden_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(".hidden"), b"x").await.unwrap();
        tokio::fs::create_dir(dir.path().join("sub")).await.unwrap();
        assert_eq!(first_file(dir.path()).await.unwrap(), None);

        tokio::fs::write(dir.path().join("b.png"), b"x").await.unwrap();
        tokio::fs::write(dir.path().join("a.png"), b"x").await.unwrap();
        assert_eq!(
            first_file(dir.path()).await.unwrap(),
            Some(dir.path().join("a.png"))
        );

        empty_dir(dir.path()).await.unwrap();
        assert_eq!(first_file(dir.path()).await.unwrap(), None);
        assert!(dir.path().join("sub").is_dir());
    }
}
