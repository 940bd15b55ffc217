//! Editor session linkage.
//!
//! The library stores a session snapshot per augmentation under `cxs/` and never
//! looks inside it. Capturing and restoring the snapshot belongs to whatever
//! editor is on the other side of [`SessionLinkage`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::{
    Result,
    layout::{empty_dir, first_file},
    model::FileKind,
    store::LocalStore,
    transfer::{AugmentationTarget, TransferError, default_file_name},
};

/// The editor-side half of session save/open.
#[async_trait]
pub trait SessionLinkage: Send + Sync {
    /// Serialize the current editor session.
    async fn capture_session(&self) -> Result<Vec<u8>>;

    /// Load a previously captured session into the editor.
    async fn restore_session(&self, snapshot: &[u8]) -> Result<()>;
}

/// [`SessionLinkage`] backed by a session file the editor reads and writes.
#[derive(Debug, Clone)]
pub struct FileSessionLinkage {
    path: PathBuf,
}

impl FileSessionLinkage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionLinkage for FileSessionLinkage {
    async fn capture_session(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|source| {
            TransferError::FileIo {
                path: self.path.clone(),
                source,
            }
            .into()
        })
    }

    async fn restore_session(&self, snapshot: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, snapshot).await.map_err(|source| {
            TransferError::FileIo {
                path: self.path.clone(),
                source,
            }
            .into()
        })
    }
}

/// Store a session snapshot for `target` as `<title>-session.cxs`.
///
/// An existing `source` file is copied as-is; otherwise the session is captured
/// from `linkage`. Marks the augmentation as having a session.
pub async fn save_session(
    store: &LocalStore,
    target: &AugmentationTarget,
    linkage: &dyn SessionLinkage,
    source: Option<&Path>,
) -> Result<PathBuf> {
    let snapshot = match source.filter(|p| p.is_file()) {
        Some(path) => tokio::fs::read(path)
            .await
            .map_err(|e| io_error(path, e))?,
        None => linkage.capture_session().await?,
    };
    let (alias, project, augmentation) = (
        &target.user.alias,
        &target.project.remote_id,
        &target.augmentation.remote_id,
    );
    let dir = store
        .augmentation_field_dir(alias, project, augmentation, FileKind::Session)
        .await?;
    empty_dir(&dir).await.map_err(|e| io_error(&dir, e))?;
    let path = dir.join(default_file_name(&target.augmentation.title, FileKind::Session));
    tokio::fs::write(&path, &snapshot)
        .await
        .map_err(|e| io_error(&path, e))?;
    store
        .update_augmentation(alias, project, augmentation, |a| a.has_session = true)
        .await?;
    info!(augmentation = %augmentation, "Saved session");
    Ok(path)
}

/// Restore the stored session for `target` through `linkage`.
///
/// Returns `None` when no session has been saved yet.
pub async fn open_session(
    store: &LocalStore,
    target: &AugmentationTarget,
    linkage: &dyn SessionLinkage,
) -> Result<Option<PathBuf>> {
    let dir = store
        .augmentation_field_dir(
            &target.user.alias,
            &target.project.remote_id,
            &target.augmentation.remote_id,
            FileKind::Session,
        )
        .await?;
    let Some(path) = first_file(&dir).await.map_err(|e| io_error(&dir, e))? else {
        info!(augmentation = %target.augmentation.title, "No session saved yet");
        return Ok(None);
    };
    let snapshot = tokio::fs::read(&path)
        .await
        .map_err(|e| io_error(&path, e))?;
    linkage.restore_session(&snapshot).await?;
    Ok(Some(path))
}

fn io_error(path: &Path, source: std::io::Error) -> crate::Error {
    TransferError::FileIo {
        path: path.to_path_buf(),
        source,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::model::{
        AugmentationKind, AugmentationRecord, Credential, ProjectRecord, ProjectType, RemoteId,
    };

    #[derive(Default)]
    struct RecordingLinkage {
        current: Mutex<Vec<u8>>,
    }

    #[async_trait]
    impl SessionLinkage for RecordingLinkage {
        async fn capture_session(&self) -> Result<Vec<u8>> {
            Ok(self.current.lock().unwrap().clone())
        }

        async fn restore_session(&self, snapshot: &[u8]) -> Result<()> {
            *self.current.lock().unwrap() = snapshot.to_vec();
            Ok(())
        }
    }

    async fn target(store: &LocalStore) -> AugmentationTarget {
        let user = store
            .upsert_user("alice", Credential::new("tok"))
            .await
            .unwrap();
        let project = store
            .insert_project(
                "alice",
                ProjectRecord {
                    remote_id: RemoteId::new("P1"),
                    title: "Paper".to_string(),
                    project_type: ProjectType::Paper,
                    url: None,
                },
            )
            .await
            .unwrap();
        let augmentation = store
            .insert_augmentation(
                "alice",
                &project.remote_id,
                AugmentationRecord {
                    remote_id: RemoteId::new("A1"),
                    title: "Protein".to_string(),
                    kind: AugmentationKind::Model,
                    has_target_image: false,
                    has_model_file: false,
                    has_session: false,
                    target_image_url: None,
                    model_url: None,
                    tracking_score: None,
                },
            )
            .await
            .unwrap();
        AugmentationTarget {
            user,
            project,
            augmentation,
        }
    }

    #[tokio::test]
    async fn test_capture_then_restore() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let target = target(&store).await;
        let linkage = RecordingLinkage::default();

        assert_eq!(open_session(&store, &target, &linkage).await?, None);

        *linkage.current.lock().unwrap() = b"scene-1".to_vec();
        let saved = save_session(&store, &target, &linkage, None).await?;
        assert!(saved.ends_with("Protein-session.cxs"));

        *linkage.current.lock().unwrap() = b"scene-2".to_vec();
        let opened = open_session(&store, &target, &linkage).await?;
        assert_eq!(opened, Some(saved));
        assert_eq!(*linkage.current.lock().unwrap(), b"scene-1");

        let record = store
            .require_augmentation("alice", &target.project, "Protein")
            .await?;
        assert!(record.has_session);
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_file_is_copied_not_captured() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("home"));
        let target = target(&store).await;
        let external = dir.path().join("outside.cxs");
        tokio::fs::write(&external, b"from-disk").await?;

        let editor = FileSessionLinkage::new(dir.path().join("editor.cxs"));
        let saved = save_session(&store, &target, &editor, Some(&external)).await?;
        assert_eq!(tokio::fs::read(&saved).await?, b"from-disk");

        open_session(&store, &target, &editor).await?;
        assert_eq!(tokio::fs::read(editor.path()).await?, b"from-disk");
        Ok(())
    }
}
