//! Local state store.
//!
//! Owns the manifest hierarchy (users -> projects -> augmentations) and the
//! directory skeleton derived from it. Records are looked up by title, stored and
//! compared by remote id. A new project or augmentation record can only be
//! inserted with an id the remote service has already allocated.

use std::path::{Path, PathBuf};

use crate::{
    Result,
    layout::{Layout, QrVisibility, ensure_dir},
    model::{AugmentationRecord, Credential, FileKind, ProjectRecord, RemoteId, UserRecord},
    validation::{NameScope, validate_name},
};

pub mod errors;
pub mod manifest;

pub use errors::StoreError;
pub use manifest::{Manifest, ManifestEntry};

/// Handle on the local mirror rooted at one directory.
///
/// The store holds no manifest state of its own: each operation loads the
/// manifests it needs, mutates them, and persists them before returning.
#[derive(Debug, Clone)]
pub struct LocalStore {
    layout: Layout,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: Layout::new(root),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Create the root directory and an empty users manifest if they do not exist.
    pub async fn init(&self) -> Result<()> {
        let root = self.layout.root().to_path_buf();
        create_dir(&root).await?;
        let manifest_path = self.layout.users_manifest();
        if !tokio::fs::try_exists(&manifest_path)
            .await
            .unwrap_or(false)
        {
            Manifest::<UserRecord>::load(manifest_path).await?.save().await?;
        }
        Ok(())
    }

    // === Users ===

    pub async fn users(&self) -> Result<Manifest<UserRecord>> {
        Manifest::load(self.layout.users_manifest()).await
    }

    pub async fn list_users(&self) -> Result<Vec<String>> {
        Ok(self.users().await?.keys())
    }

    pub async fn find_user(&self, alias: &str) -> Result<Option<UserRecord>> {
        Ok(self.users().await?.by_key(alias).cloned())
    }

    pub async fn require_user(&self, alias: &str) -> Result<UserRecord> {
        self.find_user(alias).await?.ok_or_else(|| {
            StoreError::UserNotFound {
                alias: alias.to_string(),
            }
            .into()
        })
    }

    /// Insert or replace the credential for `alias` and ensure the user directory exists.
    pub async fn upsert_user(&self, alias: &str, credential: Credential) -> Result<UserRecord> {
        validate_name(NameScope::User, alias)?;
        let mut users = self.users().await?;
        let record = UserRecord {
            alias: alias.to_string(),
            credential,
        };
        match users.by_key_mut(alias) {
            Some(existing) => *existing = record.clone(),
            None => users.push(record.clone()),
        }
        users.save().await?;
        create_dir(&self.layout.user_dir(alias)).await?;
        Ok(record)
    }

    /// Drop the user's row from the users manifest. Returns false if there was none.
    pub async fn remove_user_entry(&self, alias: &str) -> Result<bool> {
        let mut users = self.users().await?;
        if users.remove_key(alias).is_none() {
            return Ok(false);
        }
        users.save().await?;
        Ok(true)
    }

    // === Projects ===

    pub async fn projects(&self, alias: &str) -> Result<Manifest<ProjectRecord>> {
        Manifest::load(self.layout.projects_manifest(alias)).await
    }

    pub async fn list_projects(&self, alias: &str) -> Result<Vec<ProjectRecord>> {
        Ok(self.projects(alias).await?.entries().to_vec())
    }

    pub async fn find_project(&self, alias: &str, title: &str) -> Result<Option<ProjectRecord>> {
        Ok(self.projects(alias).await?.by_title(title).cloned())
    }

    pub async fn require_project(&self, alias: &str, title: &str) -> Result<ProjectRecord> {
        self.find_project(alias, title).await?.ok_or_else(|| {
            StoreError::ProjectNotFound {
                alias: alias.to_string(),
                title: title.to_string(),
            }
            .into()
        })
    }

    /// Persist a project whose id was allocated remotely and build its skeleton.
    ///
    /// Inserting the same id twice returns the stored record unchanged.
    pub async fn insert_project(&self, alias: &str, record: ProjectRecord) -> Result<ProjectRecord> {
        let mut projects = self.projects(alias).await?;
        if let Some(existing) = projects.by_key(record.remote_id.as_str()) {
            return Ok(existing.clone());
        }
        if let Some(existing) = projects.by_title(&record.title) {
            return Err(StoreError::TitleTaken {
                scope: "Project",
                title: record.title.clone(),
                existing: existing.remote_id.to_string(),
            }
            .into());
        }
        check_project_id(&record.remote_id)?;
        projects.push(record.clone());
        projects.save().await?;
        self.ensure_project_skeleton(alias, &record.remote_id).await?;
        tracing::info!("Added project '{}' ({})", record.title, record.remote_id);
        Ok(record)
    }

    /// Create the project directory and its QR subdirectories.
    pub async fn ensure_project_skeleton(&self, alias: &str, project: &RemoteId) -> Result<PathBuf> {
        check_project_id(project)?;
        for visibility in [QrVisibility::Public, QrVisibility::Private] {
            create_dir(&self.layout.qr_dir(alias, project, visibility)).await?;
        }
        Ok(self.layout.project_dir(alias, project))
    }

    // === Augmentations ===

    pub async fn augmentations(
        &self,
        alias: &str,
        project: &RemoteId,
    ) -> Result<Manifest<AugmentationRecord>> {
        check_project_id(project)?;
        Manifest::load(self.layout.augmentations_manifest(alias, project)).await
    }

    pub async fn list_augmentations(
        &self,
        alias: &str,
        project: &RemoteId,
    ) -> Result<Vec<AugmentationRecord>> {
        Ok(self.augmentations(alias, project).await?.entries().to_vec())
    }

    pub async fn find_augmentation(
        &self,
        alias: &str,
        project: &RemoteId,
        title: &str,
    ) -> Result<Option<AugmentationRecord>> {
        Ok(self
            .augmentations(alias, project)
            .await?
            .by_title(title)
            .cloned())
    }

    pub async fn require_augmentation(
        &self,
        alias: &str,
        project: &ProjectRecord,
        title: &str,
    ) -> Result<AugmentationRecord> {
        self.find_augmentation(alias, &project.remote_id, title)
            .await?
            .ok_or_else(|| {
                StoreError::AugmentationNotFound {
                    project: project.title.clone(),
                    title: title.to_string(),
                }
                .into()
            })
    }

    /// Persist an augmentation whose id was allocated remotely and build its skeleton.
    pub async fn insert_augmentation(
        &self,
        alias: &str,
        project: &RemoteId,
        record: AugmentationRecord,
    ) -> Result<AugmentationRecord> {
        let mut augmentations = self.augmentations(alias, project).await?;
        if let Some(existing) = augmentations.by_key(record.remote_id.as_str()) {
            return Ok(existing.clone());
        }
        if let Some(existing) = augmentations.by_title(&record.title) {
            return Err(StoreError::TitleTaken {
                scope: "Augmentation",
                title: record.title.clone(),
                existing: existing.remote_id.to_string(),
            }
            .into());
        }
        check_augmentation_id(&record.remote_id)?;
        augmentations.push(record.clone());
        augmentations.save().await?;
        self.ensure_augmentation_skeleton(alias, project, &record.remote_id)
            .await?;
        tracing::info!("Added augmentation '{}' ({})", record.title, record.remote_id);
        Ok(record)
    }

    /// Apply `update` to a stored augmentation and persist the manifest.
    pub async fn update_augmentation<F>(
        &self,
        alias: &str,
        project: &RemoteId,
        augmentation: &RemoteId,
        update: F,
    ) -> Result<AugmentationRecord>
    where
        F: FnOnce(&mut AugmentationRecord),
    {
        let mut augmentations = self.augmentations(alias, project).await?;
        let record = augmentations
            .by_key_mut(augmentation.as_str())
            .ok_or_else(|| StoreError::AugmentationNotFound {
                project: project.to_string(),
                title: augmentation.to_string(),
            })?;
        update(record);
        let updated = record.clone();
        augmentations.save().await?;
        Ok(updated)
    }

    /// Create the augmentation directory with its three field subdirectories.
    pub async fn ensure_augmentation_skeleton(
        &self,
        alias: &str,
        project: &RemoteId,
        augmentation: &RemoteId,
    ) -> Result<PathBuf> {
        check_project_id(project)?;
        check_augmentation_id(augmentation)?;
        for field in [FileKind::Model, FileKind::Session, FileKind::TargetImage] {
            if let Some(dir) =
                self.layout
                    .augmentation_field_dir(alias, project, augmentation, field)
            {
                create_dir(&dir).await?;
            }
        }
        Ok(self.layout.augmentation_dir(alias, project, augmentation))
    }

    /// Field directory of an augmentation, created on demand.
    pub async fn augmentation_field_dir(
        &self,
        alias: &str,
        project: &RemoteId,
        augmentation: &RemoteId,
        field: FileKind,
    ) -> Result<PathBuf> {
        check_project_id(project)?;
        check_augmentation_id(augmentation)?;
        let dir = self
            .layout
            .augmentation_field_dir(alias, project, augmentation, field)
            .ok_or(crate::validation::ValidationError::WrongScope {
                field,
                scope: "an augmentation",
            })?;
        create_dir(&dir).await?;
        Ok(dir)
    }

    /// QR directory of a project, created on demand.
    pub async fn qr_dir(
        &self,
        alias: &str,
        project: &RemoteId,
        visibility: QrVisibility,
    ) -> Result<PathBuf> {
        check_project_id(project)?;
        let dir = self.layout.qr_dir(alias, project, visibility);
        create_dir(&dir).await?;
        Ok(dir)
    }
}

/// Reject a project id that would not land directly inside the user directory.
pub(crate) fn check_project_id(id: &RemoteId) -> Result<()> {
    check_id(id, Layout::is_project_dir_name)
}

/// Reject an augmentation id that would not land directly inside the project directory.
pub(crate) fn check_augmentation_id(id: &RemoteId) -> Result<()> {
    check_id(id, Layout::is_augmentation_dir_name)
}

fn check_id(id: &RemoteId, usable: impl Fn(&str) -> bool) -> Result<()> {
    if usable(id.as_str()) {
        Ok(())
    } else {
        Err(StoreError::UnsafeRemoteId { id: id.to_string() }.into())
    }
}

async fn create_dir(dir: &Path) -> Result<()> {
    ensure_dir(dir.to_path_buf())
        .await
        .map(|_| ())
        .map_err(|e| {
            StoreError::DirectoryIo {
                path: dir.to_path_buf(),
                source: e,
            }
            .into()
        })
}

/// Recursively delete `dir`. A directory that is already gone is not an error.
pub(crate) async fn remove_tree(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::DirectoryIo {
            path: dir.to_path_buf(),
            source: e,
        }
        .into()),
    }
}
