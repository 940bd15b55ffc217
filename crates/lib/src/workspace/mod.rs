//! The operations a front end calls, by alias and title.
//!
//! [`Workspace`] resolves titles to records, runs selection-time reconciliation,
//! and hands resolved targets to the transfer manager. It keeps no state between
//! calls besides the store root and the remote handle.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{info, warn};

use crate::{
    Result,
    config::ClientConfig,
    model::{AugmentationKind, AugmentationRecord, Credential, ProjectRecord, ProjectType},
    reconcile::{CleanReport, Reconciler, SyncReport},
    remote::{HttpRemote, RemoteApi, RemoteError},
    session::{self, SessionLinkage},
    store::LocalStore,
    transfer::{
        AugmentationTarget, FieldSelection, FieldSources, ProjectTarget, TransferManager,
        TransferReport,
    },
    validation::{NameScope, ValidationError, check_upload_size, validate_name},
};

/// A record returned by a select-or-create call.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<R> {
    pub record: R,
    /// True if the record was created remotely by this call.
    pub created: bool,
    /// Reconciliation of the selected scope. `None` for new records and when the
    /// listing could not be fetched.
    pub synced: Option<SyncReport>,
}

/// Result of selecting or creating an augmentation.
#[derive(Debug)]
pub struct AugmentationSelection {
    pub selection: Selection<AugmentationRecord>,
    /// Initial upload performed right after creation, if sources were given.
    pub initial_upload: Option<TransferReport>,
}

/// Result of a login.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginReport {
    pub alias: String,
    /// True if the alias was not known before.
    pub new_user: bool,
    pub projects: SyncReport,
}

/// Entry point tying the local store to a remote service.
#[derive(Clone)]
pub struct Workspace {
    store: LocalStore,
    remote: Arc<dyn RemoteApi>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("root", &self.store.layout().root())
            .finish_non_exhaustive()
    }
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, remote: Arc<dyn RemoteApi>) -> Self {
        Self {
            store: LocalStore::new(root),
            remote,
        }
    }

    /// Open the mirror at `root` against the HTTP service described by `config`.
    pub async fn open(root: impl Into<PathBuf>, config: &ClientConfig) -> Result<Self> {
        let workspace = Self::new(root, Arc::new(HttpRemote::new(config)?));
        workspace.store.init().await?;
        Ok(workspace)
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn remote(&self) -> &dyn RemoteApi {
        self.remote.as_ref()
    }

    pub fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(&self.store, self.remote.as_ref())
    }

    pub fn transfer(&self) -> TransferManager<'_> {
        TransferManager::new(&self.store, self.remote.as_ref())
    }

    // === Users ===

    /// Validate a credential, store it under `alias`, and sync the user's projects.
    ///
    /// Without a token the stored credential of an existing user is re-validated.
    pub async fn login(&self, alias: &str, token: Option<&str>) -> Result<LoginReport> {
        validate_name(NameScope::User, alias)?;
        self.store.init().await?;
        let existing = self.store.find_user(alias).await?;
        let credential = match (token, &existing) {
            (Some(token), _) => Credential::new(token.trim()),
            (None, Some(user)) => user.credential.clone(),
            (None, None) => {
                return Err(ValidationError::MissingCredential {
                    alias: alias.to_string(),
                }
                .into());
            }
        };
        if credential.is_empty() {
            return Err(ValidationError::MissingCredential {
                alias: alias.to_string(),
            }
            .into());
        }
        if !self.remote.validate_credential(&credential).await? {
            return Err(RemoteError::Unauthorized {
                operation: "log in".to_string(),
            }
            .into());
        }

        self.store.upsert_user(alias, credential).await?;
        let projects = self.reconciler().sync_projects(alias).await?;
        info!(user = alias, "Logged in");
        Ok(LoginReport {
            alias: alias.to_string(),
            new_user: existing.is_none(),
            projects,
        })
    }

    pub async fn users(&self) -> Result<Vec<String>> {
        self.store.list_users().await
    }

    /// Delete the user's local state. The remote account is untouched.
    pub async fn remove_user(&self, alias: &str) -> Result<()> {
        self.reconciler().remove_user(alias).await
    }

    /// Delete local state whose remote counterpart is gone.
    pub async fn clean_local(&self, alias: Option<&str>) -> Result<CleanReport> {
        self.reconciler().clean_local(alias).await
    }

    // === Projects ===

    pub async fn projects(&self, alias: &str) -> Result<Vec<ProjectRecord>> {
        self.store.require_user(alias).await?;
        self.store.list_projects(alias).await
    }

    /// Select a project by title, creating it remotely if it exists nowhere.
    ///
    /// Selecting an existing project reconciles its augmentations. A project made
    /// on the website but not yet mirrored is picked up instead of duplicated.
    pub async fn select_or_create_project(
        &self,
        alias: &str,
        title: &str,
        project_type: ProjectType,
        url: &str,
    ) -> Result<Selection<ProjectRecord>> {
        validate_name(NameScope::Project, title)?;
        let user = self.store.require_user(alias).await?;

        if let Some(record) = self.store.find_project(alias, title).await? {
            return Ok(self.selected_project(alias, record).await);
        }

        self.reconciler().sync_projects(alias).await?;
        if let Some(record) = self.store.find_project(alias, title).await? {
            return Ok(self.selected_project(alias, record).await);
        }

        let listing = self
            .remote
            .create_project(&user.credential, title, project_type, url)
            .await?;
        let record = self.store.insert_project(alias, listing.to_record()).await?;
        Ok(Selection {
            record,
            created: true,
            synced: None,
        })
    }

    async fn selected_project(&self, alias: &str, record: ProjectRecord) -> Selection<ProjectRecord> {
        let synced = match self.reconciler().sync_augmentations(alias, &record).await {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(project = %record.title, "Could not refresh augmentations: {err}");
                None
            }
        };
        Selection {
            record,
            created: false,
            synced,
        }
    }

    pub async fn project_target(&self, alias: &str, project_title: &str) -> Result<ProjectTarget> {
        let user = self.store.require_user(alias).await?;
        let project = self.store.require_project(alias, project_title).await?;
        Ok(ProjectTarget { user, project })
    }

    // === Augmentations ===

    pub async fn augmentations(
        &self,
        alias: &str,
        project_title: &str,
    ) -> Result<Vec<AugmentationRecord>> {
        let project = self.store.require_project(alias, project_title).await?;
        self.store
            .list_augmentations(alias, &project.remote_id)
            .await
    }

    /// Select an augmentation by title, creating it remotely if it exists nowhere.
    ///
    /// When created, the files in `initial` are size-checked before the remote
    /// call and uploaded right after it.
    pub async fn select_or_create_augmentation(
        &self,
        alias: &str,
        project_title: &str,
        title: &str,
        kind: AugmentationKind,
        initial: &FieldSources,
    ) -> Result<AugmentationSelection> {
        validate_name(NameScope::Augmentation, title)?;
        let target = self.project_target(alias, project_title).await?;
        let project = &target.project;

        if let Some(record) = self
            .store
            .find_augmentation(alias, &project.remote_id, title)
            .await?
        {
            return self.selected_augmentation(alias, project, record).await;
        }

        self.reconciler().sync_augmentations(alias, project).await?;
        if let Some(record) = self
            .store
            .find_augmentation(alias, &project.remote_id, title)
            .await?
        {
            return self.selected_augmentation(alias, project, record).await;
        }

        let selection = FieldSelection {
            model: initial.model.is_some(),
            target_image: initial.target_image.is_some(),
        };
        for field in selection.fields() {
            if let Some(path) = initial.get(field) {
                check_upload_size(field, path).await?;
            }
        }

        let listing = self
            .remote
            .create_augmentation(&target.user.credential, &project.remote_id, title, kind)
            .await?;
        let record = self
            .store
            .insert_augmentation(alias, &project.remote_id, listing.to_record())
            .await?;

        let initial_upload = if selection.is_empty() {
            None
        } else {
            let aug_target = AugmentationTarget {
                user: target.user.clone(),
                project: project.clone(),
                augmentation: record.clone(),
            };
            Some(
                self.transfer()
                    .upload_fields(&aug_target, selection, initial)
                    .await,
            )
        };
        let record = self
            .store
            .require_augmentation(alias, project, &record.title)
            .await?;
        Ok(AugmentationSelection {
            selection: Selection {
                record,
                created: true,
                synced: None,
            },
            initial_upload,
        })
    }

    async fn selected_augmentation(
        &self,
        alias: &str,
        project: &ProjectRecord,
        record: AugmentationRecord,
    ) -> Result<AugmentationSelection> {
        self.store
            .ensure_augmentation_skeleton(alias, &project.remote_id, &record.remote_id)
            .await?;
        let synced = match self.reconciler().sync_augmentations(alias, project).await {
            Ok(report) => Some(report),
            Err(err) => {
                warn!(project = %project.title, "Could not refresh augmentations: {err}");
                None
            }
        };
        let record = self
            .store
            .augmentations(alias, &project.remote_id)
            .await?
            .by_key(record.remote_id.as_str())
            .cloned()
            .unwrap_or(record);
        Ok(AugmentationSelection {
            selection: Selection {
                record,
                created: false,
                synced,
            },
            initial_upload: None,
        })
    }

    pub async fn augmentation_target(
        &self,
        alias: &str,
        project_title: &str,
        title: &str,
    ) -> Result<AugmentationTarget> {
        let ProjectTarget { user, project } = self.project_target(alias, project_title).await?;
        let augmentation = self
            .store
            .require_augmentation(alias, &project, title)
            .await?;
        Ok(AugmentationTarget {
            user,
            project,
            augmentation,
        })
    }

    // === Transfers ===

    pub async fn download(
        &self,
        alias: &str,
        project_title: &str,
        title: &str,
        selection: FieldSelection,
    ) -> Result<TransferReport> {
        let target = self.augmentation_target(alias, project_title, title).await?;
        Ok(self.transfer().download_fields(&target, selection).await)
    }

    pub async fn upload(
        &self,
        alias: &str,
        project_title: &str,
        title: &str,
        selection: FieldSelection,
        sources: &FieldSources,
    ) -> Result<TransferReport> {
        let target = self.augmentation_target(alias, project_title, title).await?;
        Ok(self
            .transfer()
            .upload_fields(&target, selection, sources)
            .await)
    }

    pub async fn download_qr(&self, alias: &str, project_title: &str) -> Result<TransferReport> {
        let target = self.project_target(alias, project_title).await?;
        Ok(self.transfer().download_qr(&target).await)
    }

    pub async fn store_target_image(
        &self,
        alias: &str,
        project_title: &str,
        title: &str,
        dest: &Path,
    ) -> Result<PathBuf> {
        let target = self.augmentation_target(alias, project_title, title).await?;
        self.transfer().store_target_image(&target, dest).await
    }

    pub async fn store_model(
        &self,
        alias: &str,
        project_title: &str,
        title: &str,
        dest: &Path,
    ) -> Result<PathBuf> {
        let target = self.augmentation_target(alias, project_title, title).await?;
        self.transfer().store_model(&target, dest).await
    }

    pub async fn store_qr(&self, alias: &str, project_title: &str, dest: &Path) -> Result<PathBuf> {
        let target = self.project_target(alias, project_title).await?;
        self.transfer().store_qr(&target, dest).await
    }

    pub async fn store_all(
        &self,
        alias: &str,
        project_title: &str,
        title: &str,
        folder: &Path,
    ) -> Result<TransferReport> {
        let target = self.augmentation_target(alias, project_title, title).await?;
        Ok(self.transfer().store_all(&target, folder).await)
    }

    // === Sessions ===

    pub async fn save_session(
        &self,
        alias: &str,
        project_title: &str,
        title: &str,
        linkage: &dyn SessionLinkage,
        source: Option<&Path>,
    ) -> Result<PathBuf> {
        let target = self.augmentation_target(alias, project_title, title).await?;
        session::save_session(&self.store, &target, linkage, source).await
    }

    pub async fn open_session(
        &self,
        alias: &str,
        project_title: &str,
        title: &str,
        linkage: &dyn SessionLinkage,
    ) -> Result<Option<PathBuf>> {
        let target = self.augmentation_target(alias, project_title, title).await?;
        session::open_session(&self.store, &target, linkage).await
    }
}
