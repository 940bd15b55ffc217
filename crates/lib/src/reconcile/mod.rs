//! Reconciliation of the local mirror with the remote listings.
//!
//! Two distinct operations live here:
//!
//! * selection-time sync ([`Reconciler::sync_projects`],
//!   [`Reconciler::sync_augmentations`]) is additive: it fills gaps and refreshes
//!   remote-owned fields, never removing anything;
//! * cleanup ([`Reconciler::clean_local`]) is destructive: it deletes local state
//!   whose remote counterpart is gone. A scope whose listing cannot be fetched is
//!   skipped entirely.
//!
//! Entries are always matched by [`RemoteId`]. Nothing here ever deletes remote data.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    Result,
    layout::Layout,
    model::{AugmentationRecord, Credential, ProjectRecord, RemoteId, UserRecord},
    remote::RemoteApi,
    store::{LocalStore, Manifest, ManifestEntry, StoreError, check_project_id, remove_tree},
};

mod report;

pub use report::{CleanReport, RemovedEntry, SkippedScope, SyncReport};

/// Runs reconciliation between one local store and one remote.
pub struct Reconciler<'a> {
    store: &'a LocalStore,
    remote: &'a dyn RemoteApi,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a LocalStore, remote: &'a dyn RemoteApi) -> Self {
        Self { store, remote }
    }

    /// Bring the user's projects manifest up to date with the remote listing.
    pub async fn sync_projects(&self, alias: &str) -> Result<SyncReport> {
        let user = self.store.require_user(alias).await?;
        let listing = self.remote.list_projects(&user.credential).await?;
        let mut manifest = self.store.projects(alias).await?;
        let mut report = SyncReport::default();

        for remote in &listing {
            if !Layout::is_project_dir_name(&remote.qr_string) {
                warn!(user = alias, id = %remote.qr_string, "Skipping project with unusable id");
                continue;
            }
            let fresh = remote.to_record();
            match manifest.by_key_mut(fresh.remote_id.as_str()) {
                Some(existing) if *existing == fresh => {}
                Some(existing) => {
                    *existing = fresh.clone();
                    report.refreshed.push(fresh.title);
                }
                None => {
                    self.store
                        .ensure_project_skeleton(alias, &fresh.remote_id)
                        .await?;
                    report.added.push(fresh.title.clone());
                    manifest.push(fresh);
                }
            }
        }

        if !report.is_empty() {
            manifest.save().await?;
            info!(
                user = alias,
                added = report.added.len(),
                refreshed = report.refreshed.len(),
                "Synced projects"
            );
        }
        Ok(report)
    }

    /// Bring one project's augmentations manifest up to date with the remote listing.
    ///
    /// Local-only state such as `has_session` survives the refresh.
    pub async fn sync_augmentations(
        &self,
        alias: &str,
        project: &ProjectRecord,
    ) -> Result<SyncReport> {
        let user = self.store.require_user(alias).await?;
        check_project_id(&project.remote_id)?;
        let listing = self
            .remote
            .list_augmentations(&user.credential, &project.remote_id)
            .await?;
        let mut manifest = self.store.augmentations(alias, &project.remote_id).await?;
        let mut report = SyncReport::default();

        for remote in &listing {
            let id = remote.remote_id();
            if !Layout::is_augmentation_dir_name(id.as_str()) {
                warn!(
                    user = alias,
                    project = %project.remote_id,
                    id = %id,
                    "Skipping augmentation with unusable id"
                );
                continue;
            }
            match manifest.by_key_mut(id.as_str()) {
                Some(existing) => {
                    if remote.refresh(existing) {
                        report.refreshed.push(existing.title.clone());
                    }
                }
                None => {
                    self.store
                        .ensure_augmentation_skeleton(alias, &project.remote_id, &id)
                        .await?;
                    let record = remote.to_record();
                    report.added.push(record.title.clone());
                    manifest.push(record);
                }
            }
        }

        if !report.is_empty() {
            manifest.save().await?;
            info!(
                user = alias,
                project = %project.remote_id,
                added = report.added.len(),
                refreshed = report.refreshed.len(),
                "Synced augmentations"
            );
        }
        Ok(report)
    }

    /// Delete local projects and augmentations that no longer exist remotely.
    ///
    /// With `Some(alias)` only that user is cleaned, otherwise every user in the
    /// users manifest. A user or project whose listing fails is left untouched and
    /// reported as skipped.
    pub async fn clean_local(&self, alias: Option<&str>) -> Result<CleanReport> {
        let users = match alias {
            Some(alias) => vec![self.store.require_user(alias).await?],
            None => self.store.users().await?.entries().to_vec(),
        };
        let mut report = CleanReport::default();
        for user in &users {
            self.clean_user(user, &mut report).await;
        }
        info!(
            projects = report.removed_projects.len(),
            augmentations = report.removed_augmentations.len(),
            skipped = report.skipped.len(),
            "Cleanup finished"
        );
        Ok(report)
    }

    /// Delete the user's local subtree and their users-manifest row.
    ///
    /// The remote account is untouched. Logging in again with the same alias
    /// creates a brand-new local user.
    pub async fn remove_user(&self, alias: &str) -> Result<()> {
        let user = self.store.require_user(alias).await?;
        remove_tree(&self.store.layout().user_dir(&user.alias)).await?;
        self.store.remove_user_entry(&user.alias).await?;
        info!(user = alias, "Removed local user");
        Ok(())
    }

    async fn clean_user(&self, user: &UserRecord, report: &mut CleanReport) {
        let alias = user.alias.as_str();
        let remote_ids: HashSet<String> = match self.remote.list_projects(&user.credential).await {
            Ok(listing) => listing.into_iter().map(|p| p.qr_string).collect(),
            Err(err) => {
                report.skip(alias, &err);
                return;
            }
        };

        let user_dir = self.store.layout().user_dir(alias);
        let removed = match self
            .prune::<ProjectRecord>(
                alias,
                self.store.layout().projects_manifest(alias),
                &user_dir,
                &remote_ids,
                Layout::is_project_dir_name,
            )
            .await
        {
            Ok(removed) => removed,
            Err(err) => {
                report.skip(alias, &err);
                return;
            }
        };
        report.removed_projects.extend(removed);

        let projects = match self.store.projects(alias).await {
            Ok(manifest) => manifest.entries().to_vec(),
            Err(err) => {
                report.skip(alias, &err);
                return;
            }
        };
        for project in &projects {
            if let Err(err) = check_project_id(&project.remote_id) {
                report.skip(&format!("{alias}/{}", project.title), &err);
                continue;
            }
            self.clean_project(alias, &user.credential, project, report)
                .await;
        }
    }

    async fn clean_project(
        &self,
        alias: &str,
        credential: &Credential,
        project: &ProjectRecord,
        report: &mut CleanReport,
    ) {
        let scope = format!("{alias}/{}", project.title);
        let remote_ids: HashSet<String> = match self
            .remote
            .list_augmentations(credential, &project.remote_id)
            .await
        {
            Ok(listing) => listing.into_iter().map(|a| a.internal_augid).collect(),
            Err(err) => {
                report.skip(&scope, &err);
                return;
            }
        };

        let layout = self.store.layout();
        match self
            .prune::<AugmentationRecord>(
                &scope,
                layout.augmentations_manifest(alias, &project.remote_id),
                &layout.project_dir(alias, &project.remote_id),
                &remote_ids,
                Layout::is_augmentation_dir_name,
            )
            .await
        {
            Ok(removed) => report.removed_augmentations.extend(removed),
            Err(err) => report.skip(&scope, &err),
        }
    }

    /// Remove manifest entries and id-named directories under `parent_dir` that are
    /// not in `remote_ids`. Directory removal happens before the manifest entry is
    /// dropped so an interrupted run is picked up again next time.
    ///
    /// Only names accepted by `usable` are ever joined onto `parent_dir`. A stale
    /// entry with any other key loses its manifest row and nothing else.
    async fn prune<T: ManifestEntry>(
        &self,
        scope: &str,
        manifest_path: PathBuf,
        parent_dir: &Path,
        remote_ids: &HashSet<String>,
        usable: impl Fn(&str) -> bool,
    ) -> Result<Vec<RemovedEntry>> {
        let mut manifest = Manifest::<T>::load(manifest_path).await?;
        let mut removed = Vec::new();
        let mut dropped_rows = false;

        for entry in manifest.entries().to_vec() {
            if remote_ids.contains(entry.key()) {
                continue;
            }
            if !usable(entry.key()) {
                manifest.remove_key(entry.key());
                dropped_rows = true;
                warn!(scope, id = entry.key(), "Dropped manifest entry with unusable id");
                continue;
            }
            remove_tree(&parent_dir.join(entry.key())).await?;
            manifest.remove_key(entry.key());
            info!(scope, id = entry.key(), title = entry.title(), "Removed orphaned local entry");
            removed.push(RemovedEntry {
                scope: scope.to_string(),
                remote_id: RemoteId::new(entry.key()),
                title: Some(entry.title().to_string()),
            });
        }
        if dropped_rows || !removed.is_empty() {
            manifest.save().await?;
        }

        for name in child_dirs(parent_dir).await? {
            if !usable(&name) || remote_ids.contains(&name) || manifest.contains_key(&name) {
                continue;
            }
            remove_tree(&parent_dir.join(&name)).await?;
            debug!(scope, id = %name, "Removed untracked directory");
            removed.push(RemovedEntry {
                scope: scope.to_string(),
                remote_id: RemoteId::new(name),
                title: None,
            });
        }
        Ok(removed)
    }
}

/// Names of the subdirectories of `dir`. A missing directory has none.
async fn child_dirs(dir: &Path) -> Result<Vec<String>> {
    let io_err = |source: std::io::Error| StoreError::DirectoryIo {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_err(e).into()),
    };
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        if entry.file_type().await.map_err(io_err)?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

impl CleanReport {
    fn skip(&mut self, scope: &str, err: &crate::Error) {
        warn!(scope, "Skipping cleanup: {err}");
        self.skipped.push(SkippedScope {
            scope: scope.to_string(),
            reason: err.to_string(),
        });
    }
}
