//! File transfers between the local mirror, the remote service, and arbitrary paths.
//!
//! Every field directory holds at most one file. Downloads and uploads empty the
//! field directory before writing into it. Upload sources are size-checked before
//! anything is copied or sent.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{
    Result,
    constants::TARGET_IMAGE_OVERWRITE_WARNING,
    layout::{QrVisibility, empty_dir, first_file},
    model::{AugmentationRecord, FileKind, ProjectRecord, UserRecord},
    remote::RemoteApi,
    store::LocalStore,
    validation::{ValidationError, check_upload_size, ensure_extension, sanitize_file_name},
};

pub mod errors;
mod report;

pub use errors::TransferError;
pub use report::{FieldOutcome, FieldSelection, FieldSources, TransferReport};

/// A resolved project together with its owner.
#[derive(Debug, Clone)]
pub struct ProjectTarget {
    pub user: UserRecord,
    pub project: ProjectRecord,
}

/// A resolved augmentation together with its project and owner.
#[derive(Debug, Clone)]
pub struct AugmentationTarget {
    pub user: UserRecord,
    pub project: ProjectRecord,
    pub augmentation: AugmentationRecord,
}

impl AugmentationTarget {
    pub fn project_target(&self) -> ProjectTarget {
        ProjectTarget {
            user: self.user.clone(),
            project: self.project.clone(),
        }
    }
}

/// Moves field files for resolved targets.
pub struct TransferManager<'a> {
    store: &'a LocalStore,
    remote: &'a dyn RemoteApi,
}

impl<'a> TransferManager<'a> {
    pub fn new(store: &'a LocalStore, remote: &'a dyn RemoteApi) -> Self {
        Self { store, remote }
    }

    /// Directory of an augmentation field, created on demand.
    pub async fn field_dir(&self, target: &AugmentationTarget, field: FileKind) -> Result<PathBuf> {
        self.store
            .augmentation_field_dir(
                &target.user.alias,
                &target.project.remote_id,
                &target.augmentation.remote_id,
                field,
            )
            .await
    }

    /// The file currently held for an augmentation field, if any.
    pub async fn local_file(
        &self,
        target: &AugmentationTarget,
        field: FileKind,
    ) -> Result<Option<PathBuf>> {
        let dir = self.field_dir(target, field).await?;
        first_file(&dir).await.map_err(|source| file_io(dir, source))
    }

    /// The QR image currently held for a project, if any.
    pub async fn local_qr(
        &self,
        target: &ProjectTarget,
        visibility: QrVisibility,
    ) -> Result<Option<PathBuf>> {
        let dir = self
            .store
            .qr_dir(&target.user.alias, &target.project.remote_id, visibility)
            .await?;
        first_file(&dir).await.map_err(|source| file_io(dir, source))
    }

    // === Uploads ===

    /// Stage `source` (or the already staged file) for `field` and send it.
    ///
    /// `Session` files are only stored locally. Returns the staged path.
    pub async fn upload(
        &self,
        target: &AugmentationTarget,
        field: FileKind,
        source: Option<&Path>,
    ) -> Result<PathBuf> {
        if !field.is_remote_writable() && field != FileKind::Session {
            return Err(ValidationError::NotUploadable { field }.into());
        }
        let title = &target.augmentation.title;
        let source = match source {
            Some(path) => path.to_path_buf(),
            None => self.local_file(target, field).await?.ok_or_else(|| {
                TransferError::NothingStaged {
                    field,
                    title: title.clone(),
                }
            })?,
        };
        if field.is_remote_writable() {
            check_upload_size(field, &source).await?;
        } else if !source.is_file() {
            return Err(ValidationError::MissingFile {
                field,
                path: source,
            }
            .into());
        }

        let bytes = tokio::fs::read(&source)
            .await
            .map_err(|e| file_io(source.clone(), e))?;
        let dir = self.field_dir(target, field).await?;
        let staged = if source.parent() == Some(dir.as_path()) {
            source.clone()
        } else {
            let name = staged_file_name(title, field, &source);
            self.write_field_file(&dir, &name, &bytes).await?
        };

        let (alias, project, augmentation) = (
            &target.user.alias,
            &target.project.remote_id,
            &target.augmentation.remote_id,
        );
        if field == FileKind::Session {
            self.store
                .update_augmentation(alias, project, augmentation, |a| a.has_session = true)
                .await?;
            info!(augmentation = %augmentation, "Stored session file");
            return Ok(staged);
        }

        let file_name = file_name_of(&staged);
        self.remote
            .replace_file(
                &target.user.credential,
                project,
                augmentation,
                field,
                &file_name,
                bytes,
            )
            .await?;
        self.store
            .update_augmentation(alias, project, augmentation, |a| match field {
                FileKind::Model => a.has_model_file = true,
                _ => a.has_target_image = true,
            })
            .await?;
        if field == FileKind::TargetImage {
            warn!(augmentation = %augmentation, "{TARGET_IMAGE_OVERWRITE_WARNING}");
        }
        info!(augmentation = %augmentation, %field, "Uploaded file");
        Ok(staged)
    }

    /// Upload each selected field independently, model first.
    pub async fn upload_fields(
        &self,
        target: &AugmentationTarget,
        selection: FieldSelection,
        sources: &FieldSources,
    ) -> TransferReport {
        let mut report = TransferReport::default();
        for field in selection.fields() {
            let result = self.upload(target, field, sources.get(field)).await;
            if let Err(err) = &result {
                warn!(%field, "Upload failed: {err}");
            }
            let mut outcome = FieldOutcome::new(field, result);
            if field == FileKind::TargetImage && outcome.is_success() {
                outcome.warning = Some(TARGET_IMAGE_OVERWRITE_WARNING);
            }
            report.push(outcome);
        }
        report
    }

    // === Downloads ===

    /// Fetch the remote copy of `field` into its field directory.
    ///
    /// The current file URL is taken from a fresh listing, which also refreshes the
    /// stored record.
    pub async fn download(&self, target: &AugmentationTarget, field: FileKind) -> Result<PathBuf> {
        match field {
            FileKind::Session => return Err(TransferError::LocalOnly { field }.into()),
            FileKind::QrPublic | FileKind::QrPrivate => {
                return Err(ValidationError::WrongScope {
                    field,
                    scope: "an augmentation",
                }
                .into());
            }
            FileKind::Model | FileKind::TargetImage => {}
        }
        let (alias, project, augmentation) = (
            &target.user.alias,
            &target.project.remote_id,
            &target.augmentation.remote_id,
        );
        let title = &target.augmentation.title;

        let listing = self
            .remote
            .list_augmentations(&target.user.credential, project)
            .await?
            .into_iter()
            .find(|a| a.remote_id() == *augmentation)
            .ok_or_else(|| TransferError::RemoteMissing {
                title: title.clone(),
            })?;
        self.store
            .update_augmentation(alias, project, augmentation, |a| {
                listing.refresh(a);
            })
            .await?;

        let url = listing
            .file_url(field)
            .ok_or_else(|| TransferError::NothingToDownload {
                field,
                title: title.clone(),
            })?;
        let bytes = self.remote.fetch_file(&url).await?;
        let name = file_name_from_url(&url).unwrap_or_else(|| default_file_name(title, field));
        let dir = self.field_dir(target, field).await?;
        let path = self.write_field_file(&dir, &name, &bytes).await?;
        info!(augmentation = %augmentation, %field, "Downloaded file");
        Ok(path)
    }

    /// Download each selected field independently.
    pub async fn download_fields(
        &self,
        target: &AugmentationTarget,
        selection: FieldSelection,
    ) -> TransferReport {
        let mut report = TransferReport::default();
        for field in selection.fields() {
            let result = self.download(target, field).await;
            if let Err(err) = &result {
                warn!(%field, "Download failed: {err}");
            }
            report.push(FieldOutcome::new(field, result));
        }
        report
    }

    /// Fetch one half of the project's QR pair into its directory.
    pub async fn download_qr_image(
        &self,
        target: &ProjectTarget,
        visibility: QrVisibility,
    ) -> Result<PathBuf> {
        let project = &target.project;
        let links = self
            .remote
            .qr_links(&target.user.credential, &project.remote_id)
            .await?;
        let url = match visibility {
            QrVisibility::Public => links.public,
            QrVisibility::Private => links.private,
        };
        let bytes = self.remote.fetch_file(&url).await?;
        let dir = self
            .store
            .qr_dir(&target.user.alias, &project.remote_id, visibility)
            .await?;
        let name = file_name_from_url(&url)
            .unwrap_or_else(|| default_file_name(&project.title, visibility.field()));
        self.write_field_file(&dir, &name, &bytes).await
    }

    /// Download both QR images of a project.
    pub async fn download_qr(&self, target: &ProjectTarget) -> TransferReport {
        let mut report = TransferReport::default();
        for visibility in [QrVisibility::Public, QrVisibility::Private] {
            let result = self.download_qr_image(target, visibility).await;
            if let Err(err) = &result {
                warn!(field = %visibility.field(), "QR download failed: {err}");
            }
            report.push(FieldOutcome::new(visibility.field(), result));
        }
        report
    }

    // === Store to an arbitrary location ===

    /// Copy the target image to `dest`, downloading it first if needed.
    pub async fn store_target_image(&self, target: &AugmentationTarget, dest: &Path) -> Result<PathBuf> {
        self.store_field(target, FileKind::TargetImage, dest).await
    }

    /// Copy the model to `dest`, downloading it first if needed.
    pub async fn store_model(&self, target: &AugmentationTarget, dest: &Path) -> Result<PathBuf> {
        self.store_field(target, FileKind::Model, dest).await
    }

    /// Copy the public QR image to `dest`, downloading it first if needed.
    pub async fn store_qr(&self, target: &ProjectTarget, dest: &Path) -> Result<PathBuf> {
        let local = match self.local_qr(target, QrVisibility::Public).await? {
            Some(path) => path,
            None => {
                self.download_qr_image(target, QrVisibility::Public)
                    .await?
            }
        };
        copy_to(&local, &ensure_extension(dest, FileKind::QrPublic.extension())).await
    }

    /// Write the model, target image and public QR into `folder`.
    ///
    /// Files are named `<augmentation>.glb`, `<augmentation>.png` and
    /// `<project>_qr.png`.
    pub async fn store_all(&self, target: &AugmentationTarget, folder: &Path) -> TransferReport {
        let mut report = TransferReport::default();
        let aug_title = sanitize_file_name(&target.augmentation.title);
        let project_title = sanitize_file_name(&target.project.title);
        let model = self
            .store_model(target, &folder.join(format!("{aug_title}.glb")))
            .await;
        report.push(FieldOutcome::new(FileKind::Model, model));
        let image = self
            .store_target_image(target, &folder.join(format!("{aug_title}.png")))
            .await;
        report.push(FieldOutcome::new(FileKind::TargetImage, image));
        let qr = self
            .store_qr(
                &target.project_target(),
                &folder.join(format!("{project_title}_qr.png")),
            )
            .await;
        report.push(FieldOutcome::new(FileKind::QrPublic, qr));
        report
    }

    async fn store_field(
        &self,
        target: &AugmentationTarget,
        field: FileKind,
        dest: &Path,
    ) -> Result<PathBuf> {
        let local = match self.local_file(target, field).await? {
            Some(path) => path,
            None => self.download(target, field).await?,
        };
        copy_to(&local, &ensure_extension(dest, field.extension())).await
    }

    /// Replace the contents of a field directory with one file.
    async fn write_field_file(&self, dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        empty_dir(dir)
            .await
            .map_err(|e| file_io(dir.to_path_buf(), e))?;
        let path = dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| file_io(path.clone(), e))?;
        Ok(path)
    }
}

/// `<title>-model.glb`, `<title>-target.png`, `<title>-session.cxs`, `<title>_qr.png`.
pub fn default_file_name(title: &str, field: FileKind) -> String {
    let suffix = match field {
        FileKind::Model => "-model",
        FileKind::TargetImage => "-target",
        FileKind::Session => "-session",
        FileKind::QrPublic => "_qr",
        FileKind::QrPrivate => "_admin_qr",
    };
    sanitize_file_name(&format!("{title}{suffix}{}", field.extension()))
}

/// Sanitized last path segment of `url`, if it looks like a file name.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let name = parsed.path_segments()?.next_back()?;
    if name.is_empty() || !name.contains('.') {
        return None;
    }
    Some(sanitize_file_name(name))
}

fn staged_file_name(title: &str, field: FileKind, source: &Path) -> String {
    let default = default_file_name(title, field);
    match source.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() && format!(".{ext}") != field.extension() => {
            let stem = default.trim_end_matches(field.extension());
            sanitize_file_name(&format!("{stem}.{ext}"))
        }
        _ => default,
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn copy_to(source: &Path, dest: &Path) -> Result<PathBuf> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| file_io(parent.to_path_buf(), e))?;
    }
    tokio::fs::copy(source, dest)
        .await
        .map_err(|e| file_io(dest.to_path_buf(), e))?;
    Ok(dest.to_path_buf())
}

fn file_io(path: PathBuf, source: std::io::Error) -> crate::Error {
    TransferError::FileIo { path, source }.into()
}
