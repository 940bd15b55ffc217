//! Error types for the local state store.

use std::path::PathBuf;

use thiserror::Error;

/// Errors about the on-disk manifest tree.
///
/// A store error is fatal for the scope it names only; callers iterating over
/// several scopes report it and move on to the next sibling.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a manifest failed at the filesystem level.
    #[error("Failed to access manifest {}: {source}", path.display())]
    ManifestIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest exists but cannot be parsed.
    #[error("Manifest {} is corrupt: {reason}", path.display())]
    CorruptManifest { path: PathBuf, reason: String },

    /// Creating or deleting a directory of the mirror failed.
    #[error("Failed to update directory {}: {source}", path.display())]
    DirectoryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("User '{alias}' not found")]
    UserNotFound { alias: String },

    #[error("Project '{title}' not found for user '{alias}'")]
    ProjectNotFound { alias: String, title: String },

    #[error("Augmentation '{title}' not found in project '{project}'")]
    AugmentationNotFound { project: String, title: String },

    /// A different record already uses this title under the same parent.
    #[error("{scope} title '{title}' is already used by {existing}")]
    TitleTaken {
        scope: &'static str,
        title: String,
        existing: String,
    },

    /// A remote id that cannot be used as a single directory name.
    #[error("Remote id '{id}' cannot be used as a directory name")]
    UnsafeRemoteId { id: String },
}

impl StoreError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::UserNotFound { .. }
                | StoreError::ProjectNotFound { .. }
                | StoreError::AugmentationNotFound { .. }
        )
    }

    /// Check if this error means a manifest could not be trusted.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::CorruptManifest { .. })
    }

    /// Check if this error is filesystem related.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            StoreError::ManifestIo { .. } | StoreError::DirectoryIo { .. }
        )
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
