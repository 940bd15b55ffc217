//! Error types for file transfers.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::FileKind;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TransferError {
    /// Upload without a source path and nothing staged in the field directory.
    #[error("No {field} file is staged for augmentation '{title}'")]
    NothingStaged { field: FileKind, title: String },

    /// The remote listing carries no file for the field.
    #[error("Augmentation '{title}' has no {field} on the Schol-AR service yet")]
    NothingToDownload { field: FileKind, title: String },

    /// The augmentation is no longer in the remote listing.
    #[error("Augmentation '{title}' no longer exists on the Schol-AR service")]
    RemoteMissing { title: String },

    /// The field has no remote copy at all.
    #[error("{field} is only stored locally and cannot be downloaded")]
    LocalOnly { field: FileKind },

    /// Reading or writing a transferred file failed.
    #[error("Failed to access {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    /// Check if the requested file does not exist on either side.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TransferError::NothingStaged { .. }
                | TransferError::NothingToDownload { .. }
                | TransferError::RemoteMissing { .. }
        )
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, TransferError::FileIo { .. })
    }

    /// Check if the local mirror refers to something the remote deleted.
    pub fn is_stale(&self) -> bool {
        matches!(self, TransferError::RemoteMissing { .. })
    }
}

impl From<TransferError> for crate::Error {
    fn from(err: TransferError) -> Self {
        crate::Error::Transfer(err)
    }
}
