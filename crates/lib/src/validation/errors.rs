//! Error types for input validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::FileKind;

/// Errors raised before any side effect takes place.
///
/// Nothing has touched the network or the local tree when one of these is returned.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Title or alias is empty or contains characters outside letters, digits and spaces.
    #[error("Invalid {scope} '{value}': only letters, numbers, and spaces are allowed")]
    InvalidName { scope: &'static str, value: String },

    #[error("Invalid project type '{given}': must be one of paper, poster, book, other")]
    UnknownProjectType { given: String },

    #[error("Invalid augmentation type '{given}': the only supported type is 'model'")]
    UnknownAugmentationKind { given: String },

    /// Upload source is at or above the size ceiling.
    #[error("{field} file is {size} bytes; it must be smaller than {limit_mb}MB")]
    FileTooLarge {
        field: FileKind,
        size: u64,
        limit_mb: u64,
    },

    /// No file is staged for a field that needs one.
    #[error("No {field} file found at {}", path.display())]
    MissingFile { field: FileKind, path: PathBuf },

    /// Field cannot be sent to the remote service.
    #[error("{field} cannot be uploaded to the remote service")]
    NotUploadable { field: FileKind },

    /// Field does not belong to the requested scope.
    #[error("{field} is not a field of {scope}")]
    WrongScope { field: FileKind, scope: &'static str },

    /// Credential is blank.
    #[error("An API token is required for '{alias}'")]
    MissingCredential { alias: String },
}

impl ValidationError {
    /// The file field this error is about, if any.
    pub fn field(&self) -> Option<FileKind> {
        match self {
            ValidationError::FileTooLarge { field, .. }
            | ValidationError::MissingFile { field, .. }
            | ValidationError::NotUploadable { field }
            | ValidationError::WrongScope { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Check if this error is about an oversized payload.
    pub fn is_size_error(&self) -> bool {
        matches!(self, ValidationError::FileTooLarge { .. })
    }
}

impl From<ValidationError> for crate::Error {
    fn from(err: ValidationError) -> Self {
        crate::Error::Validation(err)
    }
}
