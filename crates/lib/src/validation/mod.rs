//! Input validation shared by every scope.
//!
//! Titles and aliases double as display strings and manifest keys, so they are
//! restricted to letters, digits and whitespace. Validation always runs before
//! any directory or manifest mutation.

use std::path::{Path, PathBuf};

use crate::{
    Result,
    constants::{MAX_UPLOAD_BYTES, MAX_UPLOAD_MB},
    model::FileKind,
};

pub mod errors;

pub use errors::ValidationError;

/// Which kind of name is being checked, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameScope {
    User,
    Project,
    Augmentation,
}

impl NameScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameScope::User => "username",
            NameScope::Project => "project title",
            NameScope::Augmentation => "augmentation title",
        }
    }
}

/// Returns true if `name` only holds letters, digits and plain spaces, with at
/// least one letter or digit.
pub fn is_valid_name(name: &str) -> bool {
    name.chars().any(char::is_alphanumeric)
        && name.chars().all(|c| c.is_alphanumeric() || c == ' ')
}

/// Validate a title or alias for the given scope.
pub fn validate_name(scope: NameScope, name: &str) -> std::result::Result<(), ValidationError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName {
            scope: scope.as_str(),
            value: name.to_string(),
        })
    }
}

/// Check that `path` exists and is small enough to upload under `field`.
///
/// Returns the file size on success. No network call is ever made from here.
pub async fn check_upload_size(field: FileKind, path: &Path) -> Result<u64> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => {
            return Err(ValidationError::MissingFile {
                field,
                path: path.to_path_buf(),
            }
            .into());
        }
    };
    let size = metadata.len();
    if size >= MAX_UPLOAD_BYTES {
        return Err(ValidationError::FileTooLarge {
            field,
            size,
            limit_mb: MAX_UPLOAD_MB,
        }
        .into());
    }
    Ok(size)
}

/// Replace characters that are unsafe in a file name.
///
/// Reserved characters and control characters become `_`, as do `..` sequences
/// and a leading path separator.
pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if (c as u32) < 0x20 => '_',
            c => c,
        })
        .collect();
    let mut sanitized = replaced.replace("..", "_");
    if sanitized.starts_with('/') || sanitized.starts_with('\\') {
        sanitized.replace_range(0..1, "_");
    }
    sanitized
}

/// Append `extension` (including the dot) unless the path already ends with it.
pub fn ensure_extension(path: &Path, extension: &str) -> PathBuf {
    let raw = path.as_os_str().to_string_lossy();
    if raw.ends_with(extension) {
        path.to_path_buf()
    } else {
        PathBuf::from(format!("{raw}{extension}"))
    }
}
