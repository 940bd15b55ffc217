//! Server-assigned identifier type.
//!
//! Every local directory below a user is named by one of these, never by a title.

use serde::{Deserialize, Serialize};

/// An opaque identifier allocated by the remote service for a project or augmentation.
///
/// Projects use the service's QR string, augmentations its internal augmentation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    /// Creates a new RemoteId from any string-like input.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the id is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if the id can name a directory directly below its parent.
    ///
    /// Ids are allocated by the remote service and are not trusted.
    pub fn is_path_safe(&self) -> bool {
        is_path_safe_name(&self.0)
    }
}

/// A single, non-empty path component: no `.`/`..`, separators or control characters.
pub(crate) fn is_path_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
}

impl From<String> for RemoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RemoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for RemoteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RemoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0)
    }
}

impl PartialEq<str> for RemoteId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RemoteId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
