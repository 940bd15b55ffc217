//! Record types for the three manifest scopes and the file fields they own.
//!
//! Records are what the local manifests persist. They are derived from remote
//! listings (see [`crate::remote::protocol`]) and never invent identifiers.

use serde::{Deserialize, Serialize};

pub mod credential;
pub mod id;

pub use credential::Credential;
pub use id::RemoteId;

use crate::validation::ValidationError;

/// A local user: a human-chosen alias bound to a remote credential.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique alias within the installation. Also the user's directory name.
    pub alias: String,
    pub credential: Credential,
}

/// Publication type of a project.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Paper,
    Poster,
    Book,
    #[default]
    Other,
}

impl ProjectType {
    pub const ALL: [ProjectType; 4] = [
        ProjectType::Paper,
        ProjectType::Poster,
        ProjectType::Book,
        ProjectType::Other,
    ];

    /// Wire name used by the remote service.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Paper => "paper",
            ProjectType::Poster => "poster",
            ProjectType::Book => "book",
            ProjectType::Other => "other",
        }
    }

    /// Human label shown by the website.
    pub fn label(&self) -> &'static str {
        match self {
            ProjectType::Paper => "Scientific Paper",
            ProjectType::Poster => "Poster or Other Presentation",
            ProjectType::Book => "Book or Chapter",
            ProjectType::Other => "Other",
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownProjectType {
                given: s.to_string(),
            })
    }
}

/// Kind of content an augmentation carries. Only 3D models are supported.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AugmentationKind {
    #[default]
    Model,
}

impl AugmentationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AugmentationKind::Model => "model",
        }
    }
}

impl std::fmt::Display for AugmentationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AugmentationKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "model" => Ok(AugmentationKind::Model),
            other => Err(ValidationError::UnknownAugmentationKind {
                given: other.to_string(),
            }),
        }
    }
}

/// A project owned by one user. Its directory is named by `remote_id`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRecord {
    pub remote_id: RemoteId,
    pub title: String,
    pub project_type: ProjectType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// An augmentation owned by one project. Its directory is named by `remote_id`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AugmentationRecord {
    pub remote_id: RemoteId,
    pub title: String,
    pub kind: AugmentationKind,
    /// The remote listing carries a target image.
    #[serde(default)]
    pub has_target_image: bool,
    /// The remote listing carries a model file.
    #[serde(default)]
    pub has_model_file: bool,
    /// A session snapshot has been stored locally.
    #[serde(default)]
    pub has_session: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_score: Option<f64>,
}

/// The file fields the transfer manager moves around.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Model,
    TargetImage,
    Session,
    QrPublic,
    QrPrivate,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Model => "model",
            FileKind::TargetImage => "target_image",
            FileKind::Session => "session",
            FileKind::QrPublic => "qr_public",
            FileKind::QrPrivate => "qr_private",
        }
    }

    /// Fields the remote service accepts replacements for.
    pub fn is_remote_writable(&self) -> bool {
        matches!(self, FileKind::Model | FileKind::TargetImage)
    }

    /// Fields owned by a project rather than an augmentation.
    pub fn is_project_field(&self) -> bool {
        matches!(self, FileKind::QrPublic | FileKind::QrPrivate)
    }

    /// Extension used for files written under this field.
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Model => ".glb",
            FileKind::Session => ".cxs",
            FileKind::TargetImage | FileKind::QrPublic | FileKind::QrPrivate => ".png",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
