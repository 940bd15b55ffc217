//! Wire types of the Schol-AR REST API.
//!
//! Field names follow the service's JSON contract. Conversions into the local
//! record types live here so the rest of the crate never sees wire names.

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{AugmentationKind, AugmentationRecord, FileKind, ProjectRecord, ProjectType, RemoteId};

/// One project in a `ListARP` response (also returned by `CreateARP`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProjectListing {
    #[serde(rename = "QRString")]
    pub qr_string: String,
    pub project_title: String,
    #[serde(default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub disc_url: Option<String>,
}

impl ProjectListing {
    pub fn remote_id(&self) -> RemoteId {
        RemoteId::new(self.qr_string.clone())
    }

    /// Local record for this listing. Unknown project types fall back to `other`.
    pub fn to_record(&self) -> ProjectRecord {
        ProjectRecord {
            remote_id: self.remote_id(),
            title: self.project_title.clone(),
            project_type: self
                .project_type
                .as_deref()
                .and_then(|t| t.parse().ok())
                .unwrap_or_default(),
            url: non_empty(self.disc_url.as_deref()),
        }
    }
}

/// One augmentation in a `ListAug` response (also returned by `CreateAug`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AugmentationListing {
    #[serde(deserialize_with = "string_or_number")]
    pub internal_augid: String,
    pub augmentation_title: String,
    #[serde(default)]
    pub augmentation_type: Option<String>,
    #[serde(default)]
    pub augmented_file: Option<String>,
    #[serde(default)]
    pub target_image: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub targetimage_trackscore: Option<f64>,
}

impl AugmentationListing {
    pub fn remote_id(&self) -> RemoteId {
        RemoteId::new(self.internal_augid.clone())
    }

    /// URL of the remote copy of `field`, if the service has one.
    pub fn file_url(&self, field: FileKind) -> Option<String> {
        match field {
            FileKind::Model => non_empty(self.augmented_file.as_deref()),
            FileKind::TargetImage => non_empty(self.target_image.as_deref()),
            _ => None,
        }
    }

    /// Local record for this listing. `has_session` is local-only and starts false.
    pub fn to_record(&self) -> AugmentationRecord {
        let model_url = self.file_url(FileKind::Model);
        let target_image_url = self.file_url(FileKind::TargetImage);
        AugmentationRecord {
            remote_id: self.remote_id(),
            title: self.augmentation_title.clone(),
            kind: AugmentationKind::Model,
            has_target_image: target_image_url.is_some(),
            has_model_file: model_url.is_some(),
            has_session: false,
            target_image_url,
            model_url,
            tracking_score: self.targetimage_trackscore,
        }
    }

    /// Copy the remote-owned fields onto an existing record, keeping local-only state.
    pub fn refresh(&self, record: &mut AugmentationRecord) -> bool {
        let mut fresh = self.to_record();
        fresh.has_session = record.has_session;
        if *record == fresh {
            return false;
        }
        *record = fresh;
        true
    }
}

/// Body of `CreateARP`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CreateProjectRequest {
    pub project_title: String,
    pub project_type: ProjectType,
    pub disc_url: String,
}

/// Body of `CreateAug/{project}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CreateAugmentationRequest {
    pub augmentation_title: String,
    pub augmentation_type: AugmentationKind,
}

/// Response of `GetQR/{project}`: download URLs of the QR pair.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QrLinks {
    #[serde(rename = "QR_Image1")]
    pub public: String,
    #[serde(rename = "AdminQRImage")]
    pub private: String,
}

/// Multipart field name used by `EditAug` for a writable file field.
pub fn edit_field_name(field: FileKind) -> Option<&'static str> {
    match field {
        FileKind::Model => Some("augmented_file"),
        FileKind::TargetImage => Some("target_image"),
        _ => None,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, found {other}"
        ))),
    }
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
