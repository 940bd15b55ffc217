//! Manifest files: one JSON document enumerating the children of a scope.
//!
//! A manifest is loaded whole into memory, mutated there, and written back as a
//! complete replacement. The replacement is written to a uniquely named sibling
//! file first and then renamed over the old one, so a reader only ever sees the
//! previous or the next version.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use super::errors::StoreError;
use crate::{
    Result,
    model::{AugmentationRecord, ProjectRecord, UserRecord},
};

/// The current manifest format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const MANIFEST_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the manifest version during deserialization.
fn validate_manifest_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != MANIFEST_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported manifest version {version}; only version {MANIFEST_VERSION} is supported"
        )));
    }
    Ok(version)
}

#[derive(Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct ManifestFile<T> {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_manifest_version"
    )]
    version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
    #[serde(default = "Vec::new")]
    entries: Vec<T>,
}

/// A record that can live in a manifest.
pub trait ManifestEntry: Serialize + DeserializeOwned + Clone {
    /// Stable key the record is compared by (remote id, or alias for users).
    fn key(&self) -> &str;

    /// Human title of the record.
    fn title(&self) -> &str;
}

impl ManifestEntry for UserRecord {
    fn key(&self) -> &str {
        &self.alias
    }

    fn title(&self) -> &str {
        &self.alias
    }
}

impl ManifestEntry for ProjectRecord {
    fn key(&self) -> &str {
        self.remote_id.as_str()
    }

    fn title(&self) -> &str {
        &self.title
    }
}

impl ManifestEntry for AugmentationRecord {
    fn key(&self) -> &str {
        self.remote_id.as_str()
    }

    fn title(&self) -> &str {
        &self.title
    }
}

/// In-memory copy of one manifest file.
#[derive(Debug, Clone)]
pub struct Manifest<T> {
    path: PathBuf,
    entries: Vec<T>,
}

impl<T: ManifestEntry> Manifest<T> {
    /// Load the manifest at `path`. A missing file reads as an empty manifest.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(json) => {
                let file: ManifestFile<T> =
                    serde_json::from_str(&json).map_err(|e| StoreError::CorruptManifest {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;
                file.entries
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StoreError::ManifestIo { path, source: e }.into()),
        };
        Ok(Self { path, entries })
    }

    /// Write the whole manifest back to disk, replacing the previous file.
    pub async fn save(&self) -> Result<()> {
        let file = ManifestFile {
            version: MANIFEST_VERSION,
            updated_at: Some(chrono::Utc::now().to_rfc3339()),
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        write_replace(&self.path, json.as_bytes())
            .await
            .map_err(|e| StoreError::ManifestIo {
                path: self.path.clone(),
                source: e,
            })?;
        tracing::debug!(
            "Wrote {} entries to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_title(&self, title: &str) -> Option<&T> {
        self.entries.iter().find(|e| e.title() == title)
    }

    pub fn by_key(&self, key: &str) -> Option<&T> {
        self.entries.iter().find(|e| e.key() == key)
    }

    pub fn by_key_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries.iter_mut().find(|e| e.key() == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key(key).is_some()
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    /// Remove the entry with `key`, returning it.
    pub fn remove_key(&mut self, key: &str) -> Option<T> {
        let index = self.entries.iter().position(|e| e.key() == key)?;
        Some(self.entries.remove(index))
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().to_string()).collect()
    }
}

/// Write `bytes` to a temp sibling of `path`, flush it, and rename it over `path`.
async fn write_replace(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = parent.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    let result = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    result
}
