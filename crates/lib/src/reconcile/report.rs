use serde::Serialize;

use crate::model::RemoteId;

/// What a selection-time sync changed, by title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub added: Vec<String>,
    pub refreshed: Vec<String>,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.refreshed.is_empty()
    }
}

/// A local entry deleted by cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedEntry {
    /// `alias` for projects, `alias/project title` for augmentations.
    pub scope: String,
    pub remote_id: RemoteId,
    /// `None` when only an untracked directory existed.
    pub title: Option<String>,
}

/// A scope cleanup left untouched because its listing or manifest was unusable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedScope {
    pub scope: String,
    pub reason: String,
}

/// Result of [`super::Reconciler::clean_local`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub removed_projects: Vec<RemovedEntry>,
    pub removed_augmentations: Vec<RemovedEntry>,
    pub skipped: Vec<SkippedScope>,
}

impl CleanReport {
    pub fn removed_count(&self) -> usize {
        self.removed_projects.len() + self.removed_augmentations.len()
    }
}
