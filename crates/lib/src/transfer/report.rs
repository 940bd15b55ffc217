use std::path::{Path, PathBuf};

use crate::{Error, Result, model::FileKind};

/// Which augmentation fields a multi-field transfer covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelection {
    pub model: bool,
    pub target_image: bool,
}

impl FieldSelection {
    /// Downloads fetch the target image only unless asked otherwise.
    pub fn download_defaults() -> Self {
        Self {
            model: false,
            target_image: true,
        }
    }

    /// Uploads send the model only unless asked otherwise.
    pub fn upload_defaults() -> Self {
        Self {
            model: true,
            target_image: false,
        }
    }

    pub fn all() -> Self {
        Self {
            model: true,
            target_image: true,
        }
    }

    /// Selected fields, model first. The service mishandles a model replaced
    /// right after its target image.
    pub fn fields(&self) -> Vec<FileKind> {
        let mut fields = Vec::with_capacity(2);
        if self.model {
            fields.push(FileKind::Model);
        }
        if self.target_image {
            fields.push(FileKind::TargetImage);
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        !self.model && !self.target_image
    }
}

/// Source paths for an upload, per field. A missing entry uploads the staged file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSources {
    pub model: Option<PathBuf>,
    pub target_image: Option<PathBuf>,
}

impl FieldSources {
    pub fn get(&self, field: FileKind) -> Option<&Path> {
        match field {
            FileKind::Model => self.model.as_deref(),
            FileKind::TargetImage => self.target_image.as_deref(),
            _ => None,
        }
    }
}

/// Result of one field in a multi-field transfer.
#[derive(Debug)]
pub struct FieldOutcome {
    pub field: FileKind,
    /// Local path written or read on success.
    pub result: Result<PathBuf>,
    pub warning: Option<&'static str>,
}

impl FieldOutcome {
    pub fn new(field: FileKind, result: Result<PathBuf>) -> Self {
        Self {
            field,
            result,
            warning: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn path(&self) -> Option<&Path> {
        self.result.as_ref().ok().map(PathBuf::as_path)
    }

    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }
}

/// Per-field results of a transfer. A failed field never prevents the others.
#[derive(Debug, Default)]
pub struct TransferReport {
    pub outcomes: Vec<FieldOutcome>,
}

impl TransferReport {
    pub fn push(&mut self, outcome: FieldOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcome(&self, field: FileKind) -> Option<&FieldOutcome> {
        self.outcomes.iter().find(|o| o.field == field)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FieldOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(FieldOutcome::is_success)
    }

    pub fn warnings(&self) -> impl Iterator<Item = (FileKind, &'static str)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.warning.map(|w| (o.field, w)))
    }
}
