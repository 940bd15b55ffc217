//! In-memory stand-in for the Schol-AR service.
//!
//! Holds accounts keyed by token, counts every call per [`Operation`], and can
//! be told to fail specific operations. Site-side helpers (`add_project`,
//! `delete_augmentation`, ...) simulate changes made through the website.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;

use super::{
    RemoteApi, RemoteError,
    protocol::{AugmentationListing, ProjectListing, QrLinks},
};
use crate::{
    Result,
    model::{AugmentationKind, Credential, FileKind, ProjectType, RemoteId},
    validation::ValidationError,
};

/// Calls recorded by [`InMemoryRemote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ValidateCredential,
    ListProjects,
    CreateProject,
    ListAugmentations,
    CreateAugmentation,
    ReplaceFile,
    QrLinks,
    FetchFile,
}

impl Operation {
    /// Operations that change remote state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Operation::CreateProject | Operation::CreateAugmentation | Operation::ReplaceFile
        )
    }

    fn describe(&self) -> &'static str {
        match self {
            Operation::ValidateCredential => "validate the API token",
            Operation::ListProjects => "list projects",
            Operation::CreateProject => "create a project",
            Operation::ListAugmentations => "list augmentations",
            Operation::CreateAugmentation => "create an augmentation",
            Operation::ReplaceFile => "upload a file",
            Operation::QrLinks => "fetch QR links",
            Operation::FetchFile => "download a file",
        }
    }
}

#[derive(Debug)]
struct Failure {
    operation: Operation,
    /// Project id, augmentation id, field name or URL the failure is limited to.
    scope: Option<String>,
    /// `None` fails forever.
    remaining: Option<usize>,
    status: u16,
}

#[derive(Debug)]
struct RemoteProject {
    listing: ProjectListing,
    augmentations: Vec<AugmentationListing>,
    qr: Option<QrLinks>,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Vec<RemoteProject>>,
    files: HashMap<String, Vec<u8>>,
    calls: HashMap<Operation, usize>,
    failures: Vec<Failure>,
    next_id: u64,
}

impl State {
    fn record(&mut self, operation: Operation, scopes: &[&str]) -> Result<()> {
        *self.calls.entry(operation).or_default() += 1;
        let hit = self.failures.iter_mut().find(|f| {
            f.operation == operation
                && f.remaining != Some(0)
                && f.scope
                    .as_deref()
                    .is_none_or(|scope| scopes.contains(&scope))
        });
        if let Some(failure) = hit {
            if let Some(remaining) = failure.remaining.as_mut() {
                *remaining -= 1;
            }
            return Err(RemoteError::from_status(operation.describe(), failure.status).into());
        }
        Ok(())
    }

    fn account(&mut self, operation: Operation, credential: &Credential) -> Result<&mut Vec<RemoteProject>> {
        self.accounts.get_mut(credential.expose()).ok_or_else(|| {
            RemoteError::Unauthorized {
                operation: operation.describe().to_string(),
            }
            .into()
        })
    }

    fn project(
        &mut self,
        operation: Operation,
        credential: &Credential,
        project: &RemoteId,
    ) -> Result<&mut RemoteProject> {
        self.account(operation, credential)?
            .iter_mut()
            .find(|p| p.listing.qr_string == project.as_str())
            .ok_or_else(|| RemoteError::from_status(operation.describe(), 404).into())
    }

    fn allocate(&mut self, prefix: char) -> String {
        self.next_id += 1;
        format!("{prefix}{:07}", self.next_id)
    }

    fn new_project(&mut self, token: &str, title: &str, project_type: ProjectType, url: &str) -> ProjectListing {
        let id = self.allocate('P');
        self.project_with_id(token, id, title, project_type, url)
    }

    fn project_with_id(
        &mut self,
        token: &str,
        id: String,
        title: &str,
        project_type: ProjectType,
        url: &str,
    ) -> ProjectListing {
        let public = format!("memory://{id}/qr/public.png");
        let private = format!("memory://{id}/qr/admin.png");
        self.files
            .insert(public.clone(), format!("public-qr:{id}").into_bytes());
        self.files
            .insert(private.clone(), format!("admin-qr:{id}").into_bytes());
        let listing = ProjectListing {
            qr_string: id,
            project_title: title.to_string(),
            project_type: Some(project_type.as_str().to_string()),
            disc_url: Some(url.to_string()),
        };
        self.accounts
            .entry(token.to_string())
            .or_default()
            .push(RemoteProject {
                listing: listing.clone(),
                augmentations: Vec::new(),
                qr: Some(QrLinks { public, private }),
            });
        listing
    }

    fn new_augmentation(&mut self, token: &str, project: &RemoteId, title: &str) -> Option<AugmentationListing> {
        let id = self.allocate('A');
        self.augmentation_with_id(token, project, id, title)
    }

    fn augmentation_with_id(
        &mut self,
        token: &str,
        project: &RemoteId,
        id: String,
        title: &str,
    ) -> Option<AugmentationListing> {
        let listing = AugmentationListing {
            internal_augid: id,
            augmentation_title: title.to_string(),
            augmentation_type: Some(AugmentationKind::Model.as_str().to_string()),
            augmented_file: None,
            target_image: None,
            targetimage_trackscore: None,
        };
        let remote = self
            .accounts
            .get_mut(token)?
            .iter_mut()
            .find(|p| p.listing.qr_string == project.as_str())?;
        remote.augmentations.push(listing.clone());
        Some(listing)
    }

    fn store_file(
        &mut self,
        project: &RemoteId,
        augmentation: &RemoteId,
        field: FileKind,
        bytes: Vec<u8>,
    ) -> Option<String> {
        self.next_id += 1;
        let url = format!("memory://{project}/{augmentation}/{field}/{}", self.next_id);
        let listing = self
            .accounts
            .values_mut()
            .flat_map(|projects| projects.iter_mut())
            .filter(|p| p.listing.qr_string == project.as_str())
            .flat_map(|p| p.augmentations.iter_mut())
            .find(|a| a.internal_augid == augmentation.as_str())?;
        match field {
            FileKind::Model => listing.augmented_file = Some(url.clone()),
            FileKind::TargetImage => listing.target_image = Some(url.clone()),
            _ => return None,
        }
        self.files.insert(url.clone(), bytes);
        Some(url)
    }
}

/// Test double implementing [`RemoteApi`] entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    state: Mutex<State>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // === Site-side setup ===

    /// Register a token as valid.
    pub fn add_account(&self, token: &str) {
        self.state().accounts.entry(token.to_string()).or_default();
    }

    /// Create a project as if through the website.
    pub fn add_project(&self, token: &str, title: &str, project_type: ProjectType) -> RemoteId {
        self.state()
            .new_project(token, title, project_type, "")
            .remote_id()
    }

    /// Create an augmentation as if through the website.
    pub fn add_augmentation(&self, token: &str, project: &RemoteId, title: &str) -> Option<RemoteId> {
        self.state()
            .new_augmentation(token, project, title)
            .map(|a| a.remote_id())
    }

    /// Create a project under an id chosen by the caller instead of the allocator.
    pub fn add_project_with_id(
        &self,
        token: &str,
        id: &str,
        title: &str,
        project_type: ProjectType,
    ) -> RemoteId {
        self.state()
            .project_with_id(token, id.to_string(), title, project_type, "")
            .remote_id()
    }

    /// Create an augmentation under an id chosen by the caller instead of the allocator.
    pub fn add_augmentation_with_id(
        &self,
        token: &str,
        project: &RemoteId,
        id: &str,
        title: &str,
    ) -> Option<RemoteId> {
        self.state()
            .augmentation_with_id(token, project, id.to_string(), title)
            .map(|a| a.remote_id())
    }

    /// Attach a remote file to an augmentation as if uploaded through the website.
    pub fn put_file(
        &self,
        project: &RemoteId,
        augmentation: &RemoteId,
        field: FileKind,
        bytes: impl Into<Vec<u8>>,
    ) -> Option<String> {
        self.state()
            .store_file(project, augmentation, field, bytes.into())
    }

    pub fn set_tracking_score(&self, project: &RemoteId, augmentation: &RemoteId, score: f64) {
        let mut state = self.state();
        for remote in state.accounts.values_mut().flat_map(|p| p.iter_mut()) {
            if remote.listing.qr_string != project.as_str() {
                continue;
            }
            for aug in remote.augmentations.iter_mut() {
                if aug.internal_augid == augmentation.as_str() {
                    aug.targetimage_trackscore = Some(score);
                }
            }
        }
    }

    pub fn rename_augmentation(&self, project: &RemoteId, augmentation: &RemoteId, title: &str) {
        let mut state = self.state();
        for remote in state.accounts.values_mut().flat_map(|p| p.iter_mut()) {
            if remote.listing.qr_string != project.as_str() {
                continue;
            }
            for aug in remote.augmentations.iter_mut() {
                if aug.internal_augid == augmentation.as_str() {
                    aug.augmentation_title = title.to_string();
                }
            }
        }
    }

    pub fn delete_project(&self, token: &str, project: &RemoteId) {
        if let Some(projects) = self.state().accounts.get_mut(token) {
            projects.retain(|p| p.listing.qr_string != project.as_str());
        }
    }

    pub fn delete_augmentation(&self, token: &str, project: &RemoteId, augmentation: &RemoteId) {
        if let Some(projects) = self.state().accounts.get_mut(token) {
            for remote in projects.iter_mut() {
                if remote.listing.qr_string == project.as_str() {
                    remote
                        .augmentations
                        .retain(|a| a.internal_augid != augmentation.as_str());
                }
            }
        }
    }

    // === Inspection ===

    /// Bytes of the current remote copy of a writable field.
    pub fn file(&self, project: &RemoteId, augmentation: &RemoteId, field: FileKind) -> Option<Vec<u8>> {
        let state = self.state();
        let listing = state
            .accounts
            .values()
            .flat_map(|p| p.iter())
            .filter(|p| p.listing.qr_string == project.as_str())
            .flat_map(|p| p.augmentations.iter())
            .find(|a| a.internal_augid == augmentation.as_str())?;
        let url = listing.file_url(field)?;
        state.files.get(&url).cloned()
    }

    pub fn project_count(&self, token: &str) -> usize {
        self.state().accounts.get(token).map_or(0, |p| p.len())
    }

    pub fn augmentation_count(&self, token: &str, project: &RemoteId) -> usize {
        self.state()
            .accounts
            .get(token)
            .and_then(|p| p.iter().find(|p| p.listing.qr_string == project.as_str()))
            .map_or(0, |p| p.augmentations.len())
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.state().calls.get(&operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.values().sum()
    }

    /// Number of calls that could have changed remote state.
    pub fn mutating_calls(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|(op, _)| op.is_mutating())
            .map(|(_, n)| n)
            .sum()
    }

    pub fn reset_calls(&self) {
        self.state().calls.clear();
    }

    // === Failure injection ===

    /// Fail every call of `operation` with a server error.
    pub fn fail(&self, operation: Operation) {
        self.push_failure(operation, None, None, 503);
    }

    /// Fail calls of `operation` that touch `scope` (a project id, augmentation id,
    /// field name or file URL).
    pub fn fail_scoped(&self, operation: Operation, scope: &str) {
        self.push_failure(operation, Some(scope.to_string()), None, 503);
    }

    /// Fail the next `times` calls of `operation`, then behave normally.
    pub fn fail_times(&self, operation: Operation, times: usize) {
        self.push_failure(operation, None, Some(times), 503);
    }

    /// Fail every call of `operation` with the given HTTP status.
    pub fn fail_with_status(&self, operation: Operation, status: u16) {
        self.push_failure(operation, None, None, status);
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    fn push_failure(&self, operation: Operation, scope: Option<String>, remaining: Option<usize>, status: u16) {
        self.state().failures.push(Failure {
            operation,
            scope,
            remaining,
            status,
        });
    }
}

#[async_trait]
impl RemoteApi for InMemoryRemote {
    async fn validate_credential(&self, credential: &Credential) -> Result<bool> {
        let mut state = self.state();
        state.record(Operation::ValidateCredential, &[])?;
        Ok(state.accounts.contains_key(credential.expose()))
    }

    async fn list_projects(&self, credential: &Credential) -> Result<Vec<ProjectListing>> {
        let mut state = self.state();
        state.record(Operation::ListProjects, &[])?;
        Ok(state
            .account(Operation::ListProjects, credential)?
            .iter()
            .map(|p| p.listing.clone())
            .collect())
    }

    async fn create_project(
        &self,
        credential: &Credential,
        title: &str,
        project_type: ProjectType,
        url: &str,
    ) -> Result<ProjectListing> {
        let mut state = self.state();
        state.record(Operation::CreateProject, &[])?;
        state.account(Operation::CreateProject, credential)?;
        Ok(state.new_project(credential.expose(), title, project_type, url))
    }

    async fn list_augmentations(
        &self,
        credential: &Credential,
        project: &RemoteId,
    ) -> Result<Vec<AugmentationListing>> {
        let mut state = self.state();
        state.record(Operation::ListAugmentations, &[project.as_str()])?;
        Ok(state
            .project(Operation::ListAugmentations, credential, project)?
            .augmentations
            .clone())
    }

    async fn create_augmentation(
        &self,
        credential: &Credential,
        project: &RemoteId,
        title: &str,
        _kind: AugmentationKind,
    ) -> Result<AugmentationListing> {
        let mut state = self.state();
        state.record(Operation::CreateAugmentation, &[project.as_str()])?;
        state.project(Operation::CreateAugmentation, credential, project)?;
        state
            .new_augmentation(credential.expose(), project, title)
            .ok_or_else(|| RemoteError::from_status(Operation::CreateAugmentation.describe(), 404).into())
    }

    async fn replace_file(
        &self,
        credential: &Credential,
        project: &RemoteId,
        augmentation: &RemoteId,
        field: FileKind,
        _file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        if !field.is_remote_writable() {
            return Err(ValidationError::NotUploadable { field }.into());
        }
        let mut state = self.state();
        state.record(
            Operation::ReplaceFile,
            &[project.as_str(), augmentation.as_str(), field.as_str()],
        )?;
        state.project(Operation::ReplaceFile, credential, project)?;
        state
            .store_file(project, augmentation, field, bytes)
            .map(|_| ())
            .ok_or_else(|| RemoteError::from_status(Operation::ReplaceFile.describe(), 404).into())
    }

    async fn qr_links(&self, credential: &Credential, project: &RemoteId) -> Result<QrLinks> {
        let mut state = self.state();
        state.record(Operation::QrLinks, &[project.as_str()])?;
        state
            .project(Operation::QrLinks, credential, project)?
            .qr
            .clone()
            .ok_or_else(|| RemoteError::from_status(Operation::QrLinks.describe(), 404).into())
    }

    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>> {
        let mut state = self.state();
        state.record(Operation::FetchFile, &[url])?;
        state
            .files
            .get(url)
            .cloned()
            .ok_or_else(|| RemoteError::from_status(Operation::FetchFile.describe(), 404).into())
    }
}
