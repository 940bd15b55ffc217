//! Access to the Schol-AR service.
//!
//! [`RemoteApi`] is the seam between local bookkeeping and the network. The
//! production implementation is [`HttpRemote`]; tests use the in-memory
//! implementation behind the `testing` feature.

use async_trait::async_trait;

use crate::{
    Result,
    model::{AugmentationKind, Credential, FileKind, ProjectType, RemoteId},
};

pub mod errors;
pub mod http;
#[cfg(any(test, feature = "testing"))]
pub mod in_memory;
pub mod protocol;
pub mod retry;

pub use errors::RemoteError;
pub use http::HttpRemote;
#[cfg(any(test, feature = "testing"))]
pub use in_memory::{InMemoryRemote, Operation};
pub use protocol::{AugmentationListing, ProjectListing, QrLinks};
pub use retry::RetryPolicy;

/// Operations the Schol-AR REST API exposes to this client.
///
/// Every call is authenticated by the given credential. Implementations must
/// never include the credential in errors or logs.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Check whether the credential is accepted.
    ///
    /// Returns `Ok(false)` when the service answers "unauthorized" and an error
    /// when it cannot be asked at all.
    async fn validate_credential(&self, credential: &Credential) -> Result<bool>;

    /// All projects owned by the credential.
    async fn list_projects(&self, credential: &Credential) -> Result<Vec<ProjectListing>>;

    /// Create a project and return the listing with its allocated id.
    async fn create_project(
        &self,
        credential: &Credential,
        title: &str,
        project_type: ProjectType,
        url: &str,
    ) -> Result<ProjectListing>;

    /// All augmentations of a project.
    async fn list_augmentations(
        &self,
        credential: &Credential,
        project: &RemoteId,
    ) -> Result<Vec<AugmentationListing>>;

    /// Create an augmentation and return the listing with its allocated id.
    async fn create_augmentation(
        &self,
        credential: &Credential,
        project: &RemoteId,
        title: &str,
        kind: AugmentationKind,
    ) -> Result<AugmentationListing>;

    /// Replace the remote copy of a writable file field.
    async fn replace_file(
        &self,
        credential: &Credential,
        project: &RemoteId,
        augmentation: &RemoteId,
        field: FileKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<()>;

    /// Download URLs of a project's QR pair.
    async fn qr_links(&self, credential: &Credential, project: &RemoteId) -> Result<QrLinks>;

    /// Fetch the bytes behind a file URL returned by a listing.
    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>>;
}
