//!
//! scholar-sync: keeps a local mirror of Schol-AR projects and augmentations.
//!
//! ## Core Concepts
//!
//! * **Local state store (`store::LocalStore`)**: the users -> projects -> augmentations
//!   manifest hierarchy on disk, with directories keyed by remote id (`layout::Layout`).
//! * **Reconciliation (`reconcile::Reconciler`)**: additive sync of the local manifests
//!   whenever a resource is selected, and destructive cleanup of local state whose
//!   remote counterpart was deleted on the website.
//! * **Transfers (`transfer::TransferManager`)**: size-checked uploads, downloads and
//!   exports of the model, target image, session and QR files.
//! * **Remote API (`remote::RemoteApi`)**: the Schol-AR REST service, implemented over
//!   HTTP by `remote::HttpRemote`.
//! * **Workspace (`workspace::Workspace`)**: the alias/title based operations a front
//!   end calls.

pub mod config;
pub mod constants;
pub mod layout;
pub mod model;
pub mod reconcile;
pub mod remote;
pub mod session;
pub mod store;
pub mod transfer;
pub mod validation;
pub mod workspace;

pub use config::ClientConfig;
pub use model::{
    AugmentationKind, AugmentationRecord, Credential, FileKind, ProjectRecord, ProjectType,
    RemoteId, UserRecord,
};
pub use workspace::Workspace;

/// Result type used throughout the scholar-sync library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the scholar-sync library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Invalid client configuration
    #[error(transparent)]
    Config(config::ConfigError),

    /// Input rejected before any side effect
    #[error(transparent)]
    Validation(validation::ValidationError),

    /// Local manifest and directory errors
    #[error(transparent)]
    Store(store::StoreError),

    /// Network and server failures
    #[error(transparent)]
    Remote(remote::RemoteError),

    /// File transfer errors
    #[error(transparent)]
    Transfer(transfer::TransferError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
            Error::Config(_) => "config",
            Error::Validation(_) => "validation",
            Error::Store(_) => "store",
            Error::Remote(_) => "remote",
            Error::Transfer(_) => "transfer",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_not_found(),
            Error::Transfer(transfer_err) => transfer_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if the input was rejected before anything happened.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Config(_))
    }

    /// Check if the failure happened outside the local machine.
    pub fn is_non_local(&self) -> bool {
        matches!(self, Error::Remote(_))
    }

    /// Check if the local mirror itself is unreadable or unwritable.
    pub fn is_local_state_error(&self) -> bool {
        match self {
            Error::Store(_) | Error::Io(_) | Error::Serialize(_) => true,
            Error::Transfer(transfer_err) => transfer_err.is_io_error(),
            _ => false,
        }
    }

    /// Check if the credential was refused.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Error::Remote(remote_err) => remote_err.is_unauthorized(),
            _ => false,
        }
    }

    /// Check if this error indicates a timeout.
    pub fn is_timeout_error(&self) -> bool {
        match self {
            Error::Remote(remote_err) => remote_err.is_timeout(),
            _ => false,
        }
    }

    /// Check if this error is about an oversized upload.
    pub fn is_size_error(&self) -> bool {
        match self {
            Error::Validation(validation_err) => validation_err.is_size_error(),
            _ => false,
        }
    }

    /// A corrective action for the user, when there is an obvious one.
    pub fn suggestion(&self) -> Option<&'static str> {
        use remote::RemoteError;
        use store::StoreError;
        use transfer::TransferError;
        use validation::ValidationError;

        match self {
            Error::Validation(ValidationError::FileTooLarge { .. }) => Some(
                "Reduce the model detail or image resolution until the file is below the limit, then try again.",
            ),
            Error::Validation(ValidationError::InvalidName { .. }) => {
                Some("Use only letters, numbers, and spaces.")
            }
            Error::Validation(ValidationError::MissingCredential { .. }) => {
                Some("Pass the API token shown on your Schol-AR account page.")
            }
            Error::Remote(RemoteError::Unauthorized { .. }) => {
                Some("Check the API token and log in again.")
            }
            Error::Remote(remote_err) if remote_err.is_transient() => {
                Some("Check your network connection and try again later.")
            }
            Error::Remote(RemoteError::Rejected { status: 404, .. })
            | Error::Transfer(TransferError::RemoteMissing { .. }) => Some(
                "The resource may have been deleted on the website; clean the local state to drop it.",
            ),
            Error::Store(StoreError::UserNotFound { .. }) => {
                Some("Log in with this username and an API token first.")
            }
            Error::Store(StoreError::ProjectNotFound { .. }) => {
                Some("Select or create the project first.")
            }
            Error::Store(StoreError::AugmentationNotFound { .. }) => {
                Some("Select or create the augmentation first.")
            }
            Error::Store(StoreError::CorruptManifest { .. }) => Some(
                "Move the damaged manifest aside and log in again to rebuild it from the remote listing.",
            ),
            Error::Transfer(TransferError::NothingStaged { .. }) => {
                Some("Pass the path of the file to upload.")
            }
            Error::Transfer(TransferError::NothingToDownload { .. }) => {
                Some("Upload the file first, or download a different field.")
            }
            _ => None,
        }
    }
}
