//! Error types for the remote API client.

use thiserror::Error;

/// A failure that happened outside the local machine.
///
/// All variants are the same kind for policy purposes: reconciliation skips the
/// affected scope, single-resource operations abort and report. Messages never
/// contain the credential.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request did not reach the server.
    #[error("Could not reach the Schol-AR service to {operation}: {reason}")]
    Unreachable { operation: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("Timed out waiting for the Schol-AR service to {operation}")]
    Timeout { operation: String },

    /// The credential was refused.
    #[error("The Schol-AR service rejected the API token while trying to {operation}")]
    Unauthorized { operation: String },

    /// A client error other than authentication (4xx).
    #[error("The Schol-AR service refused to {operation} (HTTP {status})")]
    Rejected { operation: String, status: u16 },

    /// A server-side failure (5xx).
    #[error("Schol-AR server error while trying to {operation} (HTTP {status})")]
    Server { operation: String, status: u16 },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from the Schol-AR service to {operation}: {reason}")]
    Decode { operation: String, reason: String },
}

impl RemoteError {
    /// Build the error matching an unsuccessful HTTP status.
    pub fn from_status(operation: impl Into<String>, status: u16) -> Self {
        let operation = operation.into();
        match status {
            401 => RemoteError::Unauthorized { operation },
            500..=599 => RemoteError::Server { operation, status },
            _ => RemoteError::Rejected { operation, status },
        }
    }

    /// Failures worth retrying for idempotent requests.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::Unreachable { .. }
                | RemoteError::Timeout { .. }
                | RemoteError::Server { .. }
        )
    }

    /// Check if the credential was refused.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RemoteError::Unauthorized { .. })
    }

    /// Check if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RemoteError::Timeout { .. })
    }

    /// The operation that failed.
    pub fn operation(&self) -> &str {
        match self {
            RemoteError::Unreachable { operation, .. }
            | RemoteError::Timeout { operation }
            | RemoteError::Unauthorized { operation }
            | RemoteError::Rejected { operation, .. }
            | RemoteError::Server { operation, .. }
            | RemoteError::Decode { operation, .. } => operation,
        }
    }
}

impl From<RemoteError> for crate::Error {
    fn from(err: RemoteError) -> Self {
        crate::Error::Remote(err)
    }
}
