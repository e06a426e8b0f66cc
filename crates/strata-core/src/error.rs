//! Error types and result aliases for the storage-handler protocol.
//!
//! Every error kind maps to a stage of the statement lifecycle: configuration
//! errors abort compilation, unsupported-operation errors abort the statement
//! at compile or commit time, and remote-submission errors are fatal statement
//! failures carrying the controller's response.

/// The result type used throughout the protocol layer.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the storage-handler protocol.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required table property is missing or invalid.
    ///
    /// Surfaced to the user at compile time; the statement is aborted before
    /// any partial state is created.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the missing or invalid configuration.
        message: String,
    },

    /// An operation was requested that the bound storage engine does not
    /// support.
    #[error("unsupported operation '{operation}': {message}")]
    Unsupported {
        /// The operation that was refused.
        operation: String,
        /// Why the operation is not available.
        message: String,
    },

    /// A remote controller rejected a submission.
    ///
    /// Carries the response status and body verbatim. The protocol never
    /// retries; retry policy, if any, belongs to the caller.
    #[error("remote submission failed (status={status}): {body}")]
    RemoteSubmission {
        /// HTTP status code returned by the controller.
        status: u16,
        /// Response body returned by the controller.
        body: String,
    },

    /// No authorization provider is configured but one is required.
    #[error("authorization provider unavailable: {message}")]
    AuthorizationUnavailable {
        /// Description of the missing provider.
        message: String,
    },

    /// An internal invariant was violated.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an unsupported-operation error.
    #[must_use]
    pub fn unsupported(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a remote-submission error from a response status and body.
    #[must_use]
    pub fn remote_submission(status: u16, body: impl Into<String>) -> Self {
        Self::RemoteSubmission {
            status,
            body: body.into(),
        }
    }

    /// Creates an authorization-unavailable error.
    #[must_use]
    pub fn authorization_unavailable(message: impl Into<String>) -> Self {
        Self::AuthorizationUnavailable {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
