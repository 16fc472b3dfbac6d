//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tool gateway
///
/// Every dispatch stage converts its local failure into one of these
/// variants; the protocol layer maps them onto stable error codes. Store
/// and collaborator internals are carried in `Storage`/`Internal` and are
/// never surfaced verbatim to callers.
#[derive(Error, Debug)]
pub enum Error {
    /// Request envelope could not be parsed or is not a valid request
    #[error("Malformed request: {message}")]
    MalformedRequest {
        /// Description of what was malformed
        message: String,
    },

    /// Missing, invalid, or expired credential
    #[error("Unauthenticated: {message}")]
    Unauthenticated {
        /// Description of the authentication failure
        message: String,
    },

    /// Credential was found but has passed its expiry
    ///
    /// Distinct from `Unauthenticated` so callers can prompt a re-login
    /// instead of retrying with the same credential.
    #[error("Credential expired: {message}")]
    CredentialExpired {
        /// Description of the expired credential
        message: String,
    },

    /// Credential is valid but not allowed to invoke the capability
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Description of the denied action
        message: String,
    },

    /// Caller exceeded its request budget for the current window
    #[error("Rate limit exceeded")]
    RateLimited {
        /// Configured request budget for the window
        limit: u32,
        /// Unix timestamp (seconds) at which the window resets
        reset_at: i64,
    },

    /// Named capability does not exist for the caller
    #[error("Capability not found: {name}")]
    CapabilityNotFound {
        /// The capability name that failed to resolve
        name: String,
    },

    /// Capability resolved but failed while executing
    #[error("Execution failed: {message}")]
    ExecutionFailure {
        /// Collaborator-supplied failure message, preserved for diagnostics
        message: String,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument
        message: String,
    },

    /// Resource not found
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// Durable store operation error
    #[error("Store error: {message}")]
    Storage {
        /// Description of the store failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },

    /// JSON parsing or serialization error
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// I/O operation error
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a malformed-request error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Create an unauthenticated error
    pub fn unauthenticated<S: Into<String>>(message: S) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Create a credential-expired error
    pub fn credential_expired<S: Into<String>>(message: S) -> Self {
        Self::CredentialExpired {
            message: message.into(),
        }
    }

    /// Create a permission-denied error
    pub fn permission_denied<S: Into<String>>(message: S) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a capability-not-found error
    pub fn capability_not_found<S: Into<String>>(name: S) -> Self {
        Self::CapabilityNotFound { name: name.into() }
    }

    /// Create an execution-failure error
    pub fn execution<S: Into<String>>(message: S) -> Self {
        Self::ExecutionFailure {
            message: message.into(),
        }
    }

    /// Create an invalid-argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
