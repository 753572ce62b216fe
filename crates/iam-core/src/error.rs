//! Error types for IAM Core operations.
//!
//! Following TigerStyle principles:
//! - Explicit error handling with `map_err` (no `From` implementations)
//! - Detailed context in error messages
//! - No panics or unwraps in error construction

/// Main error type for all IAM Core operations.
///
/// Variants correspond one-to-one with the domain-neutral error taxonomy:
/// `InvalidArgument`, `NotFound`, `AlreadyExists`, `Unauthenticated`,
/// `PermissionDenied`, `FailedPrecondition`, `Internal`. Transport layers
/// map each variant to a status code; this type carries no transport
/// concepts itself.
#[derive(Debug, thiserror::Error)]
pub enum IamError {
    /// Malformed input: bad status value, bad policy document, bad name/email.
    #[error("invalid argument: field='{field}', reason='{reason}'")]
    InvalidArgument {
        /// The field that failed validation
        field: String,
        /// Why the validation failed
        reason: String,
    },

    /// Entity absent.
    #[error("not found: entity='{entity}', key='{key}'")]
    NotFound {
        /// The kind of entity that was looked up
        entity: String,
        /// The lookup key used
        key: String,
    },

    /// Unique constraint violated at admission.
    #[error("already exists: entity='{entity}', key='{key}'")]
    AlreadyExists {
        /// The kind of entity
        entity: String,
        /// The conflicting key
        key: String,
    },

    /// Missing credentials, bad signature, unknown access key, expired timestamp.
    #[error("unauthenticated: {reason}")]
    Unauthenticated {
        /// Why authentication failed. Messages are generic by design: no
        /// differential disclosure between "no such key" and "bad signature".
        reason: String,
    },

    /// Authenticated but the key is inactive, or policy evaluation denied an
    /// explicit check.
    #[error("permission denied: {reason}")]
    PermissionDenied {
        /// Why the request was denied
        reason: String,
    },

    /// A storage invariant was violated (e.g. decrypt-any exhausted all keys).
    #[error("failed precondition: {reason}")]
    FailedPrecondition {
        /// Why the precondition failed
        reason: String,
    },

    /// Unexpected storage or crypto failure. Never carries key material.
    #[error("internal error: operation='{operation}', reason='{reason}'")]
    Internal {
        /// The operation that failed
        operation: String,
        /// Why it failed
        reason: String,
    },

    /// Configuration error during setup.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl IamError {
    /// Creates an invalid-argument error.
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            key: key.into(),
        }
    }

    /// Creates an already-exists error.
    pub fn already_exists(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity: entity.into(),
            key: key.into(),
        }
    }

    /// Creates an unauthenticated error.
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated {
            reason: reason.into(),
        }
    }

    /// Creates a permission-denied error.
    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
        }
    }

    /// Creates a failed-precondition error.
    pub fn failed_precondition(reason: impl Into<String>) -> Self {
        Self::FailedPrecondition {
            reason: reason.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Internal {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}
