//! Error types for tag reconciliation.
//!
//! Remote failures arrive as [`ApiError`] values carrying the service's own error
//! code. The synchronizer decides per service whether a code means "the resource is
//! not visible yet" and wraps the outcome in a [`TagSyncError`].

use std::fmt;
use std::time::Duration;

/// A failure reported by a remote tag API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// Service-specific error code, e.g. `InvalidInstanceID.NotFound`.
    pub code: String,
    /// Human readable message returned by the service.
    pub message: String,
}

impl ApiError {
    /// Creates a new API error.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// The remote call a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagOperation {
    /// Batched removal of tag keys.
    Delete,
    /// Batched create-or-update of key/value pairs.
    Upsert,
}

impl fmt::Display for TagOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::Upsert => write!(f, "upsert"),
        }
    }
}

/// Errors that can occur while building or applying tag plans.
#[derive(Debug, thiserror::Error)]
pub enum TagSyncError {
    /// The resource stayed invisible to the tagging API for the whole retry window.
    #[error(
        "{operation} tags on {resource_id}: resource not visible after {attempts} attempt(s) in {elapsed:?}: {source}"
    )]
    RetryWindowElapsed {
        /// Resource the call targeted.
        resource_id: String,
        /// Which call kept failing.
        operation: TagOperation,
        /// Number of attempts made, including the first.
        attempts: u32,
        /// Time spent inside the retry loop.
        elapsed: Duration,
        /// The last error returned by the remote API.
        #[source]
        source: ApiError,
    },

    /// A non-retryable remote failure.
    #[error("{operation} tags on {resource_id} failed: {source}")]
    Api {
        /// Resource the call targeted.
        resource_id: String,
        /// Which call failed.
        operation: TagOperation,
        /// The error returned by the remote API.
        #[source]
        source: ApiError,
    },

    /// The caller cancelled the synchronization while a call was being retried.
    #[error("{operation} tags on {resource_id} cancelled")]
    Cancelled {
        /// Resource the call targeted.
        resource_id: String,
        /// Which call was in flight.
        operation: TagOperation,
    },

    /// A tag could not be constructed.
    #[error("Invalid tag: {message}")]
    InvalidTag {
        /// Description of why the tag is invalid.
        message: String,
    },

    /// A reserved-key pattern failed to compile.
    #[error("Invalid reserved-key pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compiler message.
        message: String,
    },
}

impl TagSyncError {
    /// Creates a new `InvalidTag` error.
    #[must_use]
    pub fn invalid_tag(message: impl Into<String>) -> Self {
        Self::InvalidTag {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidPattern` error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Api` error.
    #[must_use]
    pub fn api(resource_id: impl Into<String>, operation: TagOperation, source: ApiError) -> Self {
        Self::Api {
            resource_id: resource_id.into(),
            operation,
            source,
        }
    }

    /// Returns `true` if the resource never became visible inside the retry window.
    #[must_use]
    pub fn is_retry_window_elapsed(&self) -> bool {
        matches!(self, Self::RetryWindowElapsed { .. })
    }

    /// Returns `true` if the synchronization was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The remote call this error belongs to, if any.
    #[must_use]
    pub fn operation(&self) -> Option<TagOperation> {
        match self {
            Self::RetryWindowElapsed { operation, .. }
            | Self::Api { operation, .. }
            | Self::Cancelled { operation, .. } => Some(*operation),
            Self::InvalidTag { .. } | Self::InvalidPattern { .. } => None,
        }
    }

    /// The remote error behind this failure, if any.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::RetryWindowElapsed { source, .. } | Self::Api { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RetryWindowElapsed { .. } => ErrorCategory::TransientNotFound,
            Self::Api { .. } => ErrorCategory::Permanent,
            Self::Cancelled { .. } => ErrorCategory::Cancelled,
            Self::InvalidTag { .. } | Self::InvalidPattern { .. } => ErrorCategory::Invalid,
        }
    }
}

/// Categories of tag sync errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Eventual-consistency failure that outlived the retry window.
    TransientNotFound,
    /// Any other remote failure.
    Permanent,
    /// Stopped by the caller.
    Cancelled,
    /// Bad local input.
    Invalid,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransientNotFound => write!(f, "transient_not_found"),
            Self::Permanent => write!(f, "permanent"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}
