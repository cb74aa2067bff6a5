//! Error types for the pipeline
//!
//! Provides error handling for:
//! - Lifecycle violations surfaced by operation wrappers
//! - Repository lookups and writes
//! - Cancelled long-running operations
//! - Configuration loading
//! - Activity log integrity

use agrismart_core::{LifecycleError, RequestId, RequestStatus};

/// Main operation error type
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// Requested status is not a successor of the current one
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// No request with this id
    #[error("scan request not found: {0}")]
    NotFound(RequestId),

    /// Storage failure
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Analysis engine failure
    #[error("analysis failed: {0}")]
    Analysis(String),

    /// Caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,
}

impl OperationError {
    /// Whether the caller may retry.
    ///
    /// Nothing in the pipeline retries on its own; this only classifies.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Analysis(_) | Self::Cancelled)
    }

    /// The rejected `(from, to)` pair, if this is a lifecycle violation
    #[must_use]
    pub fn invalid_transition(&self) -> Option<(RequestStatus, RequestStatus)> {
        match self {
            Self::Lifecycle(e) => Some(e.attempted()),
            _ => None,
        }
    }
}

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// Insert of an id that already exists
    #[error("duplicate scan request id: {0}")]
    Duplicate(RequestId),

    /// Save of an id that does not exist
    #[error("scan request not stored: {0}")]
    NotFound(RequestId),

    /// Save against a stale snapshot
    #[error("scan request {id} is {stored}, expected {expected}")]
    StatusConflict {
        /// Request being saved
        id: RequestId,
        /// Status the writer loaded
        expected: RequestStatus,
        /// Status currently stored
        stored: RequestStatus,
    },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Activity log errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// Hash chain broken at the given position
    #[error("activity log integrity violation at entry {0}")]
    IntegrityViolation(usize),
}
