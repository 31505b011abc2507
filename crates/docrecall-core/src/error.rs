//! Error taxonomy for the retrieval subsystem.
//!
//! Backend-level failures are meant to be absorbed by the query fallback
//! chain; only request validation and build contention reach callers as
//! hard errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// No embedding capability is configured. Triggers the keyword path.
    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Transient provider failure that persisted through every retry.
    #[error("embedding provider call failed: {0}")]
    ProviderCallFailed(String),

    /// Permanent provider failure (authentication, quota, bad request).
    #[error("embedding provider rejected the request: {0}")]
    ProviderRejected(String),

    /// A backend's persisted artifacts are missing, corrupt, or unreachable.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("dimension mismatch: index has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("a build is already in progress")]
    BuildInProgress,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for RetrievalError {
    fn from(e: std::io::Error) -> Self {
        RetrievalError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for RetrievalError {
    fn from(e: serde_json::Error) -> Self {
        RetrievalError::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
