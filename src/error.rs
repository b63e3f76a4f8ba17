//! Error types for the promptcast generation system.

use std::time::Duration;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Top-level errors surfaced to callers of the generation API and CLI.
///
/// Individual backend failures never show up here: they are folded into
/// per-unit outcomes. These variants are configuration or request problems
/// detected before any work is dispatched, or failures of the surrounding
/// I/O collaborators.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No backends selected for generation")]
    EmptyBackendSet,

    #[error("Backend not found: {0}")]
    BackendNotFound(String),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Credentials missing: set the {0} environment variable")]
    CredentialsMissing(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

/// Classification of a failure reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    Auth,
    RateLimited,
    ModelNotFound,
    ModelLoading,
    Request,
    Decode,
    Other,
}

impl BackendErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendErrorKind::Auth => "auth",
            BackendErrorKind::RateLimited => "rate_limited",
            BackendErrorKind::ModelNotFound => "model_not_found",
            BackendErrorKind::ModelLoading => "model_loading",
            BackendErrorKind::Request => "request",
            BackendErrorKind::Decode => "decode",
            BackendErrorKind::Other => "other",
        }
    }
}

/// Error returned by a backend invocation.
#[derive(Debug, Clone, Error)]
#[error("{} ({})", .message, .kind.as_str())]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Other, message)
    }

    /// Errors that will not go away by asking again with the same credentials and model.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            BackendErrorKind::Auth | BackendErrorKind::ModelNotFound
        )
    }
}

/// Why a single attempt produced no artifact.
#[derive(Debug, Clone, Error)]
pub enum AttemptFailure {
    /// The wait was abandoned; the call may still be running in the background.
    #[error("Generation timed out after {:.1} seconds", .after.as_secs_f64())]
    TimedOut { after: Duration },

    #[error("Backend error: {0}")]
    Backend(BackendError),

    /// The backend call panicked on its worker.
    #[error("Backend task panicked: {0}")]
    Panicked(String),

    /// The image arrived but could not be written to disk.
    #[error("Failed to save artifact: {0}")]
    Storage(String),
}

impl AttemptFailure {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AttemptFailure::TimedOut { .. })
    }

    pub fn is_fatal(&self) -> bool {
        match self {
            AttemptFailure::Backend(err) => err.is_fatal(),
            _ => false,
        }
    }
}

impl From<BackendError> for AttemptFailure {
    fn from(err: BackendError) -> Self {
        AttemptFailure::Backend(err)
    }
}
