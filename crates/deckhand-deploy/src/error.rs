//! Deployment backend error types

use thiserror::Error;

/// Deployment backend errors
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Failed to construct {backend} backend for deployment '{deployment}': {message}")]
    BackendConstruction {
        deployment: String,
        backend: &'static str,
        message: String,
    },

    #[error("helm not found. Please install: brew install helm")]
    HelmNotFound,

    #[error("kubectl not found. Please install: brew install kubectl")]
    KubectlNotFound,

    #[error("{program} command failed: {stderr}")]
    CommandFailed { program: String, stderr: String },

    #[error("Release not found: {0}")]
    ReleaseNotFound(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// Whether this error was raised while constructing a backend,
    /// which is non-fatal for batch operations.
    pub fn is_construction(&self) -> bool {
        matches!(self, DeployError::BackendConstruction { .. })
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
