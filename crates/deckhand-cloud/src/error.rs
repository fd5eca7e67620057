//! Provider configuration error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
