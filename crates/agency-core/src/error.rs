use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgencyError {
    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration in {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    #[error("capability not found: {0}")]
    CapabilityNotFound(String),

    #[error("duplicate capability identifier '{id}' ({first} and {second})")]
    DuplicateCapability {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgencyError>;
