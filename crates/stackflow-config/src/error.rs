use stackflow_core::ReconcileError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("auth_type must be one of [environment, cloud, password], got '{0}'")]
    InvalidAuthType(String),

    #[error("clouds.yaml not found")]
    CloudsFileNotFound,

    #[error("cloud '{0}' not found in {1}")]
    CloudNotFound(String, String),

    #[error("missing required setting: {0}")]
    Missing(String),

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for ReconcileError {
    fn from(err: ConfigError) -> Self {
        ReconcileError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
