//! Keycloak adapter error types

use stackflow_config::ConfigError;
use stackflow_core::ReconcileError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeycloakError {
    #[error("{action}: {source}")]
    Request {
        action: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{action}: HTTP {status}: {body}")]
    Status {
        action: String,
        status: u16,
        body: String,
    },

    #[error("API returned incorrect JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Could not obtain access token: {0}")]
    Token(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<KeycloakError> for ReconcileError {
    fn from(err: KeycloakError) -> Self {
        let message = err.to_string();
        match err {
            KeycloakError::Request { source, .. } => {
                ReconcileError::transport_with(message, source)
            }
            KeycloakError::Status { .. } | KeycloakError::Token(_) => {
                ReconcileError::transport(message)
            }
            KeycloakError::InvalidJson(source) => ReconcileError::protocol_with(message, source),
            KeycloakError::Config(source) => source.into(),
            KeycloakError::InvalidUrl(_) => ReconcileError::Configuration(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, KeycloakError>;
