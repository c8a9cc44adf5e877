//! OpenStack adapter error types

use stackflow_config::ConfigError;
use stackflow_core::ReconcileError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenStackError {
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

    #[error("Keystone did not return a token: {0}")]
    MissingToken(String),

    #[error("No {service} endpoint for interface {interface}{region} in the service catalog")]
    EndpointNotFound {
        service: String,
        interface: String,
        region: String,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl From<OpenStackError> for ReconcileError {
    fn from(err: OpenStackError) -> Self {
        let message = err.to_string();
        match err {
            OpenStackError::Request { source, .. } => {
                ReconcileError::transport_with(message, source)
            }
            OpenStackError::Status { .. } => ReconcileError::transport(message),
            OpenStackError::InvalidJson(source) => ReconcileError::protocol_with(message, source),
            OpenStackError::MissingToken(_)
            | OpenStackError::EndpointNotFound { .. }
            | OpenStackError::InvalidUrl(_) => {
                ReconcileError::protocol(message)
            }
            OpenStackError::NotFound(message) => ReconcileError::NotFound(message),
            OpenStackError::Config(source) => source.into(),
            OpenStackError::InvalidParameter(message) => ReconcileError::Configuration(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, OpenStackError>;
