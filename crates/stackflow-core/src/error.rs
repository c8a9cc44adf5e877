//! Reconciliation error types

use thiserror::Error;

/// Boxed underlying cause carried by transport and protocol failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by every reconciliation
///
/// Client crates convert their own error types into this one, so the
/// invocation boundary only ever has to render a single taxonomy.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Network failure or non-success HTTP status
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Malformed or unexpected response body
    #[error("{message}")]
    Protocol {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A specific identity was requested but does not exist
    #[error("{0}")]
    NotFound(String),

    /// Convergence wait exceeded its deadline
    #[error("{0}")]
    Timeout(String),

    /// Invalid combination of caller-supplied parameters
    #[error("{0}")]
    Configuration(String),
}

impl ReconcileError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    pub fn transport_with(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            source: None,
        }
    }

    pub fn protocol_with(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Protocol {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Stable category name, used in failure outcomes
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "remote_transport",
            Self::Protocol { .. } => "remote_protocol",
            Self::NotFound(_) => "resource_not_found",
            Self::Timeout(_) => "timeout",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Renders the chain of underlying causes, if any
    pub fn cause(&self) -> Option<String> {
        let mut source = std::error::Error::source(self);
        let mut chain = Vec::new();
        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }
        if chain.is_empty() {
            None
        } else {
            Some(chain.join(": "))
        }
    }
}

impl From<serde_json::Error> for ReconcileError {
    fn from(err: serde_json::Error) -> Self {
        Self::protocol_with(format!("API returned incorrect JSON: {}", err), err)
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ReconcileError::transport("x").kind(), "remote_transport");
        assert_eq!(ReconcileError::protocol("x").kind(), "remote_protocol");
        assert_eq!(
            ReconcileError::NotFound("x".into()).kind(),
            "resource_not_found"
        );
        assert_eq!(ReconcileError::Timeout("x".into()).kind(), "timeout");
        assert_eq!(
            ReconcileError::Configuration("x".into()).kind(),
            "configuration"
        );
    }

    #[test]
    fn test_cause_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ReconcileError::transport_with("Could not create component", io);
        assert_eq!(err.to_string(), "Could not create component");
        assert_eq!(err.cause().as_deref(), Some("refused"));

        assert!(ReconcileError::NotFound("gone".into()).cause().is_none());
    }

    #[test]
    fn test_json_error_is_protocol() {
        let err: ReconcileError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), "remote_protocol");
        assert!(err.to_string().starts_with("API returned incorrect JSON"));
    }
}
