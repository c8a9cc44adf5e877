//! Normalized result reported at the invocation boundary

use crate::error::{ReconcileError, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// `{changed, failed?, msg?, ...facts}` as one flat object
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Outcome {
    pub changed: bool,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,

    /// Error category, on failure only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Underlying cause chain, on failure only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,

    #[serde(flatten)]
    pub facts: Map<String, Value>,
}

impl Outcome {
    pub fn success(changed: bool) -> Self {
        Self {
            changed,
            ..Default::default()
        }
    }

    pub fn failure(err: &ReconcileError) -> Self {
        Self {
            changed: false,
            failed: true,
            msg: Some(err.to_string()),
            error: Some(err.kind().to_string()),
            cause: err.cause(),
            facts: Map::new(),
        }
    }

    /// Collapse an adapter result into a single outcome
    pub fn from_result(result: Result<Outcome>) -> Self {
        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!("{}", err);
                Self::failure(&err)
            }
        }
    }

    pub fn with_fact(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.facts.insert(key.into(), value.into());
        self
    }

    /// Add a fact only when a value is present
    pub fn with_opt_fact(self, key: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.with_fact(key, value),
            None => self,
        }
    }

    pub fn fact(&self, key: &str) -> Option<&Value> {
        self.facts.get(key)
    }

    pub fn exit_code(&self) -> i32 {
        if self.failed { 1 } else { 0 }
    }
}
