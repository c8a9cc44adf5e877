//! Keystone trusts

use crate::error::OpenStackError;
use crate::session::Session;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use stackflow_core::Outcome;
use std::str::FromStr;

/// Role to delegate, referenced by id or by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleRef {
    Id(String),
    Name(String),
}

impl FromStr for RoleRef {
    type Err = OpenStackError;

    /// A plain string is a role name; `{"id": ...}` or `{"name": ...}` is
    /// taken literally
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(OpenStackError::InvalidParameter(
                "role must not be empty".to_string(),
            ));
        }
        if !trimmed.starts_with('{') {
            return Ok(RoleRef::Name(trimmed.to_string()));
        }

        let value: Value = serde_json::from_str(trimmed).map_err(|e| {
            OpenStackError::InvalidParameter(format!("invalid role '{}': {}", s, e))
        })?;
        let id = value.get("id").and_then(Value::as_str);
        let name = value.get("name").and_then(Value::as_str);
        match (id, name) {
            (Some(id), _) => Ok(RoleRef::Id(id.to_string())),
            (None, Some(name)) => Ok(RoleRef::Name(name.to_string())),
            (None, None) => Err(OpenStackError::InvalidParameter(format!(
                "role '{}' must have an 'id' or a 'name'",
                s
            ))),
        }
    }
}

/// Parameters of the trust adapter
#[derive(Debug, Clone)]
pub struct TrustRequest {
    pub trustee_user_id: String,
    pub roles: Vec<RoleRef>,
    pub impersonation: bool,
}

impl TrustRequest {
    pub fn new(trustee_user_id: impl Into<String>, roles: Vec<RoleRef>) -> Self {
        Self {
            trustee_user_id: trustee_user_id.into(),
            roles,
            impersonation: true,
        }
    }

    fn validate(&self) -> crate::Result<()> {
        if self.trustee_user_id.is_empty() {
            return Err(OpenStackError::InvalidParameter(
                "trustee_user_id is required".to_string(),
            ));
        }
        if self.roles.is_empty() {
            return Err(OpenStackError::InvalidParameter(
                "at least one role is required".to_string(),
            ));
        }
        Ok(())
    }

    fn body(&self, trustor_user_id: &str, project_id: &str) -> Value {
        json!({
            "trust": {
                "trustor_user_id": trustor_user_id,
                "trustee_user_id": self.trustee_user_id,
                "project_id": project_id,
                "impersonation": self.impersonation,
                "roles": self.roles,
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct TrustBody {
    trust: Trust,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Trust {
    pub id: String,
}

/// Delegate roles on the session's project to the trustee
///
/// Trusts are not looked up first; every call creates one.
///
/// Facts: `trust_id`, `trustor_user_id`, `project_id`.
pub async fn create_trust(
    session: &Session,
    request: &TrustRequest,
    dry_run: bool,
) -> stackflow_core::Result<Outcome> {
    request.validate()?;

    let trustor = session.user_id();
    let project_id = session.project_id();
    let outcome = Outcome::success(true)
        .with_fact("trustor_user_id", trustor)
        .with_fact("project_id", project_id);

    if dry_run {
        tracing::warn!("Dry run: skipping trust creation for {}", request.trustee_user_id);
        return Ok(outcome);
    }

    let url = format!("{}/OS-TRUST/trusts", session.identity_url());
    let http = session
        .request(Method::POST, &url)
        .json(&request.body(trustor, project_id));
    let body: TrustBody = session.send_json(http, "Could not create trust").await?;

    tracing::info!("Created trust {} for {}", body.trust.id, request.trustee_user_id);
    Ok(outcome.with_fact("trust_id", body.trust.id))
}
