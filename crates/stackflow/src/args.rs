//! Connection flags shared by the subcommands

use clap::{ArgAction, Args};
use stackflow_config::{AuthType, CloudOptions, KeycloakOptions};
use stackflow_core::ReconcileError;
use stackflow_keycloak::KeycloakApi;
use stackflow_openstack::Session;

/// OpenStack connection
#[derive(Args, Debug, Clone)]
pub struct CloudArgs {
    /// How credentials are found: environment, cloud or password
    #[arg(long, default_value = "environment")]
    pub auth_type: String,

    /// Entry of clouds.yaml (with --auth-type cloud)
    #[arg(long)]
    pub cloud: Option<String>,

    /// Auth mapping as JSON (with --auth-type password)
    #[arg(long)]
    pub auth: Option<String>,

    #[arg(long = "region")]
    pub region_name: Option<String>,

    /// Endpoint interface (public, internal, admin)
    #[arg(long)]
    pub interface: Option<String>,

    #[arg(long, action = ArgAction::Set)]
    pub validate_certs: Option<bool>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub api_timeout: Option<u64>,
}

impl CloudArgs {
    pub fn options(&self) -> stackflow_core::Result<CloudOptions> {
        let auth_type: AuthType = self
            .auth_type
            .parse()
            .map_err(ReconcileError::from)?;
        let auth: Option<serde_json::Value> = self
            .auth
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| ReconcileError::Configuration(format!("invalid --auth JSON: {}", e)))?;

        Ok(CloudOptions {
            auth_type,
            cloud: self.cloud.clone(),
            auth,
            region_name: self.region_name.clone(),
            interface: self.interface.clone(),
            validate_certs: self.validate_certs,
            api_timeout: self.api_timeout,
        })
    }

    /// Resolve credentials and authenticate
    pub async fn connect(&self) -> stackflow_core::Result<Session> {
        let config = self.options()?.resolve()?;
        Ok(Session::authenticate(&config).await?)
    }
}

/// Keycloak admin connection
#[derive(Args, Debug, Clone)]
pub struct KeycloakArgs {
    /// Base URL of the Keycloak server
    #[arg(long, env = "KEYCLOAK_URL")]
    pub auth_keycloak_url: Option<String>,

    /// Realm the admin user authenticates against
    #[arg(long, env = "KEYCLOAK_REALM")]
    pub auth_realm: Option<String>,

    #[arg(long, env = "KEYCLOAK_CLIENT_ID")]
    pub auth_client_id: Option<String>,

    #[arg(long, env = "KEYCLOAK_CLIENT_SECRET", hide_env_values = true)]
    pub auth_client_secret: Option<String>,

    #[arg(long, env = "KEYCLOAK_USERNAME")]
    pub auth_username: Option<String>,

    #[arg(long, env = "KEYCLOAK_PASSWORD", hide_env_values = true)]
    pub auth_password: Option<String>,

    /// Pre-issued bearer token; skips the token grant
    #[arg(long, env = "KEYCLOAK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(long, env = "KEYCLOAK_VALIDATE_CERTS", action = ArgAction::Set)]
    pub validate_certs: Option<bool>,

    /// Request timeout in seconds
    #[arg(long, env = "KEYCLOAK_TIMEOUT")]
    pub timeout: Option<u64>,
}

impl KeycloakArgs {
    pub fn options(&self) -> KeycloakOptions {
        KeycloakOptions {
            auth_keycloak_url: self.auth_keycloak_url.clone(),
            auth_realm: self.auth_realm.clone(),
            auth_client_id: self.auth_client_id.clone(),
            auth_client_secret: self.auth_client_secret.clone(),
            auth_username: self.auth_username.clone(),
            auth_password: self.auth_password.clone(),
            token: self.token.clone(),
            validate_certs: self.validate_certs,
            timeout: self.timeout,
        }
    }

    pub async fn connect(&self) -> stackflow_core::Result<KeycloakApi> {
        let config = self.options().resolve()?;
        Ok(KeycloakApi::connect(&config).await?)
    }
}
