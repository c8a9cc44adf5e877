//! OpenStack connection settings
//!
//! Credentials come from one of three places, picked by [`AuthType`]:
//! `OS_*` environment variables (or the `clouds.yaml` entry named by
//! `OS_CLOUD`), a named `clouds.yaml` entry, or an explicit auth mapping.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_INTERFACE: &str = "public";
const DEFAULT_DOMAIN_ID: &str = "default";
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Where credentials are taken from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthType {
    #[default]
    Environment,
    Cloud,
    Password,
}

impl FromStr for AuthType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "environment" => Ok(AuthType::Environment),
            "cloud" => Ok(AuthType::Cloud),
            "password" => Ok(AuthType::Password),
            other => Err(ConfigError::InvalidAuthType(other.to_string())),
        }
    }
}

impl std::fmt::Display for AuthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthType::Environment => write!(f, "environment"),
            AuthType::Cloud => write!(f, "cloud"),
            AuthType::Password => write!(f, "password"),
        }
    }
}

/// The `auth` section of a cloud entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuthSettings {
    pub auth_url: Option<String>,
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub password: Option<String>,
    pub project_name: Option<String>,
    pub project_id: Option<String>,
    pub user_domain_name: Option<String>,
    pub user_domain_id: Option<String>,
    pub project_domain_name: Option<String>,
    pub project_domain_id: Option<String>,
    pub application_credential_id: Option<String>,
    pub application_credential_secret: Option<String>,
}

/// One entry under `clouds:` in `clouds.yaml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CloudEntry {
    #[serde(default)]
    pub auth: AuthSettings,
    pub auth_type: Option<String>,
    pub region_name: Option<String>,
    pub interface: Option<String>,
    pub verify: Option<bool>,
    pub api_timeout: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CloudsFile {
    #[serde(default)]
    clouds: HashMap<String, CloudEntry>,
}

/// Keystone password credentials
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordAuth {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub user_domain_id: Option<String>,
    pub user_domain_name: Option<String>,
    pub password: String,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub project_domain_id: Option<String>,
    pub project_domain_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Credentials {
    Password(PasswordAuth),
    ApplicationCredential { id: String, secret: String },
}

/// Fully resolved connection settings for one cloud
#[derive(Debug, Clone, PartialEq)]
pub struct CloudConfig {
    pub auth_url: String,
    pub credentials: Credentials,
    pub region_name: Option<String>,
    pub interface: String,
    pub verify: bool,
    pub api_timeout: Duration,
}

/// Caller-facing selection of a cloud plus per-invocation overrides
#[derive(Debug, Clone, Default)]
pub struct CloudOptions {
    pub auth_type: AuthType,
    pub cloud: Option<String>,
    pub auth: Option<serde_json::Value>,
    pub region_name: Option<String>,
    pub interface: Option<String>,
    pub validate_certs: Option<bool>,
    pub api_timeout: Option<u64>,
}

impl CloudOptions {
    pub fn resolve(&self) -> Result<CloudConfig> {
        let mut entry = match self.auth_type {
            AuthType::Environment => match env_var("OS_CLOUD") {
                Some(name) => load_cloud(&name)?,
                None => CloudEntry::from_vars(env_var),
            },
            AuthType::Cloud => {
                let name = self
                    .cloud
                    .as_deref()
                    .ok_or_else(|| ConfigError::Missing("cloud".to_string()))?;
                load_cloud(name)?
            }
            AuthType::Password => {
                let auth = self
                    .auth
                    .clone()
                    .ok_or_else(|| ConfigError::Missing("auth".to_string()))?;
                CloudEntry {
                    auth: serde_json::from_value(auth)?,
                    ..Default::default()
                }
            }
        };

        if self.region_name.is_some() {
            entry.region_name = self.region_name.clone();
        }
        if self.interface.is_some() {
            entry.interface = self.interface.clone();
        }
        if self.validate_certs.is_some() {
            entry.verify = self.validate_certs;
        }
        if self.api_timeout.is_some() {
            entry.api_timeout = self.api_timeout;
        }

        entry.into_config()
    }
}

impl CloudEntry {
    /// Build an entry from `OS_*` variables supplied by `lookup`
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let auth = AuthSettings {
            auth_url: lookup("OS_AUTH_URL"),
            username: lookup("OS_USERNAME"),
            user_id: lookup("OS_USER_ID"),
            password: lookup("OS_PASSWORD"),
            project_name: lookup("OS_PROJECT_NAME").or_else(|| lookup("OS_TENANT_NAME")),
            project_id: lookup("OS_PROJECT_ID").or_else(|| lookup("OS_TENANT_ID")),
            user_domain_name: lookup("OS_USER_DOMAIN_NAME"),
            user_domain_id: lookup("OS_USER_DOMAIN_ID"),
            project_domain_name: lookup("OS_PROJECT_DOMAIN_NAME"),
            project_domain_id: lookup("OS_PROJECT_DOMAIN_ID"),
            application_credential_id: lookup("OS_APPLICATION_CREDENTIAL_ID"),
            application_credential_secret: lookup("OS_APPLICATION_CREDENTIAL_SECRET"),
        };

        Self {
            auth,
            auth_type: lookup("OS_AUTH_TYPE"),
            region_name: lookup("OS_REGION_NAME"),
            interface: lookup("OS_INTERFACE").or_else(|| lookup("OS_ENDPOINT_TYPE")),
            verify: lookup("OS_INSECURE").map(|v| !matches!(v.as_str(), "1" | "true" | "True")),
            api_timeout: None,
        }
    }

    /// Validate and resolve into connection settings
    pub fn into_config(self) -> Result<CloudConfig> {
        let auth = self.auth;
        let auth_url = auth
            .auth_url
            .ok_or_else(|| ConfigError::Missing("auth_url".to_string()))?;

        let use_app_credential = match self.auth_type.as_deref() {
            Some("v3applicationcredential") => true,
            Some("password") | Some("v3password") => false,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    field: "auth_type".to_string(),
                    reason: format!("unsupported Keystone auth plugin '{}'", other),
                });
            }
            None => auth.application_credential_id.is_some(),
        };

        let credentials = if use_app_credential {
            Credentials::ApplicationCredential {
                id: auth
                    .application_credential_id
                    .ok_or_else(|| ConfigError::Missing("application_credential_id".to_string()))?,
                secret: auth.application_credential_secret.ok_or_else(|| {
                    ConfigError::Missing("application_credential_secret".to_string())
                })?,
            }
        } else {
            if auth.user_id.is_none() && auth.username.is_none() {
                return Err(ConfigError::Missing("username".to_string()));
            }
            if auth.project_id.is_none() && auth.project_name.is_none() {
                return Err(ConfigError::Missing("project_name".to_string()));
            }
            let password = auth
                .password
                .ok_or_else(|| ConfigError::Missing("password".to_string()))?;

            // Names need a domain; fall back to the default domain
            let user_domain_id = match (&auth.user_domain_id, &auth.user_domain_name) {
                (None, None) if auth.user_id.is_none() => Some(DEFAULT_DOMAIN_ID.to_string()),
                (id, _) => id.clone(),
            };
            let project_domain_id = match (&auth.project_domain_id, &auth.project_domain_name) {
                (None, None) if auth.project_id.is_none() => Some(DEFAULT_DOMAIN_ID.to_string()),
                (id, _) => id.clone(),
            };

            Credentials::Password(PasswordAuth {
                user_id: auth.user_id,
                username: auth.username,
                user_domain_id,
                user_domain_name: auth.user_domain_name,
                password,
                project_id: auth.project_id,
                project_name: auth.project_name,
                project_domain_id,
                project_domain_name: auth.project_domain_name,
            })
        };

        Ok(CloudConfig {
            auth_url,
            credentials,
            region_name: self.region_name,
            interface: self
                .interface
                .unwrap_or_else(|| DEFAULT_INTERFACE.to_string()),
            verify: self.verify.unwrap_or(true),
            api_timeout: Duration::from_secs(self.api_timeout.unwrap_or(DEFAULT_API_TIMEOUT_SECS)),
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Locate `clouds.yaml`
///
/// Search order:
/// 1. `OS_CLIENT_CONFIG_FILE`
/// 2. `./clouds.yaml`
/// 3. `<config dir>/openstack/clouds.yaml` (e.g. `~/.config/openstack`)
/// 4. `/etc/openstack/clouds.yaml`
pub fn find_clouds_file() -> Result<PathBuf> {
    if let Some(path) = env_var("OS_CLIENT_CONFIG_FILE") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
    }

    let local = std::env::current_dir()?.join("clouds.yaml");
    if local.exists() {
        return Ok(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join("openstack").join("clouds.yaml");
        if user.exists() {
            return Ok(user);
        }
    }

    let system = PathBuf::from("/etc/openstack/clouds.yaml");
    if system.exists() {
        return Ok(system);
    }

    Err(ConfigError::CloudsFileNotFound)
}

/// Read the named entry from the discovered `clouds.yaml`
pub fn load_cloud(name: &str) -> Result<CloudEntry> {
    let path = find_clouds_file()?;
    load_cloud_from(&path, name)
}

/// Read the named entry from a specific `clouds.yaml`
pub fn load_cloud_from(path: &Path, name: &str) -> Result<CloudEntry> {
    tracing::debug!("Loading cloud '{}' from {}", name, path.display());
    let content = std::fs::read_to_string(path)?;
    let mut file: CloudsFile =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

    file.clouds
        .remove(name)
        .ok_or_else(|| ConfigError::CloudNotFound(name.to_string(), path.display().to_string()))
}
