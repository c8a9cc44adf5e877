//! Identity-broker (Keycloak) admin connection settings

use crate::error::{ConfigError, Result};
use std::time::Duration;

pub const DEFAULT_AUTH_REALM: &str = "master";
pub const DEFAULT_CLIENT_ID: &str = "admin-cli";

/// How the admin token is obtained
#[derive(Debug, Clone, PartialEq)]
pub enum KeycloakCredentials {
    /// Pre-issued bearer token, used as is
    Token(String),
    /// Resource-owner password grant
    Password {
        username: String,
        password: String,
        client_secret: Option<String>,
    },
    /// Client credentials grant
    ClientSecret(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeycloakConfig {
    /// Base URL, e.g. `https://sso.example.com/auth`
    pub url: String,
    pub auth_realm: String,
    pub client_id: String,
    pub credentials: KeycloakCredentials,
    pub validate_certs: bool,
    pub timeout: Duration,
}

/// Raw settings as supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct KeycloakOptions {
    pub auth_keycloak_url: Option<String>,
    pub auth_realm: Option<String>,
    pub auth_client_id: Option<String>,
    pub auth_client_secret: Option<String>,
    pub auth_username: Option<String>,
    pub auth_password: Option<String>,
    pub token: Option<String>,
    pub validate_certs: Option<bool>,
    pub timeout: Option<u64>,
}

impl KeycloakOptions {
    pub fn resolve(self) -> Result<KeycloakConfig> {
        let url = self
            .auth_keycloak_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConfigError::Missing("auth_keycloak_url".to_string()))?;

        let credentials = match (self.token, self.auth_username, self.auth_client_secret) {
            (Some(token), _, _) => KeycloakCredentials::Token(token),
            (None, Some(username), client_secret) => KeycloakCredentials::Password {
                username,
                password: self
                    .auth_password
                    .ok_or_else(|| ConfigError::Missing("auth_password".to_string()))?,
                client_secret,
            },
            (None, None, Some(secret)) => KeycloakCredentials::ClientSecret(secret),
            (None, None, None) => {
                return Err(ConfigError::Missing(
                    "one of token, auth_username or auth_client_secret".to_string(),
                ));
            }
        };

        Ok(KeycloakConfig {
            url: url.trim_end_matches('/').to_string(),
            auth_realm: self
                .auth_realm
                .unwrap_or_else(|| DEFAULT_AUTH_REALM.to_string()),
            client_id: self
                .auth_client_id
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            credentials,
            validate_certs: self.validate_certs.unwrap_or(true),
            timeout: Duration::from_secs(self.timeout.unwrap_or(30)),
        })
    }
}
