//! Keycloak admin API session
//!
//! Holds an HTTP client and an admin bearer token. Constructed once per
//! invocation and passed explicitly to every adapter.

use crate::error::{KeycloakError, Result};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use stackflow_config::{KeycloakConfig, KeycloakCredentials};

/// Authenticated Keycloak admin session
pub struct KeycloakApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl KeycloakApi {
    /// Build the HTTP client and obtain an admin token
    pub async fn connect(config: &KeycloakConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.validate_certs)
            .build()
            .map_err(|source| KeycloakError::Request {
                action: "Could not build HTTP client".to_string(),
                source,
            })?;

        let token = match &config.credentials {
            KeycloakCredentials::Token(token) => token.clone(),
            credentials => fetch_token(&client, config, credentials).await?,
        };

        Ok(Self {
            client,
            base_url: config.url.clone(),
            token,
        })
    }

    /// Session with an already issued token
    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL below the base URL, one escaped path segment per element
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let invalid = || KeycloakError::InvalidUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Authorized request
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
    }

    /// Send a request, mapping failures and non-2xx statuses to errors
    /// prefixed with `action`
    pub async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|source| KeycloakError::Request {
                action: action.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KeycloakError::Status {
                action: action.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Send a request and decode its JSON body
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<T> {
        let response = self.send(request, action).await?;
        let body = response
            .bytes()
            .await
            .map_err(|source| KeycloakError::Request {
                action: action.to_string(),
                source,
            })?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

async fn fetch_token(
    client: &reqwest::Client,
    config: &KeycloakConfig,
    credentials: &KeycloakCredentials,
) -> Result<String> {
    let url = format!(
        "{}/realms/{}/protocol/openid-connect/token",
        config.url, config.auth_realm
    );

    let mut form: Vec<(&str, &str)> = vec![("client_id", config.client_id.as_str())];
    match credentials {
        KeycloakCredentials::Password {
            username,
            password,
            client_secret,
        } => {
            form.push(("grant_type", "password"));
            form.push(("username", username.as_str()));
            form.push(("password", password.as_str()));
            if let Some(secret) = client_secret {
                form.push(("client_secret", secret.as_str()));
            }
        }
        KeycloakCredentials::ClientSecret(secret) => {
            form.push(("grant_type", "client_credentials"));
            form.push(("client_secret", secret.as_str()));
        }
        KeycloakCredentials::Token(token) => return Ok(token.clone()),
    }

    tracing::debug!("POST {} (client_id={})", url, config.client_id);
    let response = client
        .post(&url)
        .form(&form)
        .send()
        .await
        .map_err(|e| KeycloakError::Token(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(KeycloakError::Token(format!("HTTP {}: {}", status.as_u16(), body)));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| KeycloakError::Token(e.to_string()))?;
    Ok(token.access_token)
}
