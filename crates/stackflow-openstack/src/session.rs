//! Keystone session and service catalog
//!
//! One project-scoped token per invocation. Every service client borrows
//! the session for its HTTP client, token and endpoints.

use crate::error::{OpenStackError, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use stackflow_config::{CloudConfig, Credentials, PasswordAuth};

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Catalog service types, with the aliases some deployments still use
pub mod service {
    pub const NETWORK: &[&str] = &["network"];
    pub const IDENTITY: &[&str] = &["identity"];
    pub const ORCHESTRATION: &[&str] = &["orchestration"];
    pub const BLOCK_STORAGE: &[&str] = &["block-storage", "volumev3", "volumev2", "volume"];
    pub const IMAGE: &[&str] = &["image"];
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    pub interface: String,
    #[serde(default)]
    pub region_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    token: TokenInfo,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    user: IdRef,
    project: Option<IdRef>,
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: String,
}

/// Authenticated, project-scoped session
pub struct Session {
    client: reqwest::Client,
    token: String,
    user_id: String,
    project_id: String,
    catalog: Vec<CatalogEntry>,
    interface: String,
    region: Option<String>,
    identity_url: String,
}

impl Session {
    /// Request a project-scoped token from Keystone
    pub async fn authenticate(config: &CloudConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .danger_accept_invalid_certs(!config.verify)
            .build()
            .map_err(|source| OpenStackError::Request {
                action: "Could not build HTTP client".to_string(),
                source,
            })?;

        let identity_url = identity_v3_url(&config.auth_url);
        let url = format!("{}/auth/tokens", identity_url);
        tracing::debug!("POST {}", url);

        let response = client
            .post(&url)
            .json(&auth_body(&config.credentials))
            .send()
            .await
            .map_err(|source| OpenStackError::Request {
                action: "Could not authenticate".to_string(),
                source,
            })?;
        let response = check_status(response, "Could not authenticate").await?;

        let token = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| OpenStackError::MissingToken(format!("no {} header", SUBJECT_TOKEN_HEADER)))?;

        let body: TokenBody = decode(response, "Could not authenticate").await?;
        let project_id = body
            .token
            .project
            .map(|p| p.id)
            .ok_or_else(|| OpenStackError::MissingToken("token is not project scoped".to_string()))?;

        tracing::debug!(
            "Authenticated as user {} in project {}",
            body.token.user.id,
            project_id
        );

        Ok(Self {
            client,
            token,
            user_id: body.token.user.id,
            project_id,
            catalog: body.token.catalog,
            interface: config.interface.clone(),
            region: config.region_name.clone(),
            identity_url,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Identity v3 base URL, from the catalog when listed there
    pub fn identity_url(&self) -> String {
        self.endpoint(service::IDENTITY)
            .map(|url| identity_v3_url(&url))
            .unwrap_or_else(|_| self.identity_url.clone())
    }

    /// Endpoint URL for the first matching service type, honouring the
    /// configured interface and region
    pub fn endpoint(&self, service_types: &[&str]) -> Result<String> {
        let interface = self.interface.trim_end_matches("URL");
        service_types
            .iter()
            .filter_map(|service_type| {
                self.catalog
                    .iter()
                    .find(|entry| entry.service_type == *service_type)
            })
            .flat_map(|entry| entry.endpoints.iter())
            .find(|endpoint| {
                endpoint.interface == interface
                    && self.region.as_deref().is_none_or(|region| {
                        endpoint.region_id.as_deref() == Some(region)
                            || endpoint.region.as_deref() == Some(region)
                    })
            })
            .map(|endpoint| endpoint.url.trim_end_matches('/').to_string())
            .ok_or_else(|| OpenStackError::EndpointNotFound {
                service: service_types.first().copied().unwrap_or_default().to_string(),
                interface: interface.to_string(),
                region: self
                    .region
                    .as_deref()
                    .map(|r| format!(" in region {}", r))
                    .unwrap_or_default(),
            })
    }

    /// Authorized request against an absolute URL
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        tracing::debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .header(AUTH_TOKEN_HEADER, &self.token)
    }

    /// Send a request, mapping failures and non-2xx statuses to errors
    /// prefixed with `action`
    pub async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|source| OpenStackError::Request {
                action: action.to_string(),
                source,
            })?;
        check_status(response, action).await
    }

    /// Send a request and decode its JSON body
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<T> {
        let response = self.send(request, action).await?;
        decode(response, action).await
    }

    /// Like [`Session::send_json`], but a 404 yields `None`
    pub async fn send_json_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<Option<T>> {
        let response = request
            .send()
            .await
            .map_err(|source| OpenStackError::Request {
                action: action.to_string(),
                source,
            })?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response, action).await?;
        decode(response, action).await.map(Some)
    }
}

async fn check_status(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(OpenStackError::Status {
        action: action.to_string(),
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response, action: &str) -> Result<T> {
    let body = response
        .bytes()
        .await
        .map_err(|source| OpenStackError::Request {
            action: action.to_string(),
            source,
        })?;
    Ok(serde_json::from_slice(&body)?)
}

/// Normalize an identity URL to its `/v3` base
fn identity_v3_url(url: &str) -> String {
    let url = url.trim_end_matches('/');
    if url.ends_with("/v3") {
        url.to_string()
    } else {
        format!("{}/v3", url)
    }
}

/// `base` extended by one escaped path segment per element
pub(crate) fn join_url(base: &str, segments: &[&str]) -> Result<Url> {
    let invalid = || OpenStackError::InvalidUrl(base.to_string());
    let mut url = Url::parse(base).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Append a version suffix unless the catalog URL already carries it
pub(crate) fn versioned(url: &str, version: &str) -> String {
    let url = url.trim_end_matches('/');
    if url.ends_with(version) {
        url.to_string()
    } else {
        format!("{}{}", url, version)
    }
}

fn auth_body(credentials: &Credentials) -> Value {
    match credentials {
        Credentials::ApplicationCredential { id, secret } => json!({
            "auth": {
                "identity": {
                    "methods": ["application_credential"],
                    "application_credential": { "id": id, "secret": secret }
                }
            }
        }),
        Credentials::Password(auth) => json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": { "user": user_ref(auth) }
                },
                "scope": { "project": project_ref(auth) }
            }
        }),
    }
}

fn domain_ref(id: &Option<String>, name: &Option<String>) -> Value {
    match (id, name) {
        (Some(id), _) => json!({ "id": id }),
        (None, Some(name)) => json!({ "name": name }),
        (None, None) => Value::Null,
    }
}

fn user_ref(auth: &PasswordAuth) -> Value {
    match &auth.user_id {
        Some(id) => json!({ "id": id, "password": auth.password }),
        None => json!({
            "name": auth.username,
            "domain": domain_ref(&auth.user_domain_id, &auth.user_domain_name),
            "password": auth.password
        }),
    }
}

fn project_ref(auth: &PasswordAuth) -> Value {
    match &auth.project_id {
        Some(id) => json!({ "id": id }),
        None => json!({
            "name": auth.project_name,
            "domain": domain_ref(&auth.project_domain_id, &auth.project_domain_name)
        }),
    }
}
