//! Mock Keystone shared by the adapter tests

#![allow(dead_code)]

use serde_json::{Value, json};
use stackflow_config::{CloudConfig, Credentials, PasswordAuth};
use stackflow_openstack::Session;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER_ID: &str = "u-trustor";
pub const PROJECT_ID: &str = "p-demo";

pub const ORCHESTRATION_PATH: &str = "/heat/v1/p-demo";
pub const VOLUME_PATH: &str = "/volume/v3/p-demo";
pub const IMAGE_PATH: &str = "/image";

fn endpoint(uri: &str, suffix: &str) -> Value {
    json!([{
        "interface": "public",
        "region_id": "RegionOne",
        "region": "RegionOne",
        "url": format!("{}{}", uri, suffix)
    }])
}

pub fn catalog(uri: &str) -> Value {
    json!([
        { "type": "identity", "endpoints": endpoint(uri, "/v3") },
        { "type": "network", "endpoints": endpoint(uri, "") },
        { "type": "orchestration", "endpoints": endpoint(uri, ORCHESTRATION_PATH) },
        { "type": "volumev3", "endpoints": endpoint(uri, VOLUME_PATH) },
        { "type": "image", "endpoints": endpoint(uri, IMAGE_PATH) }
    ])
}

pub fn cloud_config(uri: &str) -> CloudConfig {
    CloudConfig {
        auth_url: format!("{}/v3", uri),
        credentials: Credentials::Password(PasswordAuth {
            user_id: None,
            username: Some("demo".to_string()),
            user_domain_id: None,
            user_domain_name: Some("Default".to_string()),
            password: "secret".to_string(),
            project_id: None,
            project_name: Some("demo".to_string()),
            project_domain_id: None,
            project_domain_name: Some("Default".to_string()),
        }),
        region_name: Some("RegionOne".to_string()),
        interface: "public".to_string(),
        verify: true,
        api_timeout: Duration::from_secs(5),
    }
}

pub async fn mount_keystone(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v3/auth/tokens"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Subject-Token", "gAAAA-token")
                .set_body_json(json!({
                    "token": {
                        "user": { "id": USER_ID, "name": "demo" },
                        "project": { "id": PROJECT_ID, "name": "demo" },
                        "catalog": catalog(&server.uri())
                    }
                })),
        )
        .mount(server)
        .await;
}

/// Mock server with Keystone mounted, plus an authenticated session
pub async fn session() -> (MockServer, Session) {
    let server = MockServer::start().await;
    mount_keystone(&server).await;
    let session = Session::authenticate(&cloud_config(&server.uri()))
        .await
        .unwrap();
    (server, session)
}
