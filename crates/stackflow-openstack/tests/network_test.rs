//! Floating IP adapters against a mock Neutron

mod common;

use serde_json::{Value, json};
use stackflow_core::ReconcileError;
use stackflow_openstack::{FipRequest, find_fip, free_fip};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NETWORK_ID: &str = "net-ext";

fn fip(id: &str, address: &str, port_id: Option<&str>) -> Value {
    json!({
        "id": id,
        "floating_ip_address": address,
        "floating_network_id": NETWORK_ID,
        "port_id": port_id,
        "project_id": common::PROJECT_ID,
        "status": if port_id.is_some() { "ACTIVE" } else { "DOWN" }
    })
}

fn request(ip: Option<&str>) -> FipRequest {
    FipRequest {
        floating_network: "public".to_string(),
        ip: ip.map(str::to_string),
    }
}

async fn mount_network_by_name(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2.0/networks/public"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2.0/networks"))
        .and(query_param("name", "public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "networks": [{ "id": NETWORK_ID, "name": "public" }]
        })))
        .mount(server)
        .await;
}

async fn mount_project_fips(server: &MockServer, fips: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/v2.0/floatingips"))
        .and(query_param("floating_network_id", NETWORK_ID))
        .and(query_param("project_id", common::PROJECT_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "floatingips": fips })))
        .mount(server)
        .await;
}

async fn mount_fip_by_address(server: &MockServer, address: &str, fips: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/v2.0/floatingips"))
        .and(query_param("floating_ip_address", address))
        .and(query_param("floating_network_id", NETWORK_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "floatingips": fips })))
        .mount(server)
        .await;
}

async fn expect_no_mutation(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2.0/floatingips"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_find_fip_reuses_idle_address() {
    let (server, session) = common::session().await;
    mount_network_by_name(&server).await;
    mount_project_fips(
        &server,
        vec![
            fip("fip-busy", "203.0.113.1", Some("port-1")),
            fip("fip-idle", "203.0.113.2", None),
        ],
    )
    .await;
    expect_no_mutation(&server).await;

    let outcome = find_fip(&session, &request(None), false).await.unwrap();

    assert!(!outcome.changed);
    assert_eq!(outcome.fact("fip_id"), Some(&json!("fip-idle")));
    assert_eq!(outcome.fact("fip_ip"), Some(&json!("203.0.113.2")));
}

#[tokio::test]
async fn test_find_fip_allocates_when_none_idle() {
    let (server, session) = common::session().await;
    mount_network_by_name(&server).await;
    mount_project_fips(&server, vec![fip("fip-busy", "203.0.113.1", Some("port-1"))]).await;

    Mock::given(method("POST"))
        .and(path("/v2.0/floatingips"))
        .and(header("X-Auth-Token", "gAAAA-token"))
        .and(body_json(json!({ "floatingip": { "floating_network_id": NETWORK_ID } })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "floatingip": fip("fip-new", "203.0.113.3", None) })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = find_fip(&session, &request(None), false).await.unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.fact("fip_id"), Some(&json!("fip-new")));
}

#[tokio::test]
async fn test_find_fip_dry_run_skips_allocation() {
    let (server, session) = common::session().await;
    mount_network_by_name(&server).await;
    mount_project_fips(&server, vec![]).await;
    expect_no_mutation(&server).await;

    let outcome = find_fip(&session, &request(None), true).await.unwrap();

    assert!(outcome.changed);
    assert!(outcome.fact("fip_id").is_none());
}

#[tokio::test]
async fn test_find_fip_specific_address_is_looked_up_only() {
    let (server, session) = common::session().await;
    mount_network_by_name(&server).await;
    mount_fip_by_address(
        &server,
        "203.0.113.1",
        vec![fip("fip-busy", "203.0.113.1", Some("port-1"))],
    )
    .await;
    expect_no_mutation(&server).await;

    let outcome = find_fip(&session, &request(Some("203.0.113.1")), false)
        .await
        .unwrap();

    assert!(!outcome.changed);
    assert_eq!(outcome.fact("fip_id"), Some(&json!("fip-busy")));
}

#[tokio::test]
async fn test_find_fip_missing_address_is_not_created() {
    let (server, session) = common::session().await;
    mount_network_by_name(&server).await;
    mount_fip_by_address(&server, "203.0.113.9", vec![]).await;
    expect_no_mutation(&server).await;

    let err = find_fip(&session, &request(Some("203.0.113.9")), false)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::NotFound(_)));
    assert_eq!(
        err.to_string(),
        "Floating IP 203.0.113.9 not found on network public."
    );
}

#[tokio::test]
async fn test_unknown_network_is_not_found() {
    let (server, session) = common::session().await;

    Mock::given(method("GET"))
        .and(path("/v2.0/networks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "networks": [] })))
        .mount(&server)
        .await;

    let err = find_fip(&session, &request(None), false).await.unwrap_err();

    assert!(matches!(err, ReconcileError::NotFound(_)));
    assert_eq!(err.kind(), "resource_not_found");
}

#[tokio::test]
async fn test_network_found_by_id() {
    let (server, session) = common::session().await;

    Mock::given(method("GET"))
        .and(path(format!("/v2.0/networks/{}", NETWORK_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "network": { "id": NETWORK_ID, "name": "public" }
        })))
        .mount(&server)
        .await;
    mount_project_fips(&server, vec![fip("fip-idle", "203.0.113.2", None)]).await;

    let request = FipRequest {
        floating_network: NETWORK_ID.to_string(),
        ip: None,
    };
    let outcome = find_fip(&session, &request, false).await.unwrap();

    assert_eq!(outcome.fact("fip_id"), Some(&json!("fip-idle")));
}

#[tokio::test]
async fn test_free_fip_detaches_attached_address() {
    let (server, session) = common::session().await;
    mount_network_by_name(&server).await;
    mount_fip_by_address(
        &server,
        "203.0.113.1",
        vec![fip("fip-busy", "203.0.113.1", Some("port-1"))],
    )
    .await;

    Mock::given(method("PUT"))
        .and(path("/v2.0/floatingips/fip-busy"))
        .and(body_json(json!({ "floatingip": { "port_id": null } })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "floatingip": fip("fip-busy", "203.0.113.1", None) })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = free_fip(&session, &request(Some("203.0.113.1")), false)
        .await
        .unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.fact("fip_id"), Some(&json!("fip-busy")));
    assert_eq!(outcome.fact("fip_ip"), Some(&json!("203.0.113.1")));
}

#[tokio::test]
async fn test_free_fip_leaves_detached_address_alone() {
    let (server, session) = common::session().await;
    mount_network_by_name(&server).await;
    mount_fip_by_address(&server, "203.0.113.2", vec![fip("fip-idle", "203.0.113.2", None)]).await;
    expect_no_mutation(&server).await;

    let outcome = free_fip(&session, &request(Some("203.0.113.2")), false)
        .await
        .unwrap();

    assert!(!outcome.changed);
}

#[tokio::test]
async fn test_free_fip_dry_run_skips_detach() {
    let (server, session) = common::session().await;
    mount_network_by_name(&server).await;
    mount_fip_by_address(
        &server,
        "203.0.113.1",
        vec![fip("fip-busy", "203.0.113.1", Some("port-1"))],
    )
    .await;
    expect_no_mutation(&server).await;

    let outcome = free_fip(&session, &request(Some("203.0.113.1")), true)
        .await
        .unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.fact("fip_id"), Some(&json!("fip-busy")));
}

#[tokio::test]
async fn test_free_fip_missing_address_fails() {
    let (server, session) = common::session().await;
    mount_network_by_name(&server).await;
    mount_fip_by_address(&server, "203.0.113.9", vec![]).await;
    expect_no_mutation(&server).await;

    let err = free_fip(&session, &request(Some("203.0.113.9")), false)
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::NotFound(_)));
}

#[tokio::test]
async fn test_neutron_error_is_transport_failure() {
    let (server, session) = common::session().await;
    mount_network_by_name(&server).await;

    Mock::given(method("GET"))
        .and(path("/v2.0/floatingips"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = find_fip(&session, &request(None), false).await.unwrap_err();

    assert_eq!(err.kind(), "remote_transport");
    assert_eq!(
        err.to_string(),
        "Could not list floating IPs: HTTP 503: maintenance"
    );
}

#[tokio::test]
async fn test_network_name_is_escaped_in_path() {
    let (server, session) = common::session().await;

    Mock::given(method("GET"))
        .and(path("/v2.0/networks/ext%2Fnet"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2.0/networks"))
        .and(query_param("name", "ext/net"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "networks": [{ "id": NETWORK_ID, "name": "ext/net" }]
        })))
        .mount(&server)
        .await;
    mount_project_fips(&server, vec![fip("fip-idle", "203.0.113.2", None)]).await;

    let request = FipRequest {
        floating_network: "ext/net".to_string(),
        ip: None,
    };
    let outcome = find_fip(&session, &request, false).await.unwrap();

    assert_eq!(outcome.fact("fip_id"), Some(&json!("fip-idle")));
}
