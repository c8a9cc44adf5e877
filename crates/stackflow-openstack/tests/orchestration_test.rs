//! Stack output adapter against a mock Heat

mod common;

use serde_json::json;
use stackflow_core::ReconcileError;
use stackflow_openstack::stack_outputs;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_stack_outputs_as_mapping() {
    let (server, session) = common::session().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/stacks/cluster", common::ORCHESTRATION_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stack": {
                "id": "s-1",
                "stack_name": "cluster",
                "outputs": [
                    { "output_key": "master_ip", "output_value": "10.0.0.5" },
                    { "output_key": "node_ips", "output_value": ["10.0.0.6", "10.0.0.7"] }
                ]
            }
        })))
        .mount(&server)
        .await;

    let outcome = stack_outputs(&session, "cluster").await.unwrap();

    assert!(!outcome.changed);
    assert_eq!(
        outcome.fact("stack_outputs"),
        Some(&json!({ "master_ip": "10.0.0.5", "node_ips": ["10.0.0.6", "10.0.0.7"] }))
    );
}

#[tokio::test]
async fn test_stack_outputs_follow_name_redirect() {
    let (server, session) = common::session().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/stacks/cluster", common::ORCHESTRATION_PATH)))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "Location",
            format!("{}{}/stacks/cluster/s-1", server.uri(), common::ORCHESTRATION_PATH),
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/stacks/cluster/s-1", common::ORCHESTRATION_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stack": { "outputs": [] }
        })))
        .mount(&server)
        .await;

    let outcome = stack_outputs(&session, "cluster").await.unwrap();

    assert_eq!(outcome.fact("stack_outputs"), Some(&json!({})));
}

#[tokio::test]
async fn test_missing_stack_is_not_found() {
    let (_server, session) = common::session().await;

    let err = stack_outputs(&session, "nope").await.unwrap_err();

    assert!(matches!(err, ReconcileError::NotFound(_)));
    assert_eq!(err.to_string(), "Stack nope not found.");
}

#[tokio::test]
async fn test_stack_name_is_escaped_in_path() {
    let (server, session) = common::session().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/stacks/team%2Fcluster", common::ORCHESTRATION_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stack": { "outputs": [{ "output_key": "k", "output_value": "v" }] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = stack_outputs(&session, "team/cluster").await.unwrap();

    assert_eq!(outcome.fact("stack_outputs"), Some(&json!({ "k": "v" })));
}
