//! Cloud control-plane integration tests
//!
//! Realm provisioning and external-to-internal consumer resolution.

use crate::helpers::*;
use crate::mock_gateway::*;
use issuer_core::{GatewayError, GatewayMode};
use serde_json::json;

/// A missing realm is created before the first consumer call
#[tokio::test]
async fn test_realm_created_on_demand() {
    let mock = MockCloudApi::new().await;
    mock.mock_realm_check(404).await;
    mock.mock_realm_create(201, "{}").await;
    mock.mock_consumer("alice", "internal-alice").await;
    mock.mock_credentials("internal-alice", "alice-key", 1).await;

    let service = service(&cloud_config(&mock.control_plane_url()));
    assert_eq!(service.mode(), GatewayMode::Cloud);

    let secret = service.get_consumer_secret("alice").await.unwrap().unwrap();
    assert_eq!(secret.key, "alice-key");
    assert_eq!(secret.consumer_id(), Some("internal-alice"));
}

/// A realm created concurrently by another instance is not an error
#[tokio::test]
async fn test_realm_already_exists() {
    let mock = MockCloudApi::new().await;
    mock.mock_realm_check(404).await;
    mock.mock_realm_create(400, r#"{"message":"realm name must be unique"}"#)
        .await;
    mock.mock_consumer("bob", "internal-bob").await;
    mock.mock_credentials("internal-bob", "bob-key", 1).await;

    let service = service(&cloud_config(&mock.control_plane_url()));
    assert!(service.get_consumer_secret("bob").await.unwrap().is_some());
}

/// Any other realm creation failure is a configuration problem
#[tokio::test]
async fn test_realm_creation_forbidden() {
    let mock = MockCloudApi::new().await;
    mock.mock_realm_check(404).await;
    mock.mock_realm_create(403, r#"{"message":"forbidden"}"#).await;

    let service = service(&cloud_config(&mock.control_plane_url()));
    let error = service.get_consumer_secret("carol").await.unwrap_err();
    assert!(matches!(error, GatewayError::Configuration { .. }));
    assert!(error.to_string().contains(REALM_NAME));
}

/// An unavailable control plane fails the realm check
#[tokio::test]
async fn test_realm_check_unavailable() {
    let mock = MockCloudApi::new().await;
    mock.mock_realm_check(503).await;

    let service = service(&cloud_config(&mock.control_plane_url()));
    let error = service.get_consumer_secret("dave").await.unwrap_err();
    assert!(matches!(error, GatewayError::GatewayUnavailable { status: 503, .. }));
}

/// Consumers unknown by id are found by username
#[tokio::test]
async fn test_resolve_by_username() {
    let mock = MockCloudApi::new().await;
    mock.mock_realm_check(200).await;
    mock.mock_consumer_missing("erin").await;
    mock.mock_search(
        "erin",
        200,
        json!({"data": [{"id": "internal-erin", "username": "erin"}]}),
    )
    .await;
    mock.mock_credentials("internal-erin", "erin-key", 1).await;

    let service = service(&cloud_config(&mock.control_plane_url()));
    let secret = service.get_consumer_secret("erin").await.unwrap().unwrap();
    assert_eq!(secret.key, "erin-key");
}

/// A search hit with a different username is not a match
#[tokio::test]
async fn test_username_mismatch_is_none() {
    let mock = MockCloudApi::new().await;
    mock.mock_realm_check(200).await;
    mock.mock_consumer_missing("frank").await;
    mock.mock_search(
        "frank",
        200,
        json!({"data": [{"id": "internal-other", "username": "frankie"}]}),
    )
    .await;

    let service = service(&cloud_config(&mock.control_plane_url()));
    assert!(service.get_consumer_secret("frank").await.unwrap().is_none());
}

/// Search failures degrade to "not found"
#[tokio::test]
async fn test_search_failure_is_none() {
    let mock = MockCloudApi::new().await;
    mock.mock_realm_check(200).await;
    mock.mock_consumer_missing("grace").await;
    mock.mock_search("grace", 500, json!({"message": "boom"})).await;

    let service = service(&cloud_config(&mock.control_plane_url()));
    assert!(service.get_consumer_secret("grace").await.unwrap().is_none());
}

/// No credential is posted for consumers that cannot be resolved
#[tokio::test]
async fn test_create_for_unknown_consumer() {
    let mock = MockCloudApi::new().await;
    mock.mock_realm_check(200).await;
    mock.mock_consumer_missing("heidi").await;
    mock.mock_search("heidi", 200, json!({"data": []})).await;
    mock.mock_create("heidi", 0).await;

    let service = service(&cloud_config(&mock.control_plane_url()));
    assert!(service.create_consumer_secret("heidi").await.unwrap().is_none());
}

/// Created credentials are bound to the internal consumer id
#[tokio::test]
async fn test_create_fills_consumer_reference() {
    let mock = MockCloudApi::new().await;
    mock.mock_realm_check(200).await;
    mock.mock_consumer("ivan", "internal-ivan").await;
    mock.mock_create("internal-ivan", 1).await;

    let service = service(&cloud_config(&mock.control_plane_url()));
    let created = service.create_consumer_secret("ivan").await.unwrap().unwrap();
    assert_eq!(created.key, "new-key");
    assert_eq!(created.consumer_id(), Some("internal-ivan"));

    let cached = service.get_consumer_secret("ivan").await.unwrap().unwrap();
    assert_eq!(cached, created);
}
