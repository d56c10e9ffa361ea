//! Resilience integration tests
//!
//! Circuit breaking and retry behavior across the full service stack.

use crate::helpers::*;
use crate::mock_gateway::*;
use issuer_core::GatewayError;
use issuer_resilience::CircuitState;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const SECRET_GET: &str = "consumer_secret_get";

/// Consecutive 5xx responses open the breaker; later calls never reach the gateway
#[tokio::test]
async fn test_breaker_opens_after_threshold() {
    let mock = MockAdminApi::new().await;
    Mock::given(method("GET"))
        .and(path("/consumers/alice/jwt"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&mock.server)
        .await;

    let service = service(&admin_config(&mock.url()));

    for _ in 0..3 {
        let error = service.get_consumer_secret("alice").await.unwrap_err();
        assert!(matches!(error, GatewayError::GatewayUnavailable { .. }));
    }

    for _ in 0..5 {
        let error = service.get_consumer_secret("alice").await.unwrap_err();
        assert!(error.is_circuit_open());
    }

    let stats = service.get_circuit_breaker_stats();
    assert_eq!(stats[SECRET_GET].state, CircuitState::Open);
    assert_eq!(stats[SECRET_GET].failure_count, 3);
}

/// After the reset timeout a successful trial closes the breaker
#[tokio::test]
async fn test_breaker_recovers() {
    let mock = MockAdminApi::new().await;
    Mock::given(method("GET"))
        .and(path("/consumers/bob/jwt"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .mount(&mock.server)
        .await;
    mock.mock_credentials("bob", "bob-key", 1).await;

    let service = service(&admin_config(&mock.url()));
    for _ in 0..3 {
        let _ = service.get_consumer_secret("bob").await;
    }
    assert!(service
        .get_consumer_secret("bob")
        .await
        .unwrap_err()
        .is_circuit_open());

    tokio::time::sleep(Duration::from_millis(250)).await;

    let secret = service.get_consumer_secret("bob").await.unwrap().unwrap();
    assert_eq!(secret.key, "bob-key");
    assert_eq!(
        service.get_circuit_breaker_stats()[SECRET_GET].state,
        CircuitState::Closed
    );
}

/// Breakers are per operation: a failing lookup does not block health checks
#[tokio::test]
async fn test_breakers_are_isolated() {
    let mock = MockAdminApi::new().await;
    mock.mock_credentials_status("carol", 503).await;
    mock.mock_status(200).await;

    let service = service(&admin_config(&mock.url()));
    for _ in 0..3 {
        let _ = service.get_consumer_secret("carol").await;
    }

    assert!(service.health_check().await.healthy);
    let stats = service.get_circuit_breaker_stats();
    assert_eq!(stats[SECRET_GET].state, CircuitState::Open);
    assert_eq!(stats["health_check"].state, CircuitState::Closed);

    service.reset_circuit_breakers();
    assert_eq!(
        service.get_circuit_breaker_stats()[SECRET_GET].state,
        CircuitState::Closed
    );
}

/// Timeouts are retried, then surface with a message naming the consumer
#[tokio::test]
async fn test_timeout_is_retried() {
    let mock = MockAdminApi::new().await;
    mock.mock_credentials_delayed("dave", Duration::from_secs(2)).await;

    let service = service(&admin_config(&mock.url()));
    let error = service.get_consumer_secret("dave").await.unwrap_err();

    assert!(error.is_timeout());
    assert!(error.to_string().contains("dave"));

    let requests = mock.server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2);
}

/// Client errors do not count toward opening the breaker
#[tokio::test]
async fn test_client_errors_do_not_trip() {
    let mock = MockAdminApi::new().await;
    mock.mock_credentials_status("erin", 400).await;

    let service = service(&admin_config(&mock.url()));
    for _ in 0..10 {
        let error = service.get_consumer_secret("erin").await.unwrap_err();
        assert!(matches!(error, GatewayError::UnexpectedStatus { status: 400, .. }));
    }

    assert_eq!(
        service.get_circuit_breaker_stats()[SECRET_GET].state,
        CircuitState::Closed
    );
}
