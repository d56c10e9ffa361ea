//! Admin API integration tests
//!
//! Secret lifecycle, caching and health reporting against a self-hosted
//! admin API.

use crate::helpers::*;
use crate::mock_gateway::*;
use issuer_core::{GatewayError, GatewayMode};
use issuer_gateway::ConsumerSecretService;
use issuer_resilience::SecretCacheConfig;
use std::time::Duration;

/// Missing credential, then provisioning, then a cached read
#[tokio::test]
async fn test_secret_lifecycle() {
    let mock = MockAdminApi::new().await;
    mock.mock_create("alice").await;
    let service = service(&admin_config(&mock.url()));

    let created = service.create_consumer_secret("alice").await.unwrap().unwrap();
    assert_eq!(created.id, "cred-created");
    assert_eq!(created.secret.len(), 64);
    assert_eq!(created.consumer_id(), Some("alice"));

    // Served from the cache: no GET mock is mounted.
    let fetched = service.get_consumer_secret("alice").await.unwrap().unwrap();
    assert_eq!(fetched, created);

    let stats = service.get_cache_stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.hits, 1);
}

/// Repeated lookups hit the gateway once
#[tokio::test]
async fn test_lookup_cached_until_cleared() {
    let mock = MockAdminApi::new().await;
    mock.mock_credentials("bob", "bob-key", 2).await;
    let service = service(&admin_config(&mock.url()));

    for _ in 0..5 {
        let secret = service.get_consumer_secret("bob").await.unwrap().unwrap();
        assert_eq!(secret.key, "bob-key");
    }

    service.clear_cache(Some("bob"));
    assert!(service.get_consumer_secret("bob").await.unwrap().is_some());

    let stats = service.get_cache_stats();
    assert_eq!(stats.hits, 4);
    assert_eq!(stats.misses, 2);
}

/// Expired entries are fetched again
#[tokio::test]
async fn test_cache_ttl_expiry() {
    let mock = MockAdminApi::new().await;
    mock.mock_credentials("carol", "carol-key", 2).await;

    let mut config = admin_config(&mock.url());
    config.cache.default_ttl = Duration::from_millis(150);
    let service = service(&config);

    service.get_consumer_secret("carol").await.unwrap();
    service.get_consumer_secret("carol").await.unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;
    service.get_consumer_secret("carol").await.unwrap();
}

/// Absent consumers and empty credential lists are not errors
#[tokio::test]
async fn test_not_found_is_none() {
    let mock = MockAdminApi::new().await;
    mock.mock_no_credentials("dave").await;
    mock.mock_credentials_status("ghost", 404).await;
    let service = service(&admin_config(&mock.url()));

    assert!(service.get_consumer_secret("dave").await.unwrap().is_none());
    assert!(service.get_consumer_secret("ghost").await.unwrap().is_none());
    assert_eq!(service.get_cache_stats().size, 0);
}

/// Non-404 client errors surface as unexpected status
#[tokio::test]
async fn test_unexpected_status() {
    let mock = MockAdminApi::new().await;
    mock.mock_credentials_status("erin", 401).await;
    let service = service(&admin_config(&mock.url()));

    let error = service.get_consumer_secret("erin").await.unwrap_err();
    assert!(matches!(error, GatewayError::UnexpectedStatus { status: 401, .. }));
    assert_eq!(error.status_code(), Some(401));
}

/// Consumer ids are percent-encoded into the path
#[tokio::test]
async fn test_consumer_id_is_encoded() {
    let mock = MockAdminApi::new().await;
    mock.mock_credentials("user%20one", "encoded", 1).await;
    let service = service(&admin_config(&mock.url()));

    let secret = service.get_consumer_secret("user one").await.unwrap().unwrap();
    assert_eq!(secret.key, "encoded");
}

/// Health reporting maps statuses to descriptive messages
#[tokio::test]
async fn test_health_check() {
    let healthy = MockAdminApi::new().await;
    healthy.mock_status(200).await;
    let result = service(&admin_config(&healthy.url())).health_check().await;
    assert!(result.healthy);

    let forbidden = MockAdminApi::new().await;
    forbidden.mock_status(403).await;
    let result = service(&admin_config(&forbidden.url())).health_check().await;
    assert!(!result.healthy);
    assert!(result.error.unwrap().starts_with("Permission denied"));
}

/// A refused connection is reported, not raised
#[tokio::test]
async fn test_health_check_unreachable() {
    let service = service(&admin_config("http://127.0.0.1:9"));
    let result = service.health_check().await;
    assert!(!result.healthy);
    assert!(result.error.is_some());
}

/// Builder wiring with explicit cache settings
#[tokio::test]
async fn test_builder_cache_capacity() {
    let mock = MockAdminApi::new().await;
    for consumer in ["a", "b", "c"] {
        mock.mock_credentials(consumer, consumer, 1).await;
    }

    let config = admin_config(&mock.url());
    let service = ConsumerSecretService::builder()
        .gateway(config.gateway.clone())
        .cache(SecretCacheConfig {
            default_ttl: Duration::from_secs(60),
            max_entries: 2,
        })
        .build()
        .unwrap();
    assert_eq!(service.mode(), GatewayMode::Admin);

    for consumer in ["a", "b", "c"] {
        service.get_consumer_secret(consumer).await.unwrap();
    }
    assert_eq!(service.get_cache_stats().size, 2);
}
