//! Test helper utilities for integration tests

use issuer_config::IssuerConfig;
use issuer_core::GatewayMode;
use issuer_gateway::ConsumerSecretService;
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

static TRACING: OnceLock<()> = OnceLock::new();

/// Initialize tracing for tests when `TEST_LOG` is set (only once)
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        if std::env::var("TEST_LOG").is_ok() {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        }
    });
}

/// Admin-mode configuration pointing at `url`, tuned for fast tests.
pub fn admin_config(url: &str) -> IssuerConfig {
    IssuerConfig::builder()
        .mode(GatewayMode::Admin)
        .admin_url(url)
        .admin_token("test-admin-token")
        .timeouts(Duration::from_millis(300), Duration::from_millis(300))
        .retry(2, Duration::from_millis(5))
        .circuit_breaker(3, Duration::from_millis(200))
        .build()
        .expect("valid admin config")
}

/// Cloud-mode configuration for the given control-plane URL.
pub fn cloud_config(control_plane_url: &str) -> IssuerConfig {
    IssuerConfig::builder()
        .mode(GatewayMode::Cloud)
        .control_plane_url(control_plane_url)
        .access_token("kpat_integration")
        .timeouts(Duration::from_millis(300), Duration::from_millis(300))
        .retry(2, Duration::from_millis(5))
        .circuit_breaker(3, Duration::from_millis(200))
        .build()
        .expect("valid cloud config")
}

/// Build a service from `config`.
pub fn service(config: &IssuerConfig) -> ConsumerSecretService {
    init_tracing();
    ConsumerSecretService::from_config(config).expect("service builds")
}
