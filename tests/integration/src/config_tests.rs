//! Configuration integration tests
//!
//! Files and environment overrides feeding a working service.

use crate::helpers::*;
use crate::mock_gateway::*;
use issuer_config::{ConfigError, ConfigLoader};
use issuer_core::GatewayMode;
use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

fn config_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// A YAML file drives a working admin-mode service
#[tokio::test]
async fn test_yaml_file_to_service() {
    let mock = MockAdminApi::new().await;
    mock.mock_credentials("alice", "alice-key", 1).await;

    let file = config_file(
        ".yaml",
        &format!(
            "gateway:\n  mode: admin\n  admin_url: {}/\n  admin_token: test-admin-token\n  read_timeout: 2s\ncache:\n  default_ttl: 1m\n  max_entries: 10\n",
            mock.url()
        ),
    );

    let config = ConfigLoader::new()
        .with_file(file.path())
        .without_env()
        .load()
        .unwrap();
    assert_eq!(config.gateway.read_timeout, Duration::from_secs(2));
    assert_eq!(config.cache.max_entries, 10);

    let service = service(&config);
    let secret = service.get_consumer_secret("alice").await.unwrap().unwrap();
    assert_eq!(secret.key, "alice-key");
}

/// Environment variables switch a TOML admin config to cloud mode
#[tokio::test]
async fn test_env_overrides_file() {
    let mock = MockCloudApi::new().await;
    mock.mock_realm_check(200).await;
    mock.mock_consumer("bob", "internal-bob").await;
    mock.mock_credentials("internal-bob", "bob-key", 1).await;

    let file = config_file(
        ".toml",
        "[gateway]\nmode = \"admin\"\nadmin_url = \"http://kong:8001\"\n",
    );

    let env: HashMap<&str, String> = HashMap::from([
        ("ISSUER_GATEWAY_MODE", "konnect".to_string()),
        ("ISSUER_CONTROL_PLANE_URL", mock.control_plane_url()),
        ("ISSUER_ACCESS_TOKEN", "kpat_integration".to_string()),
        ("ISSUER_CACHE_TTL_SECONDS", "30".to_string()),
    ]);

    let config = ConfigLoader::new()
        .with_file(file.path())
        .load_with(|name| env.get(name).cloned())
        .unwrap();
    assert_eq!(config.gateway.mode, GatewayMode::Cloud);
    assert_eq!(config.cache.default_ttl, Duration::from_secs(30));

    let service = service(&config);
    assert!(service.get_consumer_secret("bob").await.unwrap().is_some());
}

/// Cloud mode without an access token is rejected before any request
#[test]
fn test_cloud_requires_token() {
    let file = config_file(
        ".json",
        &format!(
            r#"{{"gateway": {{"mode": "cloud", "control_plane_url": "https://cloud.example.com/v2/control-planes/{CONTROL_PLANE_ID}"}}}}"#
        ),
    );

    let error = ConfigLoader::new()
        .with_file(file.path())
        .without_env()
        .load()
        .unwrap_err();
    assert!(matches!(error, ConfigError::Invalid(_)));
}
