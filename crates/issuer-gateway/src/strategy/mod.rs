//! Gateway mode strategies.
//!
//! The admin API and the cloud control plane expose the same consumer and
//! credential resources under different paths, auth schemes and identity
//! rules. A strategy hides those differences from the service.

mod admin;
mod cloud;

pub use admin::AdminApiStrategy;
pub use cloud::CloudStrategy;

use crate::transport::{join_segments, GatewayTransport};
use async_trait::async_trait;
use issuer_config::GatewayConfig;
use issuer_core::{GatewayError, GatewayMode, GatewayResult};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use url::Url;

/// Mode-specific URL, auth and identity handling.
#[async_trait]
pub trait GatewayStrategy: Send + Sync + std::fmt::Debug {
    /// Mode implemented by this strategy.
    fn mode(&self) -> GatewayMode;

    /// Normalized base URL for consumer resources.
    fn base_url(&self) -> &str;

    /// URL of a single consumer.
    fn build_consumer_url(&self, base: &str, consumer_id: &str) -> GatewayResult<Url>;

    /// URL of a consumer's JWT credentials.
    fn build_credentials_url(&self, base: &str, consumer_id: &str) -> GatewayResult<Url> {
        let mut url = self.build_consumer_url(base, consumer_id)?;
        url.path_segments_mut()
            .map_err(|()| GatewayError::configuration("Consumer URL cannot be a base"))?
            .push("jwt");
        Ok(url)
    }

    /// URL requested by the health check.
    fn build_health_url(&self, base: &str) -> GatewayResult<Url>;

    /// Headers authenticating a request with `token`.
    fn create_auth_headers(&self, token: Option<&str>) -> GatewayResult<HeaderMap>;

    /// Token configured for this strategy.
    fn access_token(&self) -> Option<&str>;

    /// Headers authenticating a request with the configured token.
    fn auth_headers(&self) -> GatewayResult<HeaderMap> {
        self.create_auth_headers(self.access_token())
    }

    /// Make sure gateway-side prerequisites exist before consumer calls.
    async fn ensure_prerequisites(&self) -> GatewayResult<()>;

    /// Map an external consumer id to the gateway's internal id.
    ///
    /// `Ok(None)` means the consumer does not exist.
    async fn resolve_consumer_id(&self, external_id: &str) -> GatewayResult<Option<String>>;
}

/// Build the strategy selected by `config.mode`.
///
/// # Errors
/// Returns a configuration error when the mode's URL is missing or malformed.
pub fn create_strategy(
    config: &GatewayConfig,
    transport: Arc<GatewayTransport>,
) -> GatewayResult<Arc<dyn GatewayStrategy>> {
    let token = config.token().map(str::to_string);

    match config.mode {
        GatewayMode::Admin => {
            let url = config.admin_url.as_deref().ok_or_else(|| {
                GatewayError::configuration("Admin mode requires an admin API URL")
            })?;
            Ok(Arc::new(AdminApiStrategy::new(url, token)?))
        }
        GatewayMode::Cloud => {
            let url = config.control_plane_url.as_deref().ok_or_else(|| {
                GatewayError::configuration("Cloud mode requires a control-plane URL")
            })?;
            Ok(Arc::new(CloudStrategy::new(url, token, transport)?))
        }
    }
}

/// Consumer path under `base` for the given prefix segments.
pub(crate) fn consumer_url(base: &str, prefix: &[&str], consumer_id: &str) -> GatewayResult<Url> {
    let mut segments = prefix.to_vec();
    segments.push(consumer_id);
    join_segments(base, &segments)
}
