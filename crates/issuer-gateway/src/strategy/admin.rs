use super::{consumer_url, GatewayStrategy};
use crate::transport::{join_segments, parse_base_url};
use async_trait::async_trait;
use issuer_core::{GatewayError, GatewayMode, GatewayResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

const ADMIN_TOKEN_HEADER: &str = "kong-admin-token";

/// Self-hosted admin API. Consumer ids are used verbatim.
#[derive(Debug)]
pub struct AdminApiStrategy {
    base_url: String,
    token: Option<SecretString>,
}

impl AdminApiStrategy {
    /// Create the strategy for the admin API at `admin_url`.
    ///
    /// # Errors
    /// Returns a configuration error if the URL or token is unusable.
    pub fn new(admin_url: &str, token: Option<String>) -> GatewayResult<Self> {
        let url = parse_base_url(admin_url)?;
        let strategy = Self {
            base_url: url.as_str().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()).map(SecretString::new),
        };
        strategy.auth_headers()?;
        Ok(strategy)
    }
}

#[async_trait]
impl GatewayStrategy for AdminApiStrategy {
    fn mode(&self) -> GatewayMode {
        GatewayMode::Admin
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_consumer_url(&self, base: &str, consumer_id: &str) -> GatewayResult<Url> {
        consumer_url(base, &["consumers"], consumer_id)
    }

    fn build_health_url(&self, base: &str) -> GatewayResult<Url> {
        join_segments(base, &["status"])
    }

    fn create_auth_headers(&self, token: Option<&str>) -> GatewayResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(token)
                .map_err(|e| GatewayError::configuration(format!("Invalid admin token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(ADMIN_TOKEN_HEADER), value);
        }
        Ok(headers)
    }

    fn access_token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret().as_str())
    }

    async fn ensure_prerequisites(&self) -> GatewayResult<()> {
        Ok(())
    }

    async fn resolve_consumer_id(&self, external_id: &str) -> GatewayResult<Option<String>> {
        Ok(Some(external_id.to_string()))
    }
}
