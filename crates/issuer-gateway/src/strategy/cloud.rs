use super::{consumer_url, GatewayStrategy};
use crate::operation;
use crate::transport::{join_segments, parse_base_url, GatewayCall, GatewayTransport};
use async_trait::async_trait;
use issuer_core::{Consumer, GatewayError, GatewayMode, GatewayResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

const CONSUMER_PREFIX: [&str; 2] = ["core-entities", "consumers"];
const REALM_PREFIX_LEN: usize = 8;
const REALM_EXISTS_MESSAGE: &str = "realm name must be unique";

#[derive(Debug, Serialize)]
struct NewRealm<'a> {
    name: &'a str,
    allowed_control_planes: [&'a str; 1],
}

/// Multi-tenant cloud control plane.
///
/// Consumers may be addressed by id or username; credentials live under a
/// realm derived from the control-plane id, created on demand.
#[derive(Debug)]
pub struct CloudStrategy {
    base_url: String,
    api_base: String,
    control_plane_id: String,
    realm_name: String,
    token: Option<SecretString>,
    transport: Arc<GatewayTransport>,
}

impl CloudStrategy {
    /// Create the strategy from a `.../control-planes/{uuid}` URL.
    ///
    /// # Errors
    /// Returns a configuration error if the URL does not end with a
    /// control-plane UUID or the token is not a valid header value.
    pub fn new(
        control_plane_url: &str,
        token: Option<String>,
        transport: Arc<GatewayTransport>,
    ) -> GatewayResult<Self> {
        let url = parse_base_url(control_plane_url)?;
        let control_plane_id = control_plane_id(&url).ok_or_else(|| {
            GatewayError::configuration(format!(
                "Invalid control-plane URL '{control_plane_url}': expected .../control-planes/{{uuid}}"
            ))
        })?;

        let realm_name = format!(
            "auth-realm-{}",
            control_plane_id.chars().take(REALM_PREFIX_LEN).collect::<String>()
        );

        let strategy = Self {
            base_url: url.as_str().trim_end_matches('/').to_string(),
            api_base: url.origin().ascii_serialization(),
            control_plane_id,
            realm_name,
            token: token.filter(|t| !t.is_empty()).map(SecretString::new),
            transport,
        };
        strategy.auth_headers()?;
        Ok(strategy)
    }

    /// Control-plane id parsed from the URL.
    #[must_use]
    pub fn control_plane_id(&self) -> &str {
        &self.control_plane_id
    }

    /// Realm this issuer provisions credentials under.
    #[must_use]
    pub fn realm_name(&self) -> &str {
        &self.realm_name
    }

    fn realms_url(&self) -> GatewayResult<Url> {
        join_segments(&self.api_base, &["v1", "realms"])
    }

    fn realm_url(&self) -> GatewayResult<Url> {
        join_segments(&self.api_base, &["v1", "realms", self.realm_name.as_str()])
    }

    async fn create_realm(&self) -> GatewayResult<()> {
        let body = NewRealm {
            name: &self.realm_name,
            allowed_control_planes: [self.control_plane_id.as_str()],
        };
        let call = GatewayCall::post(operation::REALM_CREATE, self.realms_url()?)
            .headers(self.auth_headers()?)
            .json(&body)?
            .timeout_message("Timeout creating realm");

        let response = self.transport.execute(call).await?;

        if response.is_success() {
            info!(realm = %self.realm_name, "Realm created");
            return Ok(());
        }

        if response.status == 400 && response.body.contains(REALM_EXISTS_MESSAGE) {
            debug!(realm = %self.realm_name, "Realm created concurrently");
            return Ok(());
        }

        Err(GatewayError::configuration(format!(
            "Failed to create realm {}: HTTP {}: {}",
            self.realm_name, response.status, response.body
        )))
    }

    async fn search_by_username(&self, username: &str) -> GatewayResult<Option<String>> {
        let mut url = join_segments(&self.base_url, &CONSUMER_PREFIX)?;
        url.query_pairs_mut().append_pair("username", username);

        let call = GatewayCall::get(operation::CONSUMER_SEARCH, url)
            .headers(self.auth_headers()?)
            .timeout_message(format!("Timeout resolving consumer: {username}"));

        let response = match self.transport.execute(call).await {
            Ok(response) => response,
            Err(GatewayError::GatewayUnavailable { status, .. }) => {
                warn!(consumer = %username, status, "Consumer search failed");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if response.status != 200 {
            debug!(consumer = %username, status = response.status, "Consumer search returned no result");
            return Ok(None);
        }

        let Ok(body) = serde_json::from_str::<serde_json::Value>(&response.body) else {
            warn!(consumer = %username, "Consumer search returned an undecodable body");
            return Ok(None);
        };

        Ok(first_matching_id(&body, username))
    }
}

/// `{uuid}` from a URL whose path ends in `control-planes/{uuid}`.
fn control_plane_id(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [.., "control-planes", id] => Uuid::parse_str(id).ok().map(|_| (*id).to_string()),
        _ => None,
    }
}

/// Id of the first search hit, but only if its username matches exactly.
fn first_matching_id(body: &serde_json::Value, username: &str) -> Option<String> {
    let first = body.get("data")?.as_array()?.first()?;
    if first.get("username")?.as_str()? != username {
        return None;
    }
    first
        .get("id")?
        .as_str()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl GatewayStrategy for CloudStrategy {
    fn mode(&self) -> GatewayMode {
        GatewayMode::Cloud
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_consumer_url(&self, base: &str, consumer_id: &str) -> GatewayResult<Url> {
        consumer_url(base, &CONSUMER_PREFIX, consumer_id)
    }

    fn build_health_url(&self, base: &str) -> GatewayResult<Url> {
        parse_base_url(base)
    }

    fn create_auth_headers(&self, token: Option<&str>) -> GatewayResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| GatewayError::configuration(format!("Invalid access token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn access_token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret().as_str())
    }

    #[instrument(skip(self), fields(realm = %self.realm_name))]
    async fn ensure_prerequisites(&self) -> GatewayResult<()> {
        let call = GatewayCall::get(operation::REALM_CHECK, self.realm_url()?)
            .headers(self.auth_headers()?)
            .timeout_message("Timeout checking realm existence");

        let response = self.transport.execute(call).await?;

        match response.status {
            200 => Ok(()),
            404 => {
                debug!("Realm missing, creating");
                self.create_realm().await
            }
            _ => Err(response.unexpected(operation::REALM_CHECK)),
        }
    }

    #[instrument(skip(self))]
    async fn resolve_consumer_id(&self, external_id: &str) -> GatewayResult<Option<String>> {
        let call = GatewayCall::get(
            operation::CONSUMER_RESOLVE,
            self.build_consumer_url(&self.base_url, external_id)?,
        )
        .headers(self.auth_headers()?)
        .timeout_message(format!("Timeout resolving consumer: {external_id}"));

        let response = self.transport.execute(call).await?;

        match response.status {
            200 => {
                let consumer: Consumer = response.json(operation::CONSUMER_RESOLVE)?;
                Ok(Some(consumer.id))
            }
            404 => {
                debug!("Consumer not found by id, searching by username");
                self.search_by_username(external_id).await
            }
            _ => Err(response.unexpected(operation::CONSUMER_RESOLVE)),
        }
    }
}
