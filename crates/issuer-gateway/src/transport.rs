//! Guarded HTTP transport to the gateway.
//!
//! Every call runs as `breaker(retry(attempt))`: retries happen inside the
//! breaker, so a call that fails after all attempts counts once. A 5xx status
//! is turned into [`GatewayError::GatewayUnavailable`] here; every other
//! status is handed back for the caller to interpret.

use issuer_core::{GatewayError, GatewayResult};
use issuer_resilience::{CircuitBreakerRegistry, RetryPolicy};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// One logical call to the gateway.
#[derive(Debug, Clone)]
pub struct GatewayCall {
    operation: &'static str,
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
    timeout_message: Option<String>,
    idempotent: bool,
}

impl GatewayCall {
    /// GET request for `operation`.
    #[must_use]
    pub fn get(operation: &'static str, url: Url) -> Self {
        Self::new(operation, Method::GET, url)
    }

    /// POST request for `operation`.
    #[must_use]
    pub fn post(operation: &'static str, url: Url) -> Self {
        Self::new(operation, Method::POST, url)
    }

    fn new(operation: &'static str, method: Method, url: Url) -> Self {
        Self {
            operation,
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout_message: None,
            idempotent: true,
        }
    }

    /// Attach request headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> GatewayResult<Self> {
        let value = serde_json::to_value(body).map_err(|e| {
            GatewayError::configuration(format!("Failed to encode {} body: {e}", self.operation))
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Message used when the call times out.
    #[must_use]
    pub fn timeout_message(mut self, message: impl Into<String>) -> Self {
        self.timeout_message = Some(message.into());
        self
    }

    /// Send at most once. A write that timed out may still have been
    /// applied by the gateway, so repeating it could duplicate the resource.
    #[must_use]
    pub fn non_idempotent(mut self) -> Self {
        self.idempotent = false;
        self
    }

    /// Operation name.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Target URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Response from the gateway with a non-5xx status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self, operation: &str) -> GatewayResult<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| GatewayError::invalid_response(operation, e.to_string()))
    }

    /// Error for a status the caller did not expect.
    #[must_use]
    pub fn unexpected(&self, operation: &str) -> GatewayError {
        GatewayError::unexpected_status(operation, self.status, &self.body)
    }
}

/// HTTP client wrapped in retry and per-operation circuit breakers.
#[derive(Debug)]
pub struct GatewayTransport {
    http: reqwest::Client,
    retry: RetryPolicy,
    single_attempt: RetryPolicy,
    breakers: Arc<CircuitBreakerRegistry>,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl GatewayTransport {
    /// Create a transport.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        retry: RetryPolicy,
        breakers: Arc<CircuitBreakerRegistry>,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Self {
        Self {
            http,
            retry,
            single_attempt: RetryPolicy::disabled(),
            breakers,
            read_timeout,
            write_timeout,
        }
    }

    /// Build the shared HTTP client.
    pub fn http_client(connect_timeout: Duration) -> GatewayResult<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("token-issuer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::configuration(format!("Failed to create HTTP client: {e}")))
    }

    /// Breaker registry shared by every operation.
    #[must_use]
    pub fn breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.breakers
    }

    /// Execute `call` through the breaker and retry policy.
    /// Non-idempotent calls get a single attempt.
    ///
    /// # Errors
    /// `CircuitBreakerOpen` when the operation's breaker rejects the call,
    /// `Timeout` or `Transport` once retries are exhausted, and
    /// `GatewayUnavailable` for 5xx responses.
    #[instrument(skip(self, call), fields(operation = call.operation, method = %call.method))]
    pub async fn execute(&self, call: GatewayCall) -> GatewayResult<HttpResponse> {
        let operation = call.operation;
        let retry = if call.idempotent {
            &self.retry
        } else {
            &self.single_attempt
        };
        self.breakers
            .call(operation, || retry.execute(operation, || self.send_once(&call)))
            .await
    }

    async fn send_once(&self, call: &GatewayCall) -> GatewayResult<HttpResponse> {
        let timeout = if call.method == Method::GET {
            self.read_timeout
        } else {
            self.write_timeout
        };

        debug!(url = %call.url, timeout_ms = timeout.as_millis() as u64, "Sending gateway request");

        let mut request = self
            .http
            .request(call.method.clone(), call.url.clone())
            .headers(call.headers.clone())
            .timeout(timeout);
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| map_reqwest_error(call, e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| map_reqwest_error(call, e))?;

        debug!(status, "Gateway responded");

        if status >= 500 {
            return Err(GatewayError::unavailable(call.operation, status));
        }

        Ok(HttpResponse { status, body })
    }
}

fn map_reqwest_error(call: &GatewayCall, error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        let message = call
            .timeout_message
            .clone()
            .unwrap_or_else(|| format!("Timeout during {}", call.operation));
        GatewayError::timeout(call.operation, message)
    } else {
        GatewayError::transport(call.operation, error)
    }
}

/// Parse a base URL after stripping every trailing slash.
pub fn parse_base_url(base: &str) -> GatewayResult<Url> {
    let trimmed = base.trim().trim_end_matches('/');
    Url::parse(trimmed)
        .map_err(|e| GatewayError::configuration(format!("Invalid gateway URL '{base}': {e}")))
}

/// Append path segments to `base`, percent-encoding each one.
pub fn join_segments(base: &str, segments: &[&str]) -> GatewayResult<Url> {
    let mut url = parse_base_url(base)?;
    url.path_segments_mut()
        .map_err(|()| GatewayError::configuration(format!("Gateway URL cannot be a base: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
