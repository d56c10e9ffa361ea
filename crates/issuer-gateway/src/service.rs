//! Consumer secret orchestration.
//!
//! Lookups go cache first. On a miss the strategy prepares the gateway,
//! resolves the consumer's internal id, and the credential call runs through
//! the guarded transport. "Not found" at any step is `Ok(None)`.

use crate::operation;
use crate::secret::generate_credential;
use crate::strategy::{create_strategy, GatewayStrategy};
use crate::transport::{GatewayCall, GatewayTransport};
use issuer_config::{GatewayConfig, IssuerConfig};
use issuer_core::{
    ConsumerRef, ConsumerSecret, CredentialList, GatewayError, GatewayMode, GatewayResult,
    HealthCheckResult,
};
use issuer_resilience::{
    CacheStats, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitBreakerSnapshot,
    ConsumerSecretCache, RetryConfig, RetryPolicy, SecretCacheConfig,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Resolves and provisions consumer secrets.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
#[derive(Debug)]
pub struct ConsumerSecretService {
    strategy: Arc<dyn GatewayStrategy>,
    transport: Arc<GatewayTransport>,
    cache: ConsumerSecretCache,
}

impl ConsumerSecretService {
    /// Create a new service builder.
    #[must_use]
    pub fn builder() -> ConsumerSecretServiceBuilder {
        ConsumerSecretServiceBuilder::new()
    }

    /// Build the service from loaded configuration.
    ///
    /// # Errors
    /// Returns a configuration error if the gateway settings are unusable.
    pub fn from_config(config: &IssuerConfig) -> GatewayResult<Self> {
        Self::builder()
            .gateway(config.gateway.clone())
            .cache(SecretCacheConfig {
                default_ttl: config.cache.default_ttl,
                max_entries: config.cache.max_entries,
            })
            .circuit_breaker(CircuitBreakerConfig {
                failure_threshold: config.resilience.failure_threshold,
                reset_timeout: config.resilience.reset_timeout,
            })
            .retry(RetryConfig {
                max_attempts: config.resilience.retry_max_attempts,
                base_delay: config.resilience.retry_base_delay,
                ..Default::default()
            })
            .build()
    }

    /// Gateway mode in use.
    #[must_use]
    pub fn mode(&self) -> GatewayMode {
        self.strategy.mode()
    }

    /// Secret for `external_id`, or `None` if the consumer or its credential
    /// does not exist.
    ///
    /// # Errors
    /// Infrastructure failures: timeouts, open breakers, 5xx responses,
    /// realm provisioning failures and undecodable responses.
    #[instrument(skip(self))]
    pub async fn get_consumer_secret(&self, external_id: &str) -> GatewayResult<Option<ConsumerSecret>> {
        if let Some(secret) = self.cache.get(external_id) {
            debug!("Cache hit");
            return Ok(Some(secret));
        }

        let Some(consumer_id) = self.resolve(external_id).await? else {
            return Ok(None);
        };

        let url = self
            .strategy
            .build_credentials_url(self.strategy.base_url(), &consumer_id)?;
        let call = GatewayCall::get(operation::SECRET_GET, url)
            .headers(self.strategy.auth_headers()?)
            .timeout_message(format!("Timeout fetching secret for consumer: {external_id}"));

        let response = self.transport.execute(call).await?;

        match response.status {
            404 => {
                debug!("Consumer has no credential endpoint");
                Ok(None)
            }
            status if (200..300).contains(&status) => {
                let list: CredentialList = response.json(operation::SECRET_GET)?;
                match list.into_first() {
                    Some(secret) => {
                        self.cache.set(external_id, secret.clone(), None);
                        Ok(Some(secret))
                    }
                    None => {
                        debug!("Consumer has no credentials");
                        Ok(None)
                    }
                }
            }
            _ => Err(response.unexpected(operation::SECRET_GET)),
        }
    }

    /// Provision a new credential for `external_id` and cache it, replacing
    /// any cached secret. `None` if the consumer does not exist.
    ///
    /// # Errors
    /// Same failure modes as [`Self::get_consumer_secret`].
    #[instrument(skip(self))]
    pub async fn create_consumer_secret(
        &self,
        external_id: &str,
    ) -> GatewayResult<Option<ConsumerSecret>> {
        let Some(consumer_id) = self.resolve(external_id).await? else {
            return Ok(None);
        };

        let url = self
            .strategy
            .build_credentials_url(self.strategy.base_url(), &consumer_id)?;
        let call = GatewayCall::post(operation::SECRET_CREATE, url)
            .headers(self.strategy.auth_headers()?)
            .json(&generate_credential())?
            .timeout_message(format!("Timeout creating secret for consumer: {external_id}"))
            .non_idempotent();

        let response = self.transport.execute(call).await?;

        match response.status {
            404 => {
                debug!("Consumer disappeared before credential creation");
                Ok(None)
            }
            status if (200..300).contains(&status) => {
                let mut secret: ConsumerSecret = response.json(operation::SECRET_CREATE)?;
                if secret.consumer.is_none() {
                    secret.consumer = Some(ConsumerRef { id: consumer_id });
                }
                self.cache.set(external_id, secret.clone(), None);
                info!(credential = %secret.id, "Consumer secret created");
                Ok(Some(secret))
            }
            _ => Err(response.unexpected(operation::SECRET_CREATE)),
        }
    }

    async fn resolve(&self, external_id: &str) -> GatewayResult<Option<String>> {
        self.strategy.ensure_prerequisites().await?;

        let resolved = self.strategy.resolve_consumer_id(external_id).await?;
        if resolved.is_none() {
            debug!(consumer = %external_id, "Consumer not found");
        }
        Ok(resolved)
    }

    /// Check the gateway. Never fails; problems are reported in the result.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let outcome = self.ping().await;
        let elapsed = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(status) if (200..300).contains(&status) => HealthCheckResult::healthy(elapsed),
            Ok(status) => HealthCheckResult::unhealthy(elapsed, describe_status(status)),
            Err(GatewayError::GatewayUnavailable { status, .. }) => {
                HealthCheckResult::unhealthy(elapsed, describe_status(status))
            }
            Err(error) => {
                warn!(error = %error, "Gateway health check failed");
                HealthCheckResult::unhealthy(elapsed, error.to_string())
            }
        }
    }

    async fn ping(&self) -> GatewayResult<u16> {
        let url = self.strategy.build_health_url(self.strategy.base_url())?;
        let call = GatewayCall::get(operation::HEALTH_CHECK, url)
            .headers(self.strategy.auth_headers()?)
            .timeout_message("Timeout checking gateway health");
        Ok(self.transport.execute(call).await?.status)
    }

    /// Drop one cached secret, or all of them.
    pub fn clear_cache(&self, external_id: Option<&str>) {
        match external_id {
            Some(id) => self.cache.delete(id),
            None => self.cache.clear(),
        }
    }

    /// Cache statistics.
    #[must_use]
    pub fn get_cache_stats(&self) -> CacheStats {
        self.cache.get_stats()
    }

    /// Snapshot of every breaker created so far, keyed by operation.
    #[must_use]
    pub fn get_circuit_breaker_stats(&self) -> BTreeMap<String, CircuitBreakerSnapshot> {
        self.transport.breakers().stats()
    }

    /// Close one breaker. Returns false if the operation has no breaker yet.
    pub fn reset_circuit_breaker(&self, operation: &str) -> bool {
        self.transport.breakers().reset(operation)
    }

    /// Close every breaker.
    pub fn reset_circuit_breakers(&self) {
        self.transport.breakers().reset_all();
    }
}

fn describe_status(status: u16) -> String {
    match status {
        401 => "Authentication failed: check the gateway token".to_string(),
        403 => "Permission denied: token lacks access to the gateway admin API".to_string(),
        404 => "Endpoint not found: check the gateway URL configuration".to_string(),
        other => format!("HTTP {other}"),
    }
}

/// Builder for [`ConsumerSecretService`].
#[derive(Debug, Default)]
pub struct ConsumerSecretServiceBuilder {
    gateway: Option<GatewayConfig>,
    cache: SecretCacheConfig,
    circuit_breaker: CircuitBreakerConfig,
    retry: RetryConfig,
    http: Option<reqwest::Client>,
}

impl ConsumerSecretServiceBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway connection settings.
    #[must_use]
    pub fn gateway(mut self, config: GatewayConfig) -> Self {
        self.gateway = Some(config);
        self
    }

    /// Cache settings.
    #[must_use]
    pub fn cache(mut self, config: SecretCacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Breaker settings shared by every operation.
    #[must_use]
    pub fn circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = config;
        self
    }

    /// Retry settings.
    #[must_use]
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Use a preconfigured HTTP client.
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Build the service.
    ///
    /// # Errors
    /// Returns a configuration error when gateway settings are missing or invalid.
    pub fn build(self) -> GatewayResult<ConsumerSecretService> {
        let gateway = self
            .gateway
            .ok_or_else(|| GatewayError::configuration("Gateway configuration is required"))?;

        let http = match self.http {
            Some(client) => client,
            None => GatewayTransport::http_client(gateway.read_timeout)?,
        };

        let transport = Arc::new(GatewayTransport::new(
            http,
            RetryPolicy::new(self.retry),
            Arc::new(CircuitBreakerRegistry::new(self.circuit_breaker)),
            gateway.read_timeout,
            gateway.write_timeout,
        ));
        let strategy = create_strategy(&gateway, Arc::clone(&transport))?;

        info!(mode = %strategy.mode(), base_url = %strategy.base_url(), "Consumer secret service ready");

        Ok(ConsumerSecretService {
            strategy,
            transport,
            cache: ConsumerSecretCache::new(self.cache),
        })
    }
}
