//! Configuration types.

use crate::error::{ConfigError, Result};
use issuer_core::GatewayMode;
use issuer_telemetry::LogFormat;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Top-level issuer configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IssuerConfig {
    /// Gateway connection settings.
    pub gateway: GatewayConfig,
    /// Secret cache settings.
    pub cache: CacheConfig,
    /// Circuit breaker and retry settings.
    pub resilience: ResilienceConfig,
    /// Logging settings.
    pub logging: LogSettings,
}

/// How to reach the gateway's administrative API.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Which API flavor to speak.
    #[serde(default)]
    pub mode: GatewayMode,

    /// Admin API base URL (admin mode).
    #[serde(default)]
    pub admin_url: Option<String>,

    /// Admin API token (admin mode, optional).
    #[serde(default)]
    pub admin_token: Option<SecretString>,

    /// Control-plane URL ending in `/control-planes/{uuid}` (cloud mode).
    #[serde(default)]
    pub control_plane_url: Option<String>,

    /// Personal or system access token (cloud mode).
    #[serde(default)]
    pub access_token: Option<SecretString>,

    /// Timeout for GET requests.
    #[serde(with = "humantime_serde", default = "default_read_timeout")]
    pub read_timeout: Duration,

    /// Timeout for POST requests.
    #[serde(with = "humantime_serde", default = "default_write_timeout")]
    pub write_timeout: Duration,
}

/// Secret cache sizing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// TTL applied to cached secrets.
    #[serde(with = "humantime_serde", default = "default_cache_ttl")]
    pub default_ttl: Duration,

    /// Maximum cached consumers.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

/// Circuit breaker and retry tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResilienceConfig {
    /// Consecutive failures that open a breaker.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Time an open breaker waits before admitting a trial call.
    #[serde(with = "humantime_serde", default = "default_reset_timeout")]
    pub reset_timeout: Duration,

    /// Attempts per call, including the first.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Delay before the first retry.
    #[serde(with = "humantime_serde", default = "default_retry_base_delay")]
    pub retry_base_delay: Duration,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogSettings {
    /// Filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Upper bound for `cache.default_ttl`.
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn default_read_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_write_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(300)
}

fn default_max_entries() -> usize {
    1000
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_reset_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_retry_max_attempts() -> u32 {
    2
}

fn default_retry_base_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            mode: GatewayMode::Admin,
            admin_url: None,
            admin_token: None,
            control_plane_url: None,
            access_token: None,
            read_timeout: default_read_timeout(),
            write_timeout: default_write_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: default_cache_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout: default_reset_timeout(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay: default_retry_base_delay(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

impl GatewayConfig {
    /// Base URL for the configured mode.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        match self.mode {
            GatewayMode::Admin => self.admin_url.as_deref(),
            GatewayMode::Cloud => self.control_plane_url.as_deref(),
        }
    }

    /// Token for the configured mode, exposed for header construction.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        let token = match self.mode {
            GatewayMode::Admin => self.admin_token.as_ref(),
            GatewayMode::Cloud => self.access_token.as_ref(),
        };
        token.map(|t| t.expose_secret().as_str())
    }

    /// Validate the gateway settings.
    pub fn validate(&self) -> Result<()> {
        match self.mode {
            GatewayMode::Admin => {
                let url = self
                    .admin_url
                    .as_deref()
                    .ok_or_else(|| ConfigError::invalid("gateway.admin_url is required in admin mode"))?;
                validate_http_url("gateway.admin_url", url)?;
            }
            GatewayMode::Cloud => {
                let url = self.control_plane_url.as_deref().ok_or_else(|| {
                    ConfigError::invalid("gateway.control_plane_url is required in cloud mode")
                })?;
                validate_http_url("gateway.control_plane_url", url)?;

                let has_token = self
                    .access_token
                    .as_ref()
                    .is_some_and(|t| !t.expose_secret().trim().is_empty());
                if !has_token {
                    return Err(ConfigError::invalid(
                        "gateway.access_token is required in cloud mode",
                    ));
                }
            }
        }

        if self.read_timeout.is_zero() || self.write_timeout.is_zero() {
            return Err(ConfigError::invalid("gateway timeouts must be greater than 0"));
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| ConfigError::invalid(format!("{field}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::invalid(format!(
            "{field}: unsupported scheme '{other}'"
        ))),
    }
}

impl IssuerConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> IssuerConfigBuilder {
        IssuerConfigBuilder::new()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.gateway.validate()?;

        if self.cache.max_entries == 0 {
            return Err(ConfigError::invalid("cache.max_entries must be greater than 0"));
        }
        if self.cache.default_ttl.is_zero() {
            return Err(ConfigError::invalid("cache.default_ttl must be greater than 0"));
        }
        if self.cache.default_ttl > MAX_CACHE_TTL {
            return Err(ConfigError::invalid(format!(
                "cache.default_ttl must be at most {}s",
                MAX_CACHE_TTL.as_secs()
            )));
        }
        if self.resilience.failure_threshold == 0 {
            return Err(ConfigError::invalid(
                "resilience.failure_threshold must be greater than 0",
            ));
        }
        if self.resilience.retry_max_attempts == 0 {
            return Err(ConfigError::invalid(
                "resilience.retry_max_attempts must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Builder for issuer configuration.
#[derive(Debug, Default)]
pub struct IssuerConfigBuilder {
    config: IssuerConfig,
}

impl IssuerConfigBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gateway mode.
    #[must_use]
    pub fn mode(mut self, mode: GatewayMode) -> Self {
        self.config.gateway.mode = mode;
        self
    }

    /// Set the admin API URL.
    #[must_use]
    pub fn admin_url(mut self, url: impl Into<String>) -> Self {
        self.config.gateway.admin_url = Some(url.into());
        self
    }

    /// Set the admin API token.
    #[must_use]
    pub fn admin_token(mut self, token: impl Into<String>) -> Self {
        self.config.gateway.admin_token = Some(SecretString::new(token.into()));
        self
    }

    /// Set the cloud control-plane URL.
    #[must_use]
    pub fn control_plane_url(mut self, url: impl Into<String>) -> Self {
        self.config.gateway.control_plane_url = Some(url.into());
        self
    }

    /// Set the cloud access token.
    #[must_use]
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.gateway.access_token = Some(SecretString::new(token.into()));
        self
    }

    /// Set read and write timeouts.
    #[must_use]
    pub fn timeouts(mut self, read: Duration, write: Duration) -> Self {
        self.config.gateway.read_timeout = read;
        self.config.gateway.write_timeout = write;
        self
    }

    /// Set the cache TTL.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache.default_ttl = ttl;
        self
    }

    /// Set the cache capacity.
    #[must_use]
    pub fn cache_max_entries(mut self, max: usize) -> Self {
        self.config.cache.max_entries = max;
        self
    }

    /// Set breaker threshold and reset timeout.
    #[must_use]
    pub fn circuit_breaker(mut self, failure_threshold: u32, reset_timeout: Duration) -> Self {
        self.config.resilience.failure_threshold = failure_threshold;
        self.config.resilience.reset_timeout = reset_timeout;
        self
    }

    /// Set retry attempts and base delay.
    #[must_use]
    pub fn retry(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.config.resilience.retry_max_attempts = max_attempts;
        self.config.resilience.retry_base_delay = base_delay;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<IssuerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
