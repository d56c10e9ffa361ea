//! File and environment loading.

use crate::config::IssuerConfig;
use crate::error::{ConfigError, Result};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Gateway mode (`admin` or `cloud`)
pub const ENV_GATEWAY_MODE: &str = "ISSUER_GATEWAY_MODE";
/// Admin API URL
pub const ENV_ADMIN_URL: &str = "ISSUER_GATEWAY_ADMIN_URL";
/// Admin API token
pub const ENV_ADMIN_TOKEN: &str = "ISSUER_GATEWAY_ADMIN_TOKEN";
/// Cloud control-plane URL
pub const ENV_CONTROL_PLANE_URL: &str = "ISSUER_CONTROL_PLANE_URL";
/// Cloud access token
pub const ENV_ACCESS_TOKEN: &str = "ISSUER_ACCESS_TOKEN";
/// Cache TTL in seconds
pub const ENV_CACHE_TTL_SECONDS: &str = "ISSUER_CACHE_TTL_SECONDS";
/// Cache capacity
pub const ENV_CACHE_MAX_ENTRIES: &str = "ISSUER_CACHE_MAX_ENTRIES";
/// Log filter directive
pub const ENV_LOG_LEVEL: &str = "ISSUER_LOG_LEVEL";
/// Log format (`text` or `json`)
pub const ENV_LOG_FORMAT: &str = "ISSUER_LOG_FORMAT";

/// Loads an [`IssuerConfig`] from an optional file plus environment overrides.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigLoader {
    /// Create a loader with no file and environment overrides enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the given file first.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Ignore `ISSUER_*` environment variables.
    #[must_use]
    pub fn without_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Load and validate using the process environment.
    pub fn load(&self) -> Result<IssuerConfig> {
        self.load_with(|name| std::env::var(name).ok())
    }

    /// Load and validate, reading overrides through `lookup`.
    pub fn load_with<F>(&self, lookup: F) -> Result<IssuerConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &self.file {
            Some(path) => load_file(path)?,
            None => IssuerConfig::default(),
        };

        if !self.skip_env {
            apply_env_overrides(&mut config, lookup)?;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parse a configuration file, picking the format from its extension.
pub fn load_file(path: &Path) -> Result<IssuerConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    debug!(path = %path.display(), format = %extension, "Loading configuration file");

    match extension.as_str() {
        "yaml" | "yml" => {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::parse(path, e))
        }
        "toml" => toml::from_str(&contents).map_err(|e| ConfigError::parse(path, e)),
        "json" => serde_json::from_str(&contents).map_err(|e| ConfigError::parse(path, e)),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Apply `ISSUER_*` overrides on top of `config`.
pub fn apply_env_overrides<F>(config: &mut IssuerConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(mode) = get(ENV_GATEWAY_MODE) {
        config.gateway.mode = mode
            .parse()
            .map_err(|e: String| ConfigError::invalid_env(ENV_GATEWAY_MODE, e))?;
    }
    if let Some(url) = get(ENV_ADMIN_URL) {
        config.gateway.admin_url = Some(url);
    }
    if let Some(token) = get(ENV_ADMIN_TOKEN) {
        config.gateway.admin_token = Some(SecretString::new(token));
    }
    if let Some(url) = get(ENV_CONTROL_PLANE_URL) {
        config.gateway.control_plane_url = Some(url);
    }
    if let Some(token) = get(ENV_ACCESS_TOKEN) {
        config.gateway.access_token = Some(SecretString::new(token));
    }
    if let Some(ttl) = get(ENV_CACHE_TTL_SECONDS) {
        let seconds: u64 = ttl
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid_env(ENV_CACHE_TTL_SECONDS, format!("{e}")))?;
        config.cache.default_ttl = Duration::from_secs(seconds);
    }
    if let Some(max) = get(ENV_CACHE_MAX_ENTRIES) {
        config.cache.max_entries = max
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid_env(ENV_CACHE_MAX_ENTRIES, format!("{e}")))?;
    }
    if let Some(level) = get(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
    if let Some(format) = get(ENV_LOG_FORMAT) {
        config.logging.format = format
            .parse()
            .map_err(|e| ConfigError::invalid_env(ENV_LOG_FORMAT, format!("{e}")))?;
    }

    Ok(())
}
