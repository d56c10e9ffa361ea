//! # Issuer Config
//!
//! Configuration for the token issuer: gateway connection settings, cache
//! sizing, breaker and retry tuning, and logging. Values come from an
//! optional YAML, TOML or JSON file, then `ISSUER_*` environment variables,
//! and are validated before use.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod loader;

pub use config::{
    CacheConfig, GatewayConfig, IssuerConfig, IssuerConfigBuilder, LogSettings, ResilienceConfig,
};
pub use error::{ConfigError, Result};
pub use loader::ConfigLoader;
