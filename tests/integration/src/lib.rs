//! Integration tests for the token issuer
//!
//! Drives `ConsumerSecretService` against wiremock stand-ins for both gateway
//! flavors:
//! - Admin API secret lifecycle and caching
//! - Cloud realm provisioning and consumer resolution
//! - Circuit breaker and retry behavior
//! - Configuration loading from files and environment

pub mod helpers;
pub mod mock_gateway;

// Re-export commonly used items
pub use helpers::*;
pub use mock_gateway::*;

#[cfg(test)]
mod admin_tests;
#[cfg(test)]
mod cloud_tests;
#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod resilience_tests;
