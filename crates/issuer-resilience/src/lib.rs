//! # Issuer Resilience
//!
//! Resilience patterns guarding the token issuer's calls to the gateway:
//! - Circuit breaker, one per named operation, behind a lazily populated registry
//! - Retry policy for transient transport failures
//! - Bounded TTL cache of resolved consumer secrets

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod circuit_breaker;
pub mod registry;
pub mod retry;

// Re-export main types
pub use cache::{CacheStats, ConsumerSecretCache, SecretCacheConfig};
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot, CircuitState,
};
pub use registry::CircuitBreakerRegistry;
pub use retry::{RetryConfig, RetryPolicy};
