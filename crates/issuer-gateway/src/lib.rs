//! # Issuer Gateway
//!
//! Resolves and provisions consumer signing secrets against the API
//! gateway's administrative API.
//!
//! - [`strategy`]: admin-API and cloud control-plane flavors behind one trait
//! - [`transport`]: HTTP calls wrapped in retry (inner) and circuit breaker (outer)
//! - [`service`]: cache-first orchestration used by the rest of the issuer
//!
//! ```rust,no_run
//! use issuer_config::IssuerConfig;
//! use issuer_gateway::ConsumerSecretService;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IssuerConfig::builder()
//!     .admin_url("http://localhost:8001")
//!     .build()?;
//! let service = ConsumerSecretService::from_config(&config)?;
//!
//! if let Some(secret) = service.get_consumer_secret("alice").await? {
//!     println!("key = {}", secret.key);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod operation;
pub mod secret;
pub mod service;
pub mod strategy;
pub mod transport;

pub use secret::generate_credential;
pub use service::{ConsumerSecretService, ConsumerSecretServiceBuilder};
pub use strategy::{create_strategy, AdminApiStrategy, CloudStrategy, GatewayStrategy};
pub use transport::{GatewayCall, GatewayTransport, HttpResponse};
