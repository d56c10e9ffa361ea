//! # Issuer Core
//!
//! Core types and error handling shared by the token issuer crates.
//!
//! This crate provides:
//! - The gateway error taxonomy (`GatewayError`) and result alias
//! - Consumer and credential payload types exchanged with the gateway
//! - The gateway mode selector and health check result

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{GatewayError, GatewayResult};
pub use types::{
    Consumer, ConsumerRef, ConsumerSecret, CredentialList, GatewayMode, HealthCheckResult,
    NewCredential,
};
