//! # Issuer Telemetry
//!
//! Logging for the token issuer:
//! - `tracing-subscriber` setup with text or JSON output
//! - Masking helpers for credentials that end up in human-facing output

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod redact;

pub use logging::{init_logging, LogFormat, LoggingConfig, TelemetryError};
pub use redact::mask_secret;
