//! Error types for gateway credential operations.
//!
//! "Not found" is never an error in this crate family: lookups return
//! `Ok(None)` for absent consumers and credentials. `GatewayError` is reserved
//! for infrastructure failures that callers must branch on differently.

use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Errors raised while talking to the gateway's administrative API.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The outbound call exceeded its deadline.
    #[error("{message}")]
    Timeout {
        /// Named operation that timed out.
        operation: String,
        /// Descriptive message naming the resource involved.
        message: String,
    },

    /// Network-level failure other than a timeout.
    #[error("Transport error during {operation}: {source}")]
    Transport {
        /// Named operation that failed.
        operation: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The gateway answered with a 5xx status.
    #[error("Gateway unavailable during {operation}: HTTP {status}")]
    GatewayUnavailable {
        /// Named operation that failed.
        operation: String,
        /// HTTP status code returned by the gateway.
        status: u16,
    },

    /// The circuit breaker for the operation is rejecting calls.
    #[error("Circuit breaker open for operation: {operation}")]
    CircuitBreakerOpen {
        /// Named operation whose breaker is open.
        operation: String,
    },

    /// Invalid configuration or a provisioning failure that will not heal on retry.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// The gateway answered with a status the flow does not expect.
    #[error("Unexpected HTTP {status} during {operation}: {body}")]
    UnexpectedStatus {
        /// Named operation that failed.
        operation: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Invalid response during {operation}: {message}")]
    InvalidResponse {
        /// Named operation that failed.
        operation: String,
        /// Decoding error message.
        message: String,
    },
}

impl GatewayError {
    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            operation: operation.into(),
            source,
        }
    }

    /// Create a gateway unavailable error.
    pub fn unavailable(operation: impl Into<String>, status: u16) -> Self {
        Self::GatewayUnavailable {
            operation: operation.into(),
            status,
        }
    }

    /// Create a circuit breaker open error.
    pub fn circuit_breaker_open(operation: impl Into<String>) -> Self {
        Self::CircuitBreakerOpen {
            operation: operation.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unexpected status error. Long bodies are truncated.
    pub fn unexpected_status(operation: impl Into<String>, status: u16, body: &str) -> Self {
        Self::UnexpectedStatus {
            operation: operation.into(),
            status,
            body: truncate_body(body),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Check if the error is a transient transport failure worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. })
    }

    /// Check if the error signals a broken dependency for breaker accounting.
    pub fn counts_as_failure(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Transport { .. } | Self::GatewayUnavailable { .. }
        )
    }

    /// Check if the error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if the error is a circuit breaker rejection.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitBreakerOpen { .. })
    }

    /// Get the HTTP status code if available.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::GatewayUnavailable { status, .. } | Self::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get the operation name the error was raised for.
    pub fn operation(&self) -> Option<&str> {
        match self {
            Self::Timeout { operation, .. }
            | Self::Transport { operation, .. }
            | Self::GatewayUnavailable { operation, .. }
            | Self::CircuitBreakerOpen { operation }
            | Self::UnexpectedStatus { operation, .. }
            | Self::InvalidResponse { operation, .. } => Some(operation),
            Self::Configuration { .. } => None,
        }
    }
}

const MAX_BODY_CHARS: usize = 512;

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_BODY_CHARS {
        body.to_string()
    } else {
        let mut truncated: String = body.chars().take(MAX_BODY_CHARS).collect();
        truncated.push_str("...");
        truncated
    }
}
