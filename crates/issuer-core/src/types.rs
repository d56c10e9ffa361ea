//! Consumer, credential and health types exchanged with the gateway.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which flavor of gateway administrative API the issuer talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    /// Self-hosted admin API, consumer ids used verbatim.
    #[default]
    Admin,
    /// Multi-tenant cloud control-plane API.
    Cloud,
}

impl fmt::Display for GatewayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Cloud => write!(f, "cloud"),
        }
    }
}

impl FromStr for GatewayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" | "api" | "direct" => Ok(Self::Admin),
            "cloud" | "konnect" => Ok(Self::Cloud),
            other => Err(format!("unknown gateway mode '{other}' (expected 'admin' or 'cloud')")),
        }
    }
}

/// A consumer record as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    /// Internal gateway identifier (UUID).
    pub id: String,
    /// Human-readable username.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional caller-assigned identifier.
    #[serde(default)]
    pub custom_id: Option<String>,
}

/// Reference to the consumer that owns a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerRef {
    /// Internal gateway identifier of the consumer.
    pub id: String,
}

/// A JWT credential bound to a consumer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerSecret {
    /// Credential identifier at the gateway.
    pub id: String,
    /// Public key claim (`iss`) of the credential.
    pub key: String,
    /// Signing secret.
    pub secret: String,
    /// Owning consumer.
    #[serde(default)]
    pub consumer: Option<ConsumerRef>,
}

impl ConsumerSecret {
    /// Internal id of the owning consumer, if the gateway reported it.
    pub fn consumer_id(&self) -> Option<&str> {
        self.consumer.as_ref().map(|c| c.id.as_str())
    }
}

impl fmt::Debug for ConsumerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerSecret")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .field("consumer", &self.consumer)
            .finish()
    }
}

/// Credential list returned by `GET .../consumers/{id}/jwt`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialList {
    /// Credentials, in gateway order. A `null` list decodes as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<ConsumerSecret>,
    /// Total count reported by the gateway.
    #[serde(default)]
    pub total: Option<u64>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CredentialList {
    /// The credential this system operates on: always the first entry.
    pub fn into_first(self) -> Option<ConsumerSecret> {
        self.data.into_iter().next()
    }
}

/// Request body for provisioning a credential.
#[derive(Clone, Serialize, Deserialize)]
pub struct NewCredential {
    /// Public key claim.
    pub key: String,
    /// Signing secret.
    pub secret: String,
}

impl fmt::Debug for NewCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewCredential")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Outcome of a gateway health check. Never an error: failures are described in `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Whether the gateway answered with a 2xx status.
    pub healthy: bool,
    /// Wall-clock time spent on the check.
    pub response_time_ms: u64,
    /// Failure description when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthCheckResult {
    /// Healthy check result.
    pub fn healthy(response_time_ms: u64) -> Self {
        Self {
            healthy: true,
            response_time_ms,
            error: None,
        }
    }

    /// Unhealthy check result with a reason.
    pub fn unhealthy(response_time_ms: u64, error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            response_time_ms,
            error: Some(error.into()),
        }
    }
}
