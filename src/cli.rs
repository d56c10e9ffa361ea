//! CLI argument definitions and command handlers.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use issuer_config::{ConfigLoader, IssuerConfig};
use issuer_core::ConsumerSecret;
use issuer_gateway::ConsumerSecretService;
use issuer_telemetry::{init_logging, mask_secret, LogFormat, LoggingConfig};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::output::{self, CommandResult, OutputFormat};

/// Token Issuer - resolve and provision gateway consumer secrets
#[derive(Parser, Debug)]
#[command(name = "token-issuer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, env = "ISSUER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check gateway health
    Health,

    /// Fetch the signing secret of a consumer
    #[command(name = "get-secret")]
    GetSecret {
        /// External consumer id
        consumer: String,

        /// Print the secret in clear text
        #[arg(long)]
        show_secret: bool,
    },

    /// Provision a new signing secret for a consumer
    #[command(name = "create-secret")]
    CreateSecret {
        /// External consumer id
        consumer: String,

        /// Print the secret in clear text
        #[arg(long)]
        show_secret: bool,
    },

    /// Validate configuration without contacting the gateway
    Validate,
}

impl Commands {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::GetSecret { .. } => "get-secret",
            Self::CreateSecret { .. } => "create-secret",
            Self::Validate => "validate",
        }
    }
}

/// Secret as printed by the CLI.
#[derive(Debug, Serialize)]
struct SecretOutput {
    consumer: String,
    credential_id: String,
    key: String,
    secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    gateway_consumer_id: Option<String>,
}

impl SecretOutput {
    fn new(consumer: &str, secret: ConsumerSecret, show_secret: bool) -> Self {
        let gateway_consumer_id = secret.consumer_id().map(str::to_string);
        Self {
            consumer: consumer.to_string(),
            credential_id: secret.id,
            key: secret.key,
            secret: if show_secret {
                secret.secret
            } else {
                mask_secret(&secret.secret)
            },
            gateway_consumer_id,
        }
    }
}

/// Validation summary.
#[derive(Debug, Serialize)]
struct ValidationOutput {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Cli {
    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        let format = OutputFormat::from_json_flag(self.json);
        let loaded = self.loader().load();

        if let Commands::Validate = self.command {
            return validate(loaded, format);
        }

        let config = loaded.context("Failed to load configuration")?;
        self.init_tracing(&config)?;
        info!(command = self.command.name(), mode = %config.gateway.mode, "Running command");

        let service = ConsumerSecretService::from_config(&config)
            .context("Failed to initialize consumer secret service")?;
        debug!("Consumer secret service ready");

        match self.command {
            Commands::Health => health(&service, format).await,
            Commands::GetSecret {
                consumer,
                show_secret,
            } => {
                let secret = service.get_consumer_secret(&consumer).await?;
                info!(consumer = %consumer, found = secret.is_some(), "Secret lookup finished");
                print_secret(&consumer, secret, show_secret, format)
            }
            Commands::CreateSecret {
                consumer,
                show_secret,
            } => {
                let secret = service.create_consumer_secret(&consumer).await?;
                info!(consumer = %consumer, created = secret.is_some(), "Secret creation finished");
                print_secret(&consumer, secret, show_secret, format)
            }
            Commands::Validate => Ok(()),
        }
    }

    fn loader(&self) -> ConfigLoader {
        match &self.config {
            Some(path) => ConfigLoader::new().with_file(path.clone()),
            None => ConfigLoader::new(),
        }
    }

    /// Verbosity flags win over the configured level.
    fn init_tracing(&self, config: &IssuerConfig) -> Result<()> {
        let level = match self.verbose {
            0 => config.logging.level.clone(),
            1 => "info".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        };
        let format = if self.json {
            LogFormat::Json
        } else {
            config.logging.format
        };

        init_logging(
            &LoggingConfig::new(level)
                .with_format(format)
                .with_target(self.verbose > 1),
        )?;
        Ok(())
    }
}

async fn health(service: &ConsumerSecretService, format: OutputFormat) -> Result<()> {
    let result = service.health_check().await;
    info!(
        healthy = result.healthy,
        response_time_ms = result.response_time_ms,
        "Health check finished"
    );

    match format {
        OutputFormat::Json => output::json(&result)?,
        OutputFormat::Text => {
            if result.healthy {
                output::success("Gateway is healthy");
            } else {
                output::error("Gateway is unhealthy");
            }
            output::key_value("Mode", &service.mode().to_string());
            output::key_value("Response Time", &format!("{}ms", result.response_time_ms));
            if let Some(error) = &result.error {
                output::key_value("Error", error);
            }

            output::section("Circuit Breakers");
            for (name, snapshot) in service.get_circuit_breaker_stats() {
                output::status(&format!("{name} ({})", snapshot.state), snapshot.failure_count == 0);
            }
        }
    }

    if !result.healthy {
        bail!("Gateway health check failed");
    }
    Ok(())
}

fn print_secret(
    consumer: &str,
    secret: Option<ConsumerSecret>,
    show_secret: bool,
    format: OutputFormat,
) -> Result<()> {
    let Some(secret) = secret else {
        match format {
            OutputFormat::Json => {
                output::json(&CommandResult::<()>::failure(format!("Consumer not found: {consumer}")))?;
            }
            OutputFormat::Text => output::warning(&format!("No secret found for consumer '{consumer}'")),
        }
        bail!("Consumer not found: {consumer}");
    };

    let view = SecretOutput::new(consumer, secret, show_secret);
    match format {
        OutputFormat::Json => output::json(&CommandResult::success(view))?,
        OutputFormat::Text => {
            output::success(&format!("Secret for consumer '{consumer}'"));
            output::key_value("Credential", &view.credential_id);
            output::key_value("Key", &view.key);
            output::key_value("Secret", &view.secret);
            if let Some(id) = &view.gateway_consumer_id {
                output::key_value("Gateway Consumer", id);
            }
        }
    }
    Ok(())
}

fn validate(loaded: issuer_config::Result<IssuerConfig>, format: OutputFormat) -> Result<()> {
    let summary = match &loaded {
        Ok(config) => ValidationOutput {
            valid: true,
            mode: Some(config.gateway.mode.to_string()),
            base_url: config.gateway.base_url().map(str::to_string),
            error: None,
        },
        Err(e) => ValidationOutput {
            valid: false,
            mode: None,
            base_url: None,
            error: Some(e.to_string()),
        },
    };

    match format {
        OutputFormat::Json => output::json(&summary)?,
        OutputFormat::Text => {
            if summary.valid {
                output::success("Configuration is valid");
                if let Some(mode) = &summary.mode {
                    output::key_value("Mode", mode);
                }
                if let Some(url) = &summary.base_url {
                    output::key_value("Gateway URL", url);
                }
            } else if let Some(error) = &summary.error {
                output::error(error);
            }
        }
    }

    if let Err(e) = loaded {
        return Err(e).context("Configuration is invalid");
    }
    Ok(())
}
