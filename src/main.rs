//! # Token Issuer
//!
//! Operator CLI for the gateway consumer-secret resolution engine.
//!
//! ## Usage
//!
//! ```bash
//! # Check the configured gateway
//! token-issuer --config issuer.yaml health
//!
//! # Look up or provision a consumer's signing secret
//! token-issuer get-secret alice
//! token-issuer create-secret alice --show-secret
//!
//! # Environment overrides
//! ISSUER_GATEWAY_MODE=cloud ISSUER_CONTROL_PLANE_URL=... token-issuer health
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;
mod output;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    cli.execute().await
}
