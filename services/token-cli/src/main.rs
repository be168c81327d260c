//! token-cli
//!
//! Operator tool around `codekit-auth`:
//! 1. Parses the command line and loads the TOML config
//! 2. Builds a `TokenService` over a timeout-bounded reqwest client
//! 3. Runs one token command and prints the result on stdout
//!
//! Logs are JSON on stderr so stdout stays machine-readable.

mod cli;
mod config;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use codekit_auth::TokenService;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        fqdn = %config.oauth.fqdn,
        client_id = %config.oauth.client_id,
        scopes = config.oauth.scope.len(),
        timeout_secs = config.http.timeout_secs,
        "configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let service = TokenService::with_client(config.credentials(), client);
    let output = cli::execute(&service, &config.revoke_options(), cli.command).await?;
    println!("{output}");
    Ok(())
}
