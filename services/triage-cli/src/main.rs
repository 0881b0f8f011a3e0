//! Triage CLI
//!
//! Drives the triage backend from a terminal:
//! 1. Loads config (CLI flags > env > `triage.toml` > defaults)
//! 2. Opens the file-backed token store
//! 3. Runs one subcommand through the authenticated client
//! 4. Prints the result as JSON on stdout; logs go to stderr

mod cli;
mod commands;
mod config;
mod metrics;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triage_auth::FileTokenStore;
use triage_client::{Account, ApiClient, SessionExpiredHandler};

use crate::cli::Cli;
use crate::config::Config;

/// A terminal has nowhere to navigate; tell the user how to recover.
struct PromptLogin;

impl SessionExpiredHandler for PromptLogin {
    fn session_expired(&self) {
        warn!("session expired, run `triage login` to sign in again");
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let prometheus = if cli.metrics {
        Some(metrics::install_recorder()?)
    } else {
        None
    };

    let config_path = Config::resolve_path(cli.config.as_deref());
    debug!(path = %config_path.display(), "loading configuration");
    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    config
        .apply_overrides(cli.api_url.clone(), cli.timeout_secs)
        .context("invalid command-line override")?;

    let token_file = config.token_file();
    let store = FileTokenStore::open(token_file.clone())
        .with_context(|| format!("failed to open token file {}", token_file.display()))?;
    debug!(
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        token_file = %token_file.display(),
        "configuration loaded"
    );

    let client = ApiClient::new(config.client_config(), Arc::new(store), Arc::new(PromptLogin))
        .context("failed to build HTTP client")?;
    let account = Account::new(client);

    let outcome = commands::run(cli.command, &account).await;

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }
    outcome
}
