//! pocketlife-ingest - Telemetry ingestion service
//!
//! Accepts authenticated JSON telemetry posts on a single endpoint and stores
//! each one as a row in the table for its record kind.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pocketlife_common::config::{CliOverrides, ServiceConfig};
use pocketlife_ingest::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for pocketlife-ingest
///
/// Every option can also be set through its environment variable or the TOML
/// config file; the command line wins.
#[derive(Parser, Debug)]
#[command(name = "pocketlife-ingest")]
#[command(about = "Telemetry ingestion service for pocketlife clients")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config dir>/pocketlife/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:5780
    #[arg(short, long)]
    bind: Option<String>,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Username clients must send
    #[arg(long)]
    api_username: Option<String>,

    /// Password clients must send
    #[arg(long)]
    api_password: Option<String>,

    /// Realm announced in the Basic auth challenge
    #[arg(long)]
    realm: Option<String>,

    /// Hide database error details in 500 responses
    #[arg(long)]
    redact_errors: bool,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        CliOverrides {
            config_file: args.config,
            bind_addr: args.bind,
            database_path: args.database,
            api_username: args.api_username,
            api_password: args.api_password,
            realm: args.realm,
            redact_errors: args.redact_errors,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: the log level may come from the TOML file
    let config = ServiceConfig::resolve(&CliOverrides::from(args))
        .context("Failed to resolve configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification immediately after tracing init
    info!(
        "Starting pocketlife-ingest v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config.config_file {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file found; using command line, environment and defaults"),
    }
    if config.redact_errors {
        info!("Internal error details are redacted from responses");
    }

    info!("Database path: {}", config.database_path.display());
    let pool = pocketlife_common::db::init_database(&config.database_path)
        .await
        .context("Failed to open database")?;
    info!("✓ Connected to database");

    let state = AppState::from_config(pool.clone(), &config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("pocketlife-ingest listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
