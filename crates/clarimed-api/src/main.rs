//! Clarimed REST API entry point.
//!
//! Binary name: `clarimed`
//!
//! Parses CLI arguments, loads configuration and credentials, wires the
//! database and services, then serves the HTTP API until Ctrl+C/SIGTERM.

mod http;
mod state;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use clarimed_infra::config::load_app_config;
use clarimed_infra::sqlite::pool::{default_data_dir, default_database_url};
use state::AppState;

#[derive(Debug, Parser)]
#[command(name = "clarimed", version, about = "Medical report chat service")]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1", env = "CLARIMED_HOST")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "CLARIMED_PORT")]
    port: u16,

    /// SQLite database URL. Defaults to a database under CLARIMED_DATA_DIR
    /// (or ~/.clarimed).
    #[arg(long, value_name = "URL", env = "CLARIMED_DATABASE_URL")]
    db: Option<String>,

    /// Path to the configuration file. A missing file runs on defaults.
    #[arg(long, default_value = "clarimed.toml", env = "CLARIMED_CONFIG")]
    config: PathBuf,

    /// Override the text-extraction sidecar base URL.
    #[arg(long, value_name = "URL", env = "CLARIMED_EXTRACTOR_URL")]
    extractor_url: Option<String>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "info,clarimed=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let mut config = load_app_config(&cli.config).await;
    if let Some(url) = cli.extractor_url {
        config.extract.base_url = url;
    }

    let db_url = match cli.db {
        Some(url) => url,
        None => {
            let data_dir = default_data_dir();
            tokio::fs::create_dir_all(&data_dir).await?;
            default_database_url()
        }
    };

    let state = AppState::init(&db_url, config).await?;

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Clarimed API listening");

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
