use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pelios_dashboard::config::Config;
use pelios_dashboard::AppState;

#[derive(Parser, Debug)]
#[command(name = "pelios-dashboard")]
#[command(author, version, about = "Projects dashboard for the Pelios video analysis API", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "pelios.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Origin of the Pelios API
    #[arg(long, env = "PELIOS_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Mark session cookies Secure
    #[arg(long, env = "PELIOS_PRODUCTION")]
    production: bool,

    /// Override listen port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(&cli.config)?;
    if let Some(url) = cli.api_base_url {
        config.api.base_url = Some(url);
    }
    if cli.production {
        config.session.production = true;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Pelios dashboard v{}", env!("CARGO_PKG_VERSION"));

    config.describe(&cli.config);
    if !config.session.production {
        tracing::info!("Development mode: session cookies are not marked Secure");
    }

    let state = Arc::new(AppState::new(config.clone()).context("Failed to build HTTP client")?);
    let app = pelios_dashboard::api::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Dashboard listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
