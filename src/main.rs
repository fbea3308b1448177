use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use brocante::config::Config;
use brocante::media::ImageStore;
use brocante::AppState;

#[derive(Parser, Debug)]
#[command(name = "brocante")]
#[command(author, version, about = "Catalog and contact backend for a small antiques shop", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "brocante.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

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

    tracing::info!("Starting Brocante v{}", env!("CARGO_PKG_VERSION"));
    if cli.config.exists() {
        tracing::info!("Loaded configuration from {}", cli.config.display());
    } else {
        tracing::info!("No config file at {}, using defaults", cli.config.display());
    }

    // Ensure data directory exists
    std::fs::create_dir_all(&config.server.data_dir)?;

    // Initialize database
    let db = brocante::db::init(&config.server.data_dir).await?;

    // Ensure the bootstrap admin account exists
    brocante::api::auth::ensure_admin_user(
        &db,
        &config.auth.bootstrap_email,
        &config.auth.bootstrap_password,
    )
    .await?;

    if config.auth.allowed_admin_emails.is_empty() {
        tracing::warn!("Admin allow-list is empty; nobody can manage the catalog");
    }

    // Object storage for uploaded images; absent config disables that mode
    let images = ImageStore::from_config(&config.storage).await;
    if images.is_none() {
        tracing::warn!("Image storage not configured, direct uploads disabled");
    }

    let state = Arc::new(AppState::new(config.clone(), db, images));

    // One-time session check, racing with live auth events; the access gate
    // applies whichever resolves last
    tokio::spawn(brocante::api::auth::startup_session_sweep(state.clone()));

    // Create API router
    let api_router = brocante::api::create_router(state);

    // Serve the public site with an SPA fallback
    let index_file = config.server.public_dir.join("index.html");
    let serve_static =
        ServeDir::new(&config.server.public_dir).not_found_service(ServeFile::new(&index_file));

    let app = axum::Router::new()
        .merge(api_router)
        .fallback_service(serve_static);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);

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
