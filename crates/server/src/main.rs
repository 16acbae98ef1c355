//! Shelf server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use shelf_core::config::AppConfig;
use shelf_server::{create_router, AppState};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shelf - a tagged file store over a chunked blob channel
#[derive(Parser, Debug)]
#[command(name = "shelfd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SHELF_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Shelf v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("SHELF_") && key != "SHELF_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: shelfd --config /path/to/config.toml\n  \
             2. Environment variables: SHELF_SERVER__BIND=0.0.0.0:8080 \
             SHELF_TRANSPORT__TYPE=filesystem SHELF_TRANSPORT__PATH=/var/lib/shelf shelfd\n\n\
             See config/server.example.toml for example configuration.\n\
             Set SHELF_CONFIG env var to specify a default config file path."
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("SHELF_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .transport
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid transport configuration")?;

    // Initialize the transport channel
    let transport = shelf_transport::from_config(&config.transport)
        .await
        .context("failed to initialize transport")?;
    tracing::info!(backend = transport.backend_name(), "Transport initialized");

    // Verify transport connectivity before accepting requests.
    transport
        .health_check()
        .await
        .context("transport health check failed")?;
    tracing::info!("Transport connectivity verified");

    // Initialize metadata store
    let metadata = shelf_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    tracing::info!("Metadata store initialized");

    // Ensure the staging area exists
    tokio::fs::create_dir_all(&config.server.staging_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create staging directory: {}",
                config.server.staging_dir.display()
            )
        })?;

    let state = AppState::new(config.clone(), metadata, transport);
    let app = create_router(state);

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
