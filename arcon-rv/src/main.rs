//! arcon-rv (Review) - Audio reprocessing review service
//!
//! Lets operators open an edit session per artifact, mark clips or whole
//! sections for regeneration, and submit the validated retry request to the
//! reprocessing backend.

use anyhow::{Context, Result};
use arcon_common::config::{ServiceConfig, TomlConfig};
use arcon_rv::backend::BackendClient;
use arcon_rv::{build_router, AppState};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "arcon-rv")]
#[command(about = "Review service for audio reprocessing requests")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "ARCON_RV_PORT")]
    port: Option<u16>,

    /// Base URL of the reprocessing backend
    #[arg(short, long, env = "ARCON_BACKEND_URL")]
    backend_url: Option<String>,

    /// Path to config.toml (defaults to ~/.config/arcon/config.toml)
    #[arg(short, long, env = "ARCON_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = TomlConfig::load_or_default(args.config.as_deref());
    let config = ServiceConfig::resolve(args.port, args.backend_url, &toml_config);

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "arcon_rv={level},arcon_common={level},tower_http=debug",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before anything can stall
    info!(
        "Starting ARCON Review (arcon-rv) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let backend = BackendClient::from_config(&config).context("Failed to create backend client")?;
    info!("Reprocessing backend: {}", backend.update_url());
    if config.backend_token.is_none() {
        info!("No backend token configured; requests are sent without Authorization header");
    }

    let state = AppState::new(backend, config.default_priority);
    let app = build_router(state);

    let address = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("arcon-rv listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
