//! mm-pipeline - Math Mentor agent pipeline service
//!
//! Runs the parse → route → solve → verify → explain pipeline behind an
//! HTTP REST + SSE interface. Recognition and solving are delegated to the
//! hosted gateway functions configured under `[gateway]`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mm_common::config;
use mm_common::events::EventBus;
use mm_pipeline::gateways::{AsrClient, GatewayHttp, OcrClient, SolverClient};
use mm_pipeline::{AppState, Gateways, PipelineOrchestrator, PipelineSettings};

/// Command-line arguments for mm-pipeline
#[derive(Parser, Debug)]
#[command(name = "mm-pipeline")]
#[command(about = "Math Mentor agent pipeline service")]
#[command(version)]
struct Args {
    /// Path to the TOML config file (falls back to MM_CONFIG, then the
    /// platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides server.bind_address)
    #[arg(short, long, env = "MM_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing exists so the configured level can seed
    // the filter; the outcome is logged once the subscriber is up.
    let config_path = config::resolve_config_path(args.config.as_deref());
    let toml_config =
        config::load_config(args.config.as_deref()).context("Failed to load configuration")?;

    let level = &toml_config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("mm_pipeline={0},mm_common={0},tower_http={0}", level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting mm-pipeline (Math Mentor) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    match config_path.filter(|p| p.exists()) {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: compiled defaults"),
    }

    // Gateways
    let base_url = config::resolve_gateway_base_url(&toml_config);
    let api_key = config::resolve_gateway_api_key(&toml_config);
    let http = GatewayHttp::new(
        base_url,
        api_key,
        Duration::from_secs(toml_config.gateway.timeout_secs),
    );
    info!("Gateway base URL: {}", http.base_url());

    let gateways = Gateways {
        ocr: Arc::new(OcrClient::new(http.clone())),
        asr: Arc::new(AsrClient::new(http.clone())),
        solver: Arc::new(SolverClient::new(http)),
    };

    let event_bus = EventBus::new(toml_config.pipeline.event_capacity);
    info!("Event bus initialized (capacity {})", event_bus.capacity());

    let orchestrator = PipelineOrchestrator::new(
        gateways,
        event_bus,
        PipelineSettings::from(&toml_config.pipeline),
    );

    let app = mm_pipeline::build_router(AppState::new(orchestrator));

    let bind_address = args.bind.unwrap_or(toml_config.server.bind_address);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

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
