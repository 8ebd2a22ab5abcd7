//! ReviewSense Server
//!
//! Loads the trained artifact set once at startup and serves sentiment
//! predictions over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use reviewsense_server::{create_router, AppState, Cli, ServerConfig};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    info!("Starting ReviewSense server");

    // Load configuration
    let config = ServerConfig::load(&cli.config, &cli)?;
    info!("Configuration loaded successfully");
    info!("Artifacts: {}", config.artifacts_dir.display());
    info!("Dataset: {}", config.dataset_path.display());
    info!("Allowed origins: {:?}", config.allowed_origins);

    // Initialize metrics
    let metrics_handle = init_metrics()?;

    // Refuse to serve without a consistent artifact set
    let addr: SocketAddr = format!("{}:{}", config.listen, config.port).parse()?;
    let state = AppState::from_config(config, metrics_handle)
        .context("Failed to load the artifact set")?;
    info!("Artifact set loaded successfully");

    if state.config.load_on_startup {
        let loader = state.clone();
        let summary = tokio::task::spawn_blocking(move || loader.load_dataset()).await??;
        info!("Loaded {} reviews on startup", summary.rows_processed);
    }

    let stats = state.sentiment_stats();
    info!("Sentiment stats: {:?}", stats);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    // Graceful shutdown handler
    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("reviewsense=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reviewsense=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "reviewsense_requests_total",
        "Total number of requests processed by route"
    );
    metrics::describe_counter!(
        "reviewsense_predictions_total",
        "Total number of sentiment predictions by label"
    );
    metrics::describe_histogram!(
        "reviewsense_inference_latency_us",
        metrics::Unit::Microseconds,
        "Inference latency in microseconds"
    );
    metrics::describe_counter!("reviewsense_errors_total", "Total number of errors by type");

    info!("Metrics exporter initialized");
    Ok(handle)
}
