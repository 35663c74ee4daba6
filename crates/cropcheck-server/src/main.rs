//! CropCheck Server
//!
//! Plant disease advisory service: classifies uploaded leaf images and
//! returns treatment guidance with optional pesticide dosage estimates.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing::{error, info, warn};

use cropcheck_server::{create_router, AppState, Cli, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    info!("Starting CropCheck server");

    let config = ServerConfig::load(&cli)?;
    info!("Configuration loaded from {}", cli.config.display());
    match &config.model {
        Some(model) => info!("Model: {}", model.to_model_config().describe_source()),
        None => warn!("No model configured"),
    }

    let metrics_handle = init_metrics()?;

    let state = AppState::from_config(&config)?.with_metrics(metrics_handle);
    info!("Application state initialized successfully");

    let addr = config.bind_address()?;
    let app = create_router(state, &config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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

    warn!("Shutdown signal received, stopping server...");
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("cropcheck=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cropcheck=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "cropcheck_requests_total",
        "Total number of requests by endpoint"
    );
    metrics::describe_counter!("cropcheck_errors_total", "Total number of errors by kind");
    metrics::describe_histogram!(
        "cropcheck_inference_latency_us",
        metrics::Unit::Microseconds,
        "Classifier latency in microseconds, including queueing"
    );
    metrics::describe_counter!(
        "cropcheck_knowledge_fallbacks_total",
        "Lookups answered with a synthesized disease record"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
