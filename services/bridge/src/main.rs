use anyhow::{Context, Result};
use event_bridge::{
    Bridge, BridgeTiming, Config, KafkaTopicPublisher, S3BlobFetcher, SqsQueueClient,
};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    init_tracing(&config.service.log_level);

    info!(
        service = %config.service.name,
        queue = %config.queue.name,
        topic = %config.topic.qualified_name(),
        "Starting event bridge"
    );

    init_metrics(config.service.metrics_port)?;

    let publisher = Arc::new(
        KafkaTopicPublisher::new(&config.topic).context("Failed to initialize Kafka producer")?,
    );
    let blobs = Arc::new(S3BlobFetcher::new(&config.blob, &config.aws).await);

    // Blocks until the queue exists
    let queue = Arc::new(
        SqsQueueClient::connect(&config.queue, &config.aws, config.resolve_retry_interval()).await,
    );

    let bridge = Bridge::new(
        queue,
        blobs,
        publisher,
        BridgeTiming {
            wait_time: config.wait_time(),
            poll_interval: config.poll_interval(),
        },
    );

    let bridge_handle = tokio::spawn(async move { bridge.run().await });

    shutdown_signal().await;

    info!("Shutting down event bridge");
    bridge_handle.abort();
    info!("Event bridge stopped");

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();
}

/// Initialize Prometheus metrics exporter
fn init_metrics(port: u16) -> Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus metrics exporter")?;

    info!(port = port, "Prometheus metrics exporter started");

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
