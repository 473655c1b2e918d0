use anyhow::{Context, Result};
use record_processor::{
    start_api_server, AppState, Config, DynamoRecordTable, KafkaTrigger, PostgresRecordStore,
    RecordProcessor,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    init_tracing(&config.service.log_level);

    info!(
        service = %config.service.name,
        "Starting record processor"
    );

    init_metrics(config.service.metrics_port)?;

    let record_store = Arc::new(PostgresRecordStore::new(&config.database));

    if config.database.run_migrations {
        record_store
            .run_migrations()
            .await
            .context("Failed to run database migrations")?;
    }

    let record_table = Arc::new(DynamoRecordTable::new(&config.key_value).await);
    let processor = Arc::new(RecordProcessor::new(record_store, record_table));

    let trigger_handle = match config.trigger.bootstrap_servers {
        Some(ref bootstrap_servers) => {
            let trigger = KafkaTrigger::new(&config.trigger, bootstrap_servers, processor.clone())
                .context("Failed to initialize Kafka trigger")?;

            Some(tokio::spawn(async move {
                if let Err(e) = trigger.run().await {
                    error!(error = %e, "Kafka trigger error");
                }
            }))
        }
        None => {
            info!("No trigger brokers configured, serving push deliveries only");
            None
        }
    };

    let api_state = AppState { processor };
    let api_config = config.api.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = start_api_server(api_state, &api_config).await {
            error!(error = %e, "API server error");
        }
    });

    info!("Record processor started successfully");

    shutdown_signal().await;

    info!("Shutting down record processor");

    if let Some(handle) = trigger_handle {
        handle.abort();
    }
    api_handle.abort();

    info!("Record processor stopped");

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
