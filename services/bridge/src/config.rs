use serde::Deserialize;
use std::time::Duration;

/// Main configuration for the bridge service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// Source queue configuration
    pub queue: QueueConfig,
    /// Blob store configuration
    #[serde(default)]
    pub blob: BlobConfig,
    /// Destination topic configuration
    pub topic: TopicConfig,
    /// Static AWS credentials (LocalStack and other test deployments)
    #[serde(default)]
    pub aws: AwsConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// SQS queue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Queue name, resolved to a URL at startup
    pub name: String,
    /// Custom endpoint URL (for LocalStack, ElasticMQ, etc.)
    pub endpoint_url: Option<String>,
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Long-poll wait per receive in seconds
    #[serde(default = "default_wait_time_secs")]
    pub wait_time_secs: u64,
    /// Pause between polls in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Pause between queue URL resolution attempts in seconds
    #[serde(default = "default_resolve_retry_secs")]
    pub resolve_retry_secs: u64,
}

/// S3 blob store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BlobConfig {
    /// Custom endpoint URL (for MinIO, LocalStack, etc.)
    pub endpoint_url: Option<String>,
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Force path-style access (required for MinIO and LocalStack)
    #[serde(default)]
    pub force_path_style: bool,
}

/// Kafka topic configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TopicConfig {
    /// Project namespace, prefixed to the topic name
    pub project: String,
    /// Topic name within the project
    #[serde(default = "default_topic_name")]
    pub name: String,
    /// Kafka bootstrap servers
    pub bootstrap_servers: String,
    /// Client ID for the producer
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Delivery timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Optional static credentials shared by the SQS and S3 clients
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwsConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// Longest long-poll wait SQS accepts per receive
pub const MAX_WAIT_TIME_SECS: u64 = 20;

// Default value functions
fn default_service_name() -> String {
    "event-bridge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_wait_time_secs() -> u64 {
    5
}

fn default_poll_interval_secs() -> u64 {
    3
}

fn default_resolve_retry_secs() -> u64 {
    3
}

fn default_topic_name() -> String {
    "localstack-events".to_string()
}

fn default_client_id() -> String {
    "event-bridge".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/bridge").required(false))
            .add_source(config::File::with_name("/etc/relay/bridge").required(false))
            // BRIDGE__QUEUE__NAME -> queue.name
            .add_source(
                config::Environment::with_prefix("BRIDGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.queue.wait_time_secs > MAX_WAIT_TIME_SECS {
            return Err(ConfigValidationError::InvalidValue {
                field: "queue.wait_time_secs".to_string(),
                message: format!("must be at most {MAX_WAIT_TIME_SECS}"),
            });
        }

        if self.topic.project.is_empty() {
            return Err(ConfigValidationError::MissingField(
                "topic.project".to_string(),
            ));
        }

        Ok(())
    }

    /// Long-poll wait per receive as Duration
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.queue.wait_time_secs)
    }

    /// Pause between polls as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.queue.poll_interval_secs)
    }

    /// Pause between queue resolution attempts as Duration
    pub fn resolve_retry_interval(&self) -> Duration {
        Duration::from_secs(self.queue.resolve_retry_secs)
    }
}

impl TopicConfig {
    /// Fully qualified topic, e.g. `my-project.localstack-events`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.project, self.name)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            region: default_region(),
            force_path_style: false,
        }
    }
}
