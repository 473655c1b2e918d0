use serde::Deserialize;

/// Main configuration for the record processor
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// PostgreSQL configuration
    pub database: DatabaseConfig,
    /// DynamoDB configuration
    pub key_value: KeyValueConfig,
    /// Kafka trigger configuration
    #[serde(default)]
    pub trigger: TriggerConfig,
    /// Push endpoint configuration
    #[serde(default)]
    pub api: ApiConfig,
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

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Host name or instance address
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    /// Database name
    pub name: String,
    pub user: String,
    pub password: String,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Run migrations on startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

/// DynamoDB configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KeyValueConfig {
    /// Endpoint URL (DynamoDB Local, LocalStack, or the regional endpoint)
    pub endpoint_url: String,
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Table name
    #[serde(default = "default_table")]
    pub table: String,
    /// Static credentials for non-production deployments
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// Kafka trigger configuration; disabled when no brokers are set
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerConfig {
    /// Kafka bootstrap servers
    pub bootstrap_servers: Option<String>,
    /// Consumer group ID
    #[serde(default = "default_consumer_group")]
    pub consumer_group: String,
    /// Project namespace of the bridge topic; required when brokers are set
    pub topic_project: Option<String>,
    /// Topic name within the project
    #[serde(default = "default_topic_name")]
    pub topic_name: String,
    /// Auto offset reset policy
    #[serde(default = "default_auto_offset_reset")]
    pub auto_offset_reset: String,
}

/// HTTP push endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

// Default value functions
fn default_service_name() -> String {
    "record-processor".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9091
}

fn default_db_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    0
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_run_migrations() -> bool {
    true
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_table() -> String {
    "processed-records".to_string()
}

fn default_consumer_group() -> String {
    "record-processor".to_string()
}

fn default_topic_name() -> String {
    "localstack-events".to_string()
}

fn default_auto_offset_reset() -> String {
    "earliest".to_string()
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/processor").required(false))
            .add_source(config::File::with_name("/etc/relay/processor").required(false))
            // PROCESSOR__DATABASE__HOST -> database.host
            .add_source(
                config::Environment::with_prefix("PROCESSOR")
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
        if self.trigger.bootstrap_servers.is_some() && self.trigger.qualified_topic().is_none() {
            return Err(ConfigValidationError::MissingField(
                "trigger.topic_project (required when trigger.bootstrap_servers is set)"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

impl TriggerConfig {
    /// Topic the bridge publishes to, e.g. `my-project.localstack-events`.
    /// `None` until a project is configured.
    pub fn qualified_topic(&self) -> Option<String> {
        self.topic_project
            .as_deref()
            .filter(|project| !project.is_empty())
            .map(|project| format!("{}.{}", project, self.topic_name))
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),
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

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> serde_json::Value {
        serde_json::json!({
            "database": {
                "host": "localhost",
                "name": "records",
                "user": "postgres",
                "password": "postgres"
            },
            "key_value": { "endpoint_url": "http://localhost:4566" }
        })
    }

    #[test]
    fn test_default_values() {
        let config: Config = serde_json::from_value(minimal()).unwrap();

        assert_eq!(config.database.port, 5432);
        assert_eq!(config.key_value.table, "processed-records");
        assert_eq!(config.key_value.region, "us-east-1");
        assert!(config.trigger.bootstrap_servers.is_none());
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.database.connect_timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_password_is_rejected() {
        let mut value = minimal();
        value["database"]
            .as_object_mut()
            .unwrap()
            .remove("password");

        assert!(serde_json::from_value::<Config>(value).is_err());
    }

    #[test]
    fn test_qualified_topic() {
        let mut value = minimal();
        value["trigger"] = serde_json::json!({
            "bootstrap_servers": "kafka:9092",
            "topic_project": "demo"
        });

        let config: Config = serde_json::from_value(value).unwrap();
        assert_eq!(
            config.trigger.qualified_topic().as_deref(),
            Some("demo.localstack-events")
        );
        assert_eq!(config.trigger.consumer_group, "record-processor");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_trigger_without_project_is_rejected() {
        let mut value = minimal();
        value["trigger"] = serde_json::json!({ "bootstrap_servers": "kafka:9092" });

        let config: Config = serde_json::from_value(value).unwrap();
        assert!(config.trigger.qualified_topic().is_none());

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("trigger.topic_project"));
    }

    #[test]
    fn test_empty_project_is_rejected() {
        let mut value = minimal();
        value["trigger"] = serde_json::json!({
            "bootstrap_servers": "kafka:9092",
            "topic_project": ""
        });

        let config: Config = serde_json::from_value(value).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_project_not_needed_without_brokers() {
        let config: Config = serde_json::from_value(minimal()).unwrap();
        assert!(config.trigger.qualified_topic().is_none());
        assert!(config.validate().is_ok());
    }
}
