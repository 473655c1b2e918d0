//! Kafka publisher for forwarded payloads.

use crate::config::TopicConfig;
use crate::error::BridgeError;
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Where a published payload landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
}

/// Publishes opaque payloads to a fixed topic
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    async fn publish(&self, payload: &[u8]) -> Result<Delivery, BridgeError>;
}

/// Kafka producer bound to a single topic
pub struct KafkaTopicPublisher {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl KafkaTopicPublisher {
    /// Create a new producer for the configured topic
    pub fn new(config: &TopicConfig) -> Result<Self, BridgeError> {
        let topic = config.qualified_name();

        info!(
            bootstrap_servers = %config.bootstrap_servers,
            topic = %topic,
            "Creating Kafka producer"
        );

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("request.timeout.ms", config.request_timeout_ms.to_string())
            .create()
            .map_err(|e| BridgeError::transient("create producer", e.to_string()))?;

        Ok(Self {
            producer,
            topic,
            timeout: config.request_timeout(),
        })
    }

    /// Flush all pending messages
    pub fn flush(&self, timeout: Duration) -> Result<(), BridgeError> {
        self.producer
            .flush(Timeout::After(timeout))
            .map_err(|e| BridgeError::transient("flush", e.to_string()))
    }
}

#[async_trait]
impl TopicPublisher for KafkaTopicPublisher {
    #[instrument(skip(self, payload), fields(topic = %self.topic, size_bytes = payload.len()))]
    async fn publish(&self, payload: &[u8]) -> Result<Delivery, BridgeError> {
        let record: FutureRecord<'_, (), [u8]> = FutureRecord::to(&self.topic).payload(payload);

        let (partition, offset) = self
            .producer
            .send(record, Timeout::After(self.timeout))
            .await
            .map_err(|(e, _)| BridgeError::transient("publish", e.to_string()))?;

        debug!(partition, offset, "Payload delivered");

        Ok(Delivery { partition, offset })
    }
}

impl Drop for KafkaTopicPublisher {
    fn drop(&mut self) {
        if let Err(e) = self.flush(Duration::from_secs(5)) {
            warn!(error = %e, "Failed to flush producer on shutdown");
        }
    }
}
