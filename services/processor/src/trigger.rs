use crate::config::TriggerConfig;
use crate::processor::RecordProcessor;
use anyhow::{Context, Result};
use futures::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Kafka consumer that invokes the processor once per message on the bridge topic
pub struct KafkaTrigger {
    consumer: StreamConsumer,
    processor: Arc<RecordProcessor>,
}

impl KafkaTrigger {
    /// Create a consumer subscribed to the bridge topic
    pub fn new(
        config: &TriggerConfig,
        bootstrap_servers: &str,
        processor: Arc<RecordProcessor>,
    ) -> Result<Self> {
        let topic = config
            .qualified_topic()
            .context("trigger.topic_project must be set to consume the bridge topic")?;

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .set("group.id", &config.consumer_group)
            .set("auto.offset.reset", &config.auto_offset_reset)
            .set("enable.auto.commit", "false")
            .create()
            .context("Failed to create Kafka consumer")?;

        consumer
            .subscribe(&[&topic])
            .context("Failed to subscribe to bridge topic")?;

        info!(
            topic = %topic,
            group = %config.consumer_group,
            "Subscribed to Kafka topic"
        );

        Ok(Self {
            consumer,
            processor,
        })
    }

    /// Start consuming and processing messages
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<()> {
        info!("Starting Kafka trigger");

        let mut message_stream = self.consumer.stream();

        while let Some(message_result) = message_stream.next().await {
            match message_result {
                Ok(message) => {
                    self.invoke(&message).await;
                    if let Err(e) = self.consumer.commit_message(&message, CommitMode::Async) {
                        warn!(error = %e, "Failed to commit offset");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Kafka consumer error");
                }
            }
        }

        Ok(())
    }

    /// Sink failures are reported inside the processor, so every invocation is
    /// committed. Malformed payloads are committed too: they would fail
    /// identically on every redelivery.
    #[instrument(skip(self, message), fields(partition = message.partition(), offset = message.offset()))]
    async fn invoke(&self, message: &BorrowedMessage<'_>) {
        let payload = message.payload().unwrap_or_default();
        debug!(size_bytes = payload.len(), "Invoking processor");

        if let Err(e) = self.processor.process(payload).await {
            error!(error = %e, "Rejected malformed payload");
        }
    }
}
