use crate::aws::load_sdk_config;
use crate::config::{AwsConfig, QueueConfig, MAX_WAIT_TIME_SECS};
use crate::error::BridgeError;
use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::Client as SqsClient;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// A message received from the queue, owned until deleted or abandoned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Raw message body
    pub body: String,
    /// Opaque handle used to delete the message
    pub receipt_token: String,
}

/// Receive/delete operations against an already-resolved queue
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Poll for at most one message, waiting up to `wait`
    async fn receive(&self, wait: Duration) -> Result<Option<QueueMessage>, BridgeError>;

    /// Delete a message by its receipt token
    async fn delete(&self, receipt_token: &str) -> Result<(), BridgeError>;
}

/// Resolves a queue name into the address used for receive/delete
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueDirectory: Send + Sync {
    async fn queue_address(&self, name: &str) -> Result<String, BridgeError>;
}

/// Resolve `name`, retrying forever with a fixed pause.
///
/// The queue may not exist yet when the process starts; there is nothing
/// useful to do until it does, so this only returns on success.
pub async fn resolve_queue_address<D>(directory: &D, name: &str, retry_interval: Duration) -> String
where
    D: QueueDirectory + ?Sized,
{
    let mut attempts = 0u64;

    loop {
        attempts += 1;

        match directory.queue_address(name).await {
            Ok(address) => {
                info!(queue = %name, address = %address, attempts, "Resolved queue address");
                return address;
            }
            Err(e) => {
                warn!(
                    queue = %name,
                    attempt = attempts,
                    delay_ms = retry_interval.as_millis() as u64,
                    error = %e,
                    "Queue not available yet, retrying"
                );
                tokio::time::sleep(retry_interval).await;
            }
        }
    }
}

/// SQS-backed queue client
pub struct SqsQueueClient {
    client: SqsClient,
    queue_url: String,
}

impl SqsQueueClient {
    /// Build an SQS client for the configured region and endpoint
    pub async fn build_client(config: &QueueConfig, aws: &AwsConfig) -> SqsClient {
        let sdk_config = load_sdk_config(&config.region, aws).await;
        let mut builder = aws_sdk_sqs::config::Builder::from(&sdk_config);

        if let Some(ref endpoint_url) = config.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }

        SqsClient::from_conf(builder.build())
    }

    /// Resolve the queue URL (blocking until the queue exists) and bind to it
    pub async fn connect(config: &QueueConfig, aws: &AwsConfig, retry_interval: Duration) -> Self {
        let client = Self::build_client(config, aws).await;
        let directory = SqsDirectory::new(client.clone());
        let queue_url = resolve_queue_address(&directory, &config.name, retry_interval).await;

        Self { client, queue_url }
    }
}

/// Long-poll wait in whole seconds, rejecting values SQS would refuse
fn wait_time_seconds(wait: Duration) -> Result<i32, BridgeError> {
    let secs = wait.as_secs();
    if secs > MAX_WAIT_TIME_SECS {
        return Err(BridgeError::transient(
            "receive",
            format!("wait time {secs}s exceeds {MAX_WAIT_TIME_SECS}s"),
        ));
    }

    i32::try_from(secs).map_err(|e| BridgeError::transient("receive", e.to_string()))
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    #[instrument(skip(self), fields(queue_url = %self.queue_url))]
    async fn receive(&self, wait: Duration) -> Result<Option<QueueMessage>, BridgeError> {
        let wait_time_seconds = wait_time_seconds(wait)?;

        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(1)
            .wait_time_seconds(wait_time_seconds)
            .send()
            .await
            .map_err(|e| BridgeError::transient("receive", DisplayErrorContext(&e).to_string()))?;

        let Some(message) = output.messages().first() else {
            return Ok(None);
        };

        let receipt_token = message
            .receipt_handle()
            .ok_or_else(|| BridgeError::transient("receive", "message without receipt handle"))?
            .to_string();

        debug!(message_id = ?message.message_id(), "Received queue message");

        Ok(Some(QueueMessage {
            body: message.body().unwrap_or_default().to_string(),
            receipt_token,
        }))
    }

    #[instrument(skip(self, receipt_token), fields(queue_url = %self.queue_url))]
    async fn delete(&self, receipt_token: &str) -> Result<(), BridgeError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_token)
            .send()
            .await
            .map_err(|e| BridgeError::transient("delete", DisplayErrorContext(&e).to_string()))?;

        debug!("Deleted queue message");
        Ok(())
    }
}

/// Queue name lookup through `GetQueueUrl`
pub struct SqsDirectory {
    client: SqsClient,
}

impl SqsDirectory {
    pub fn new(client: SqsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueueDirectory for SqsDirectory {
    async fn queue_address(&self, name: &str) -> Result<String, BridgeError> {
        let output = self
            .client
            .get_queue_url()
            .queue_name(name)
            .send()
            .await
            .map_err(|e| {
                BridgeError::transient("resolve queue", DisplayErrorContext(&e).to_string())
            })?;

        output
            .queue_url()
            .map(String::from)
            .ok_or_else(|| BridgeError::transient("resolve queue", "response without queue URL"))
    }
}
