use crate::blob_fetcher::BlobFetcher;
use crate::error::BridgeError;
use crate::event_decoder::{self, BlobReference, Notification};
use crate::queue_client::{QueueClient, QueueMessage};
use crate::topic_publisher::{Delivery, TopicPublisher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Polling cadence of the bridge loop
#[derive(Debug, Clone, Copy)]
pub struct BridgeTiming {
    /// Long-poll wait per receive
    pub wait_time: Duration,
    /// Pause after every poll, whatever its outcome
    pub poll_interval: Duration,
}

impl Default for BridgeTiming {
    fn default() -> Self {
        Self {
            wait_time: Duration::from_secs(5),
            poll_interval: Duration::from_secs(3),
        }
    }
}

/// Result of handling one message that should be deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Payload published to the topic
    Forwarded {
        reference: BlobReference,
        size_bytes: usize,
        delivery: Delivery,
    },
    /// Synthetic test event, nothing to forward
    Ignored,
}

/// Outcome of a single poll cycle
#[derive(Debug)]
pub enum PollOutcome {
    /// Queue had nothing pending
    Empty,
    /// Message forwarded and deleted
    Forwarded {
        reference: BlobReference,
        size_bytes: usize,
    },
    /// Test event deleted without forwarding
    Ignored,
    /// Processing failed; message left on the queue for redelivery
    Abandoned(BridgeError),
    /// Receiving from the queue failed
    ReceiveFailed(BridgeError),
    /// Processing succeeded but the delete did not; the message will be redelivered
    DeleteFailed(BridgeError),
}

/// Relays queue notifications to the topic, one message at a time
pub struct Bridge {
    queue: Arc<dyn QueueClient>,
    blobs: Arc<dyn BlobFetcher>,
    publisher: Arc<dyn TopicPublisher>,
    timing: BridgeTiming,
}

impl Bridge {
    pub fn new(
        queue: Arc<dyn QueueClient>,
        blobs: Arc<dyn BlobFetcher>,
        publisher: Arc<dyn TopicPublisher>,
        timing: BridgeTiming,
    ) -> Self {
        Self {
            queue,
            blobs,
            publisher,
            timing,
        }
    }

    /// Poll forever. Per-message and receive failures are logged, never returned.
    pub async fn run(&self) {
        info!(
            wait_secs = self.timing.wait_time.as_secs(),
            interval_secs = self.timing.poll_interval.as_secs(),
            "Starting bridge loop"
        );

        loop {
            self.poll_once().await;
            tokio::time::sleep(self.timing.poll_interval).await;
        }
    }

    /// Receive at most one message, process it and delete it on success
    pub async fn poll_once(&self) -> PollOutcome {
        let message = match self.queue.receive(self.timing.wait_time).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!("No pending messages");
                return PollOutcome::Empty;
            }
            Err(e) => {
                error!(error = %e, "Failed to receive from queue");
                metrics::counter!("bridge.receive.errors").increment(1);
                return PollOutcome::ReceiveFailed(e);
            }
        };

        let disposition = match self.process_message(&message).await {
            Ok(disposition) => disposition,
            Err(e) => {
                warn!(
                    error = %e,
                    kind = ?e.kind(),
                    "Failed to relay message, leaving it for redelivery"
                );
                metrics::counter!("bridge.messages.abandoned").increment(1);
                return PollOutcome::Abandoned(e);
            }
        };

        if let Err(e) = self.queue.delete(&message.receipt_token).await {
            error!(error = %e, "Failed to delete relayed message");
            metrics::counter!("bridge.delete.errors").increment(1);
            return PollOutcome::DeleteFailed(e);
        }

        match disposition {
            Disposition::Forwarded {
                reference,
                size_bytes,
                delivery,
            } => {
                info!(
                    container = %reference.container,
                    key = %reference.key,
                    size_bytes,
                    partition = delivery.partition,
                    offset = delivery.offset,
                    "Forwarded object to topic"
                );
                metrics::counter!("bridge.messages.forwarded").increment(1);
                metrics::counter!("bridge.bytes.forwarded").increment(size_bytes as u64);
                PollOutcome::Forwarded {
                    reference,
                    size_bytes,
                }
            }
            Disposition::Ignored => {
                info!("Deleted synthetic test event");
                metrics::counter!("bridge.messages.ignored").increment(1);
                PollOutcome::Ignored
            }
        }
    }

    /// Decode, fetch and publish. Does not touch the queue.
    #[instrument(skip(self, message))]
    pub async fn process_message(&self, message: &QueueMessage) -> Result<Disposition, BridgeError> {
        let reference = match event_decoder::decode(&message.body)? {
            Notification::Test => return Ok(Disposition::Ignored),
            Notification::Object(reference) => reference,
        };

        debug!(
            container = %reference.container,
            key = %reference.key,
            "Relaying object"
        );

        let payload = self.blobs.fetch(&reference).await?;
        let delivery = self.publisher.publish(&payload).await?;

        Ok(Disposition::Forwarded {
            reference,
            size_bytes: payload.len(),
            delivery,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob_fetcher::MockBlobFetcher;
    use crate::error::ErrorKind;
    use crate::queue_client::MockQueueClient;
    use crate::topic_publisher::MockTopicPublisher;
    use bytes::Bytes;
    use mockall::predicate::eq;
    use mockall::Sequence;

    const OBJECT_BODY: &str = r#"{"Records":[{"s3":{"bucket":{"name":"b"},"object":{"key":"k"}}}]}"#;

    fn message(body: &str) -> QueueMessage {
        QueueMessage {
            body: body.to_string(),
            receipt_token: "receipt-1".to_string(),
        }
    }

    fn timing() -> BridgeTiming {
        BridgeTiming {
            wait_time: Duration::from_secs(5),
            poll_interval: Duration::from_millis(1),
        }
    }

    fn bridge(
        queue: MockQueueClient,
        blobs: MockBlobFetcher,
        publisher: MockTopicPublisher,
    ) -> Bridge {
        Bridge::new(Arc::new(queue), Arc::new(blobs), Arc::new(publisher), timing())
    }

    fn delivery() -> Delivery {
        Delivery {
            partition: 0,
            offset: 7,
        }
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let mut queue = MockQueueClient::new();
        queue.expect_receive().times(1).returning(|_| Ok(None));
        queue.expect_delete().never();

        let outcome = bridge(queue, MockBlobFetcher::new(), MockTopicPublisher::new())
            .poll_once()
            .await;

        assert!(matches!(outcome, PollOutcome::Empty));
    }

    #[tokio::test]
    async fn test_receive_uses_configured_wait() {
        let mut queue = MockQueueClient::new();
        queue
            .expect_receive()
            .with(eq(Duration::from_secs(5)))
            .times(1)
            .returning(|_| Ok(None));

        bridge(queue, MockBlobFetcher::new(), MockTopicPublisher::new())
            .poll_once()
            .await;
    }

    #[tokio::test]
    async fn test_test_event_is_deleted_without_forwarding() {
        let mut queue = MockQueueClient::new();
        queue
            .expect_receive()
            .times(1)
            .returning(|_| Ok(Some(message(r#"{"Event":"s3:TestEvent"}"#))));
        queue
            .expect_delete()
            .withf(|token| token == "receipt-1")
            .times(1)
            .returning(|_| Ok(()));

        let mut blobs = MockBlobFetcher::new();
        blobs.expect_fetch().never();
        let mut publisher = MockTopicPublisher::new();
        publisher.expect_publish().never();

        let outcome = bridge(queue, blobs, publisher).poll_once().await;

        assert!(matches!(outcome, PollOutcome::Ignored));
    }

    #[tokio::test]
    async fn test_object_is_fetched_published_then_deleted() {
        let mut seq = Sequence::new();

        let mut queue = MockQueueClient::new();
        queue
            .expect_receive()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(message(OBJECT_BODY))));

        let mut blobs = MockBlobFetcher::new();
        blobs
            .expect_fetch()
            .withf(|reference| reference.container == "b" && reference.key == "k")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Bytes::from_static(b"hello")));

        let mut publisher = MockTopicPublisher::new();
        publisher
            .expect_publish()
            .withf(|payload| payload == b"hello")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(delivery()));

        queue
            .expect_delete()
            .withf(|token| token == "receipt-1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let outcome = bridge(queue, blobs, publisher).poll_once().await;

        match outcome {
            PollOutcome::Forwarded {
                reference,
                size_bytes,
            } => {
                assert_eq!(reference.container, "b");
                assert_eq!(reference.key, "k");
                assert_eq!(size_bytes, 5);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_not_found_abandons_message() {
        let mut queue = MockQueueClient::new();
        queue
            .expect_receive()
            .times(1)
            .returning(|_| Ok(Some(message(OBJECT_BODY))));
        queue.expect_delete().never();

        let mut blobs = MockBlobFetcher::new();
        blobs.expect_fetch().times(1).returning(|reference| {
            Err(BridgeError::NotFound {
                container: reference.container.clone(),
                key: reference.key.clone(),
            })
        });

        let mut publisher = MockTopicPublisher::new();
        publisher.expect_publish().never();

        let outcome = bridge(queue, blobs, publisher).poll_once().await;

        match outcome {
            PollOutcome::Abandoned(e) => assert_eq!(e.kind(), ErrorKind::NotFound),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transient_fetch_failure_abandons_message() {
        let mut queue = MockQueueClient::new();
        queue
            .expect_receive()
            .times(1)
            .returning(|_| Ok(Some(message(OBJECT_BODY))));
        queue.expect_delete().never();

        let mut blobs = MockBlobFetcher::new();
        blobs
            .expect_fetch()
            .times(1)
            .returning(|_| Err(BridgeError::transient("fetch", "connection reset")));

        let mut publisher = MockTopicPublisher::new();
        publisher.expect_publish().never();

        let outcome = bridge(queue, blobs, publisher).poll_once().await;

        match outcome {
            PollOutcome::Abandoned(e) => assert_eq!(e.kind(), ErrorKind::TransientInfra),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_publish_failure_abandons_message() {
        let mut queue = MockQueueClient::new();
        queue
            .expect_receive()
            .times(1)
            .returning(|_| Ok(Some(message(OBJECT_BODY))));
        queue.expect_delete().never();

        let mut blobs = MockBlobFetcher::new();
        blobs
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(Bytes::from_static(b"hello")));

        let mut publisher = MockTopicPublisher::new();
        publisher
            .expect_publish()
            .times(1)
            .returning(|_| Err(BridgeError::transient("publish", "broker unavailable")));

        let outcome = bridge(queue, blobs, publisher).poll_once().await;

        match outcome {
            PollOutcome::Abandoned(e) => assert_eq!(e.kind(), ErrorKind::TransientInfra),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_abandons_and_next_poll_proceeds() {
        let mut seq = Sequence::new();

        let mut queue = MockQueueClient::new();
        queue
            .expect_receive()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(message("{not json"))));
        queue
            .expect_receive()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(message(r#"{"Event":"s3:TestEvent"}"#))));
        queue.expect_delete().times(1).returning(|_| Ok(()));

        let bridge = bridge(queue, MockBlobFetcher::new(), MockTopicPublisher::new());

        match bridge.poll_once().await {
            PollOutcome::Abandoned(e) => assert_eq!(e.kind(), ErrorKind::MalformedInput),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(matches!(bridge.poll_once().await, PollOutcome::Ignored));
    }

    #[tokio::test]
    async fn test_receive_failure_is_reported() {
        let mut queue = MockQueueClient::new();
        queue
            .expect_receive()
            .times(1)
            .returning(|_| Err(BridgeError::transient("receive", "connection refused")));

        let outcome = bridge(queue, MockBlobFetcher::new(), MockTopicPublisher::new())
            .poll_once()
            .await;

        assert!(matches!(outcome, PollOutcome::ReceiveFailed(_)));
    }

    #[tokio::test]
    async fn test_delete_failure_after_publish() {
        let mut queue = MockQueueClient::new();
        queue
            .expect_receive()
            .times(1)
            .returning(|_| Ok(Some(message(OBJECT_BODY))));
        queue
            .expect_delete()
            .times(1)
            .returning(|_| Err(BridgeError::transient("delete", "timeout")));

        let mut blobs = MockBlobFetcher::new();
        blobs
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(Bytes::from_static(b"hello")));

        let mut publisher = MockTopicPublisher::new();
        publisher.expect_publish().times(1).returning(|_| Ok(delivery()));

        let outcome = bridge(queue, blobs, publisher).poll_once().await;

        assert!(matches!(outcome, PollOutcome::DeleteFailed(_)));
    }

    #[tokio::test]
    async fn test_run_keeps_polling_after_failures() {
        let mut queue = MockQueueClient::new();
        queue
            .expect_receive()
            .returning(|_| Err(BridgeError::transient("receive", "connection refused")));

        let bridge = bridge(queue, MockBlobFetcher::new(), MockTopicPublisher::new());

        let result = tokio::time::timeout(Duration::from_millis(50), bridge.run()).await;

        assert!(result.is_err(), "run should never return on its own");
    }
}
