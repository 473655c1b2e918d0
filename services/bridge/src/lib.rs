//! Event Bridge
//!
//! Relays object-created notifications from an SQS queue to a Kafka topic.
//! Each notification names an S3 object; the bridge fetches that object and
//! publishes its bytes, unmodified, to the topic. The source message is deleted
//! only after the publish is acknowledged, giving at-least-once delivery.
//!
//! ## Architecture
//!
//! ```text
//! SQS Queue            Event Decoder        S3 Bucket           Kafka Topic
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ notification │───▶│ test event?  │───▶│ GetObject    │───▶│ {project}.   │
//! │ messages     │    │ first record │    │ bucket/key   │    │ {name}       │
//! └──────────────┘    └──────────────┘    └──────────────┘    └──────────────┘
//!        ▲                   │                                       │
//!        │                   │ test event                            │ ack
//!        │                   ▼                                       │
//!        │            ┌──────────────┐                               │
//!        └────────────│ DeleteMessage│◀──────────────────────────────┘
//!                     └──────────────┘
//! ```
//!
//! Failures while decoding, fetching or publishing leave the message on the
//! queue; its visibility timeout expires and it is delivered again.

pub mod aws;
pub mod blob_fetcher;
pub mod bridge;
pub mod config;
pub mod error;
pub mod event_decoder;
pub mod queue_client;
pub mod topic_publisher;

pub use blob_fetcher::{BlobFetcher, S3BlobFetcher};
pub use bridge::{Bridge, BridgeTiming, Disposition, PollOutcome};
pub use config::Config;
pub use error::{BridgeError, ErrorKind};
pub use event_decoder::{BlobReference, Notification};
pub use queue_client::{
    resolve_queue_address, QueueClient, QueueDirectory, QueueMessage, SqsDirectory,
    SqsQueueClient,
};
pub use topic_publisher::{Delivery, KafkaTopicPublisher, TopicPublisher};
