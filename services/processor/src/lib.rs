//! Record Processor
//!
//! Downstream consumer of the event bridge topic. Each published payload is a
//! JSON record; the processor stamps it with a processing time and writes it
//! to two independent stores:
//!
//! - **PostgreSQL**: `INSERT ... ON CONFLICT (id) DO NOTHING`, so replays are no-ops
//! - **DynamoDB**: `PutItem` keyed on the record id, last write wins
//!
//! The two writes are best effort and not transactional: a failure in one is
//! logged and reported but never prevents the other.
//!
//! ## Triggers
//!
//! ```text
//! Kafka topic ──▶ KafkaTrigger ─┐
//!                               ├──▶ RecordProcessor ──┬──▶ processed_records (PostgreSQL)
//! POST / {data} ─▶ push API ────┘                      └──▶ processed-records (DynamoDB)
//! ```

pub mod config;
pub mod error;
pub mod kv_sink;
pub mod processor;
pub mod push_api;
pub mod record;
pub mod relational_sink;
pub mod trigger;

pub use config::Config;
pub use error::ProcessorError;
pub use kv_sink::{DynamoRecordTable, KeyValueSink};
pub use processor::{ProcessReport, RecordProcessor, SinkOutcome};
pub use push_api::{start_api_server, AppState};
pub use record::{ProcessedRecord, RecordPayload, TriggerEnvelope};
pub use relational_sink::{PostgresRecordStore, RelationalSink};
pub use trigger::KafkaTrigger;
