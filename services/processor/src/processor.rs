use crate::error::ProcessorError;
use crate::kv_sink::KeyValueSink;
use crate::record::{ProcessedRecord, RecordPayload, TriggerEnvelope};
use crate::relational_sink::RelationalSink;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Result of one sink write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SinkOutcome {
    /// Row or item written
    Written,
    /// Relational row already existed; nothing changed
    AlreadyPresent,
    /// Write failed; logged and not retried here
    Failed { error: String },
}

impl SinkOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SinkOutcome::Failed { .. })
    }
}

/// Per-sink results of processing one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessReport {
    pub record: ProcessedRecord,
    pub relational: SinkOutcome,
    pub key_value: SinkOutcome,
}

/// Decodes published records and writes them to both sinks.
///
/// Holds no mutable state; concurrent invocations only meet at the sinks,
/// where conflict-ignoring inserts and overwriting puts resolve them.
pub struct RecordProcessor {
    relational: Arc<dyn RelationalSink>,
    key_value: Arc<dyn KeyValueSink>,
}

impl RecordProcessor {
    pub fn new(relational: Arc<dyn RelationalSink>, key_value: Arc<dyn KeyValueSink>) -> Self {
        Self {
            relational,
            key_value,
        }
    }

    pub fn relational(&self) -> &Arc<dyn RelationalSink> {
        &self.relational
    }

    /// Handle a trigger invocation carrying a base64 `data` field
    pub async fn handle_envelope(
        &self,
        envelope: &TriggerEnvelope,
    ) -> Result<ProcessReport, ProcessorError> {
        let payload = envelope.decode_payload()?;
        self.process(&payload).await
    }

    /// Process a published payload, stamping it with the current time
    pub async fn process(&self, payload: &[u8]) -> Result<ProcessReport, ProcessorError> {
        self.process_at(payload, Utc::now()).await
    }

    /// Process a published payload with an explicit processing time.
    ///
    /// Only a malformed payload is returned as an error. Sink failures are
    /// reported per sink and never stop the other write.
    #[instrument(skip(self, payload), fields(size_bytes = payload.len()))]
    pub async fn process_at(
        &self,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<ProcessReport, ProcessorError> {
        let decoded = RecordPayload::decode(payload).map_err(|e| {
            metrics::counter!("processor.payloads.rejected").increment(1);
            e
        })?;
        let record = ProcessedRecord::new(decoded, now);

        let relational = match self.relational.upsert(&record).await {
            Ok(true) => SinkOutcome::Written,
            Ok(false) => SinkOutcome::AlreadyPresent,
            Err(e) => {
                error!(record_id = %record.record_id, error = %e, "Relational write failed");
                metrics::counter!("processor.sink.failures", "sink" => "relational").increment(1);
                SinkOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        let key_value = match self.key_value.put(&record).await {
            Ok(()) => SinkOutcome::Written,
            Err(e) => {
                error!(record_id = %record.record_id, error = %e, "Key-value write failed");
                metrics::counter!("processor.sink.failures", "sink" => "key_value").increment(1);
                SinkOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        info!(
            record_id = %record.record_id,
            processed_at = %record.processed_at,
            relational = ?relational,
            key_value = ?key_value,
            "Record processed"
        );
        metrics::counter!("processor.records.processed").increment(1);

        Ok(ProcessReport {
            record,
            relational,
            key_value,
        })
    }
}
