use crate::error::ProcessorError;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Invocation envelope delivered by the trigger: `{ "data": "<base64>" }`.
///
/// Push subscriptions wrap the same shape as `{ "message": { "data": ... } }`;
/// both are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TriggerEnvelope {
    Direct { data: String },
    Wrapped { message: WrappedMessage },
}

#[derive(Debug, Clone, Deserialize)]
pub struct WrappedMessage {
    pub data: String,
}

impl TriggerEnvelope {
    /// Parse an envelope from a JSON body
    pub fn from_json(body: &[u8]) -> Result<Self, ProcessorError> {
        serde_json::from_slice(body).map_err(|e| ProcessorError::InvalidEnvelope(e.to_string()))
    }

    /// Decode the base64 `data` field into the published payload bytes
    pub fn decode_payload(&self) -> Result<Vec<u8>, ProcessorError> {
        let data = match self {
            TriggerEnvelope::Direct { data } => data,
            TriggerEnvelope::Wrapped { message } => &message.data,
        };

        STANDARD
            .decode(data)
            .map_err(|e| ProcessorError::InvalidEnvelope(format!("data is not base64: {e}")))
    }
}

/// Record as published by the upstream producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPayload {
    pub record_id: String,
    pub user_email: String,
    /// Kept as parsed so integers beyond f64 precision survive unchanged
    pub value: serde_json::Number,
}

impl RecordPayload {
    /// Decode a UTF-8 JSON payload
    pub fn decode(payload: &[u8]) -> Result<Self, ProcessorError> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| ProcessorError::InvalidPayload(format!("payload is not UTF-8: {e}")))?;

        serde_json::from_str(text).map_err(|e| ProcessorError::InvalidPayload(e.to_string()))
    }
}

/// Record stamped with its processing time, written to both sinks
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedRecord {
    pub record_id: String,
    pub user_email: String,
    pub value: serde_json::Number,
    /// ISO-8601 UTC timestamp
    pub processed_at: String,
}

impl ProcessedRecord {
    pub fn new(payload: RecordPayload, processed_at: DateTime<Utc>) -> Self {
        Self {
            record_id: payload.record_id,
            user_email: payload.user_email,
            value: payload.value,
            processed_at: processed_at.to_rfc3339(),
        }
    }

    /// Numeric attribute text, exactly as the payload carried it
    pub fn value_text(&self) -> String {
        self.value.to_string()
    }

    /// Value for the `DOUBLE PRECISION` column
    pub fn value_f64(&self) -> f64 {
        self.value.as_f64().unwrap_or_default()
    }
}
