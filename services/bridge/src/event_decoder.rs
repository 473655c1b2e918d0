use crate::error::BridgeError;
use serde::Deserialize;
use serde_json::Value;

/// Event name S3 sends when a notification configuration is first attached
pub const TEST_EVENT: &str = "s3:TestEvent";

#[derive(Debug, Clone, Deserialize)]
struct NotificationRecord {
    s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct S3Object {
    key: String,
}

/// Container and key identifying stored object content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobReference {
    pub container: String,
    pub key: String,
}

/// What a queue message asks the bridge to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Synthetic test event: delete without forwarding
    Test,
    /// Real notification pointing at an object to forward
    Object(BlobReference),
}

/// Decode a raw queue message body.
///
/// Test events are recognised before any record structure is required.
/// For real envelopes only the first record is used.
pub fn decode(body: &str) -> Result<Notification, BridgeError> {
    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| BridgeError::Malformed(format!("invalid JSON body: {e}")))?;

    if envelope.get("Event").and_then(Value::as_str) == Some(TEST_EVENT) {
        return Ok(Notification::Test);
    }

    let first = envelope
        .get("Records")
        .and_then(Value::as_array)
        .and_then(|records| records.first())
        .ok_or_else(|| BridgeError::Malformed("no Records in notification".to_string()))?;

    let record = NotificationRecord::deserialize(first)
        .map_err(|e| BridgeError::Malformed(format!("invalid notification record: {e}")))?;

    Ok(Notification::Object(BlobReference {
        container: record.s3.bucket.name,
        key: record.s3.object.key,
    }))
}
