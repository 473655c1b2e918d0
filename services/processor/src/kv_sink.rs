use crate::config::KeyValueConfig;
use crate::error::ProcessorError;
use crate::record::ProcessedRecord;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Key-value store for processed records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueSink: Send + Sync {
    /// Write the record under its id, replacing any existing entry
    async fn put(&self, record: &ProcessedRecord) -> Result<(), ProcessorError>;
}

/// Item attributes for a record: strings as `S`, the value as `N`
pub fn item_attributes(record: &ProcessedRecord) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (
            "recordId".to_string(),
            AttributeValue::S(record.record_id.clone()),
        ),
        (
            "userEmail".to_string(),
            AttributeValue::S(record.user_email.clone()),
        ),
        ("value".to_string(), AttributeValue::N(record.value_text())),
        (
            "processedAt".to_string(),
            AttributeValue::S(record.processed_at.clone()),
        ),
    ])
}

/// DynamoDB-backed record table
pub struct DynamoRecordTable {
    client: DynamoClient,
    table: String,
}

impl DynamoRecordTable {
    /// Create a new DynamoDB client for the configured endpoint
    pub async fn new(config: &KeyValueConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "processor-static",
            ));
        }

        let sdk_config: aws_types::SdkConfig = loader.load().await;
        let dynamo_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config)
            .endpoint_url(&config.endpoint_url)
            .build();

        info!(
            endpoint = %config.endpoint_url,
            table = %config.table,
            "DynamoDB client initialized"
        );

        Self {
            client: DynamoClient::from_conf(dynamo_config),
            table: config.table.clone(),
        }
    }
}

#[async_trait]
impl KeyValueSink for DynamoRecordTable {
    #[instrument(skip(self, record), fields(record_id = %record.record_id, table = %self.table))]
    async fn put(&self, record: &ProcessedRecord) -> Result<(), ProcessorError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item_attributes(record)))
            .send()
            .await
            .map_err(|e| ProcessorError::sink("key-value", DisplayErrorContext(&e).to_string()))?;

        debug!("Key-value put executed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_attribute_types() {
        let record = ProcessedRecord {
            record_id: "r1".to_string(),
            user_email: "e@x.com".to_string(),
            value: serde_json::Number::from(42),
            processed_at: "2024-01-15T10:30:00+00:00".to_string(),
        };

        let item = item_attributes(&record);

        assert_eq!(item.len(), 4);
        assert_eq!(item["recordId"], AttributeValue::S("r1".to_string()));
        assert_eq!(item["userEmail"], AttributeValue::S("e@x.com".to_string()));
        assert_eq!(item["value"], AttributeValue::N("42".to_string()));
        assert_eq!(
            item["processedAt"],
            AttributeValue::S("2024-01-15T10:30:00+00:00".to_string())
        );
    }

    #[test]
    fn test_large_integer_value_attribute() {
        let payload = crate::record::RecordPayload::decode(
            br#"{"recordId":"r2","userEmail":"e@x.com","value":9007199254740993}"#,
        )
        .unwrap();
        let record = ProcessedRecord::new(payload, chrono::Utc::now());

        let item = item_attributes(&record);

        assert_eq!(
            item["value"],
            AttributeValue::N("9007199254740993".to_string())
        );
    }
}
