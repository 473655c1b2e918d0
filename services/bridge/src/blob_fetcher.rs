use crate::aws::load_sdk_config;
use crate::config::{AwsConfig, BlobConfig};
use crate::error::BridgeError;
use crate::event_decoder::BlobReference;
use async_trait::async_trait;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::{debug, info, instrument};

/// Reads object content referenced by a notification
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn fetch(&self, reference: &BlobReference) -> Result<Bytes, BridgeError>;
}

/// S3-backed blob fetcher
pub struct S3BlobFetcher {
    client: S3Client,
}

impl S3BlobFetcher {
    /// Create a new S3 fetcher
    pub async fn new(config: &BlobConfig, aws: &AwsConfig) -> Self {
        let sdk_config = load_sdk_config(&config.region, aws).await;
        let mut s3_config_builder = S3ConfigBuilder::from(&sdk_config);

        // Configure custom endpoint for MinIO/LocalStack
        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        info!(
            region = %config.region,
            endpoint = ?config.endpoint_url,
            "S3 blob fetcher initialized"
        );

        Self::from_client(S3Client::from_conf(s3_config_builder.build()))
    }

    /// Wrap an already configured client
    pub fn from_client(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobFetcher for S3BlobFetcher {
    #[instrument(skip(self), fields(container = %reference.container, key = %reference.key))]
    async fn fetch(&self, reference: &BlobReference) -> Result<Bytes, BridgeError> {
        let output = self
            .client
            .get_object()
            .bucket(&reference.container)
            .key(&reference.key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false)
                {
                    BridgeError::NotFound {
                        container: reference.container.clone(),
                        key: reference.key.clone(),
                    }
                } else {
                    BridgeError::transient("fetch", DisplayErrorContext(&e).to_string())
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| BridgeError::transient("fetch", e.to_string()))?
            .into_bytes();

        debug!(size_bytes = data.len(), "Fetched object");

        Ok(data)
    }
}
