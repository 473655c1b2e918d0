use crate::config::AwsConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_types::SdkConfig;

/// Load shared SDK configuration for a region.
///
/// Static credentials are used when both halves are configured, otherwise the
/// default provider chain applies.
pub async fn load_sdk_config(region: &str, aws: &AwsConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()));

    if let (Some(access_key_id), Some(secret_access_key)) =
        (&aws.access_key_id, &aws.secret_access_key)
    {
        loader = loader.credentials_provider(Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "bridge-static",
        ));
    }

    loader.load().await
}
