use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::config::get_config;
use crate::error::AppError;

/// Thin wrapper over the S3 client for the media bucket. Guests upload
/// straight to the bucket; the backend only ever writes through here when a
/// server-side upload drives the coordinator, and deletes for rollback and
/// media removal.
#[derive(Clone)]
pub struct StorageService {
    client: Client,
    pub bucket_name: String,
}

impl StorageService {
    pub async fn new() -> Self {
        let config = get_config();

        let credentials = aws_sdk_s3::config::Credentials::new(
            config.aws_access_key_id.clone(),
            config.aws_secret_access_key.clone(),
            None,
            None,
            "manual_config",
        );

        let region = aws_sdk_s3::config::Region::new(config.aws_region.clone());

        let mut s3_config_builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.s3_endpoint {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        let client = Client::from_conf(s3_config_builder.build());

        Self {
            client,
            bucket_name: config.s3_bucket_name.clone(),
        }
    }

    pub async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                eprintln!("S3 Upload Error: {:?}", e);
                AppError::StorageError(format!("Failed to upload object {}: {}", key, e))
            })?;

        Ok(())
    }

    pub async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                eprintln!("S3 Delete Error: {}", e);
                AppError::StorageError(format!("Failed to delete object {}", key))
            })?;

        Ok(())
    }

    pub fn public_url(&self, key: &str) -> String {
        public_media_url(key)
    }
}

/// Deterministic public URL for a stored key. Path-style when a custom
/// endpoint is configured, virtual-host style on AWS proper.
pub fn public_media_url(key: &str) -> String {
    let config = get_config();
    if let Some(endpoint) = &config.s3_endpoint {
        format!("{}/{}/{}", endpoint, config.s3_bucket_name, key)
    } else {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            config.s3_bucket_name, config.aws_region, key
        )
    }
}
