use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AppError;

/// Object storage for user uploads.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores `body` under `key` and returns its public URL.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// S3 (or MinIO) backed storage with path-style public URLs.
pub struct S3FileStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    endpoint: String,
}

impl S3FileStorage {
    pub async fn from_config(config: &Config) -> Self {
        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            "jobportal-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.s3_endpoint)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
            .force_path_style(true)
            .build();

        S3FileStorage {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.s3_bucket.clone(),
            endpoint: config.s3_endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

#[async_trait]
impl FileStorage for S3FileStorage {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, AppError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload of {key} failed: {e}")))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                warn!("S3 delete of {key} failed: {e}");
                AppError::Storage(format!("S3 delete of {key} failed: {e}"))
            })?;
        Ok(())
    }
}
