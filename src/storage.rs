//! Object storage access: presigned upload targets and public URLs

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::error::{LectureGraphError, Result};

/// Bucket operations the upload flow needs
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Time-limited URL granting a single PUT of `key` with `content_type`
    async fn presign_put(&self, key: &str, content_type: &str, expires_in: Duration) -> Result<String>;

    /// Public read URL for an uploaded object, when a public base is configured
    fn public_url(&self, key: &str) -> Option<String>;
}

/// S3-compatible storage (Cloudflare R2, MinIO, AWS)
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base: Option<String>,
}

impl S3Storage {
    /// Build a client from static credentials.
    ///
    /// Missing credentials are not fatal here; signing fails later with a
    /// storage error instead, so the rest of the API stays usable.
    pub fn new(config: &StorageConfig) -> Self {
        if !config.has_credentials() {
            warn!("Storage environment variables are missing. File uploads will fail.");
        }

        let credentials = Credentials::new(
            config.access_key.clone().unwrap_or_default(),
            config.secret_key.clone().unwrap_or_default(),
            None,
            None,
            "lecture-graph-static",
        );

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true);

        if let Some(ref endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint.clone());
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_base: config.public_url.clone(),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn presign_put(&self, key: &str, content_type: &str, expires_in: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| LectureGraphError::Storage(format!("invalid presign expiry: {}", e)))?;

        debug!("Generating presigned URL for {}/{}", self.bucket, key);
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| LectureGraphError::Storage(format!("presigning failed: {}", e)))?;

        Ok(request.uri().to_string())
    }

    fn public_url(&self, key: &str) -> Option<String> {
        self.public_base
            .as_deref()
            .map(|base| public_object_url(base, key))
    }
}

/// `<base>/<key>` with the key percent-encoded
pub fn public_object_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), urlencoding::encode(key))
}
