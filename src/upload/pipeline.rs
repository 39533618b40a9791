use std::path::Path;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

use super::{transfer, RegisterLectureRequest, UploadProgress, UploadTargetRequest};
use crate::client::LectureGraphClient;
use crate::config::UploadConfig;
use crate::error::{LectureGraphError, Result};

/// Result of a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub record_id: String,
    pub storage_key: String,
    pub bytes: u64,
}

/// Client-side driver for the three upload stages
#[derive(Debug, Clone)]
pub struct UploadPipeline {
    api: LectureGraphClient,
    /// Bucket transfers can take arbitrarily long, so this client has no timeout
    transfer_client: reqwest::Client,
    chunk_size: usize,
}

impl UploadPipeline {
    pub fn new(config: &UploadConfig) -> Result<Self> {
        let api = LectureGraphClient::new(
            &config.server_url,
            Duration::from_secs(config.request_timeout_seconds),
        )?;
        Ok(Self::with_client(api, config.chunk_size))
    }

    pub fn with_client(api: LectureGraphClient, chunk_size: usize) -> Self {
        Self {
            api,
            transfer_client: reqwest::Client::new(),
            chunk_size,
        }
    }

    /// Upload `path` and register it under `title` (defaults to the file name).
    ///
    /// Stages run strictly in sequence; the first error aborts the pipeline.
    /// Dropping the returned future abandons an in-flight transfer.
    pub async fn run(
        &self,
        path: &Path,
        title: Option<String>,
        progress: watch::Sender<UploadProgress>,
    ) -> Result<UploadOutcome> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let content_type = transfer::content_type_for(path);
        let title = title.unwrap_or_else(|| filename.clone());

        let result = self
            .run_stages(path, &filename, content_type, title, progress)
            .await;
        if let Err(ref e) = result {
            error!("❌ Upload of {} failed: {}", path.display(), e);
        }
        result
    }

    async fn run_stages(
        &self,
        path: &Path,
        filename: &str,
        content_type: &str,
        title: String,
        progress: watch::Sender<UploadProgress>,
    ) -> Result<UploadOutcome> {
        info!("1️⃣ Requesting upload target for {}", filename);
        let target = self
            .api
            .request_upload_target(&UploadTargetRequest::new(filename, content_type))
            .await?;

        info!("2️⃣ Transferring {} to storage key {}", filename, target.key);
        let bytes = transfer::transfer_file(
            &self.transfer_client,
            &target.url,
            path,
            content_type,
            self.chunk_size,
            progress,
        )
        .await
        .map_err(|e| match e {
            LectureGraphError::Transfer(_) => e,
            other => LectureGraphError::Transfer(other.to_string()),
        })?;

        info!("3️⃣ Registering '{}'", title);
        let record_id = self
            .api
            .register_lecture(&RegisterLectureRequest {
                title,
                storage_key: target.key.clone(),
            })
            .await?;

        info!("🎉 Upload complete, lecture id {}", record_id);
        Ok(UploadOutcome {
            record_id,
            storage_key: target.key,
            bytes,
        })
    }
}
