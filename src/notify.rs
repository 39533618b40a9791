//! Fire-and-forget trigger of the external processing backend

use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use url::Url;

use crate::client::directory_url;
use crate::config::BackendConfig;
use crate::error::{LectureGraphError, Result};

/// Tells the processing backend a new lecture is ready for transcription.
///
/// Delivery is at-most-once: the request is sent once, its response is never
/// shown to users, and failures are only logged.
#[derive(Debug, Clone)]
pub struct ProcessingNotifier {
    backend_url: Url,
    client: reqwest::Client,
}

impl ProcessingNotifier {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let backend_url = Url::parse(&config.url)
            .map(directory_url)
            .map_err(|e| LectureGraphError::Config(format!("invalid backend URL {}: {}", config.url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { backend_url, client })
    }

    /// `<backend>/process-lecture?video_id=<id>&file_path=<key>`
    pub fn notification_url(&self, record_id: &str, storage_key: &str) -> Result<Url> {
        let mut url = self
            .backend_url
            .join("process-lecture")
            .map_err(|e| LectureGraphError::Config(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("video_id", record_id)
            .append_pair("file_path", storage_key);
        Ok(url)
    }

    /// Send the trigger and wait for the backend to accept it
    pub async fn notify(&self, record_id: &str, storage_key: &str) -> Result<()> {
        let url = self.notification_url(record_id, storage_key)?;
        debug!("Triggering processing backend: {}", url);

        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| LectureGraphError::Notification(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LectureGraphError::Notification(format!(
                "backend responded {}",
                response.status()
            )));
        }

        info!("📡 Processing backend notified for lecture {}", record_id);
        Ok(())
    }

    /// Spawn the trigger without waiting for it. Errors are logged and
    /// dropped; callers normally discard the handle.
    pub fn notify_detached(&self, record_id: String, storage_key: String) -> JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&record_id, &storage_key).await {
                error!("Backend trigger failed for lecture {}: {}", record_id, e);
            }
        })
    }
}
