//! HTTP client for the lecture-graph API

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{LectureGraphError, Result};
use crate::graph::GraphData;
use crate::store::LectureRecord;
use crate::upload::{
    RegisterLectureRequest, RegisterLectureResponse, UploadTarget, UploadTargetRequest,
};

/// Fallback shown when registration fails without a message
pub const GENERIC_PERSISTENCE_ERROR: &str = "Database error";

#[derive(Debug, Clone)]
pub struct LectureGraphClient {
    base: Url,
    client: reqwest::Client,
}

impl LectureGraphClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .map(directory_url)
            .map_err(|e| LectureGraphError::Config(format!("invalid server URL {}: {}", base_url, e)))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| LectureGraphError::Config(format!("invalid endpoint {}: {}", path, e)))
    }

    /// Stage 1: ask the server for a presigned target.
    ///
    /// Blank fields are rejected locally, before any request is made.
    pub async fn request_upload_target(&self, request: &UploadTargetRequest) -> Result<UploadTarget> {
        crate::upload::target::validate_request(request)?;

        let response = self
            .client
            .post(self.endpoint("api/upload")?)
            .json(request)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::BAD_REQUEST => Err(LectureGraphError::Validation(error_message(response).await)),
            status => Err(LectureGraphError::Storage(format!(
                "upload target request failed {}: {}",
                status,
                error_message(response).await
            ))),
        }
    }

    /// Stage 3: register the uploaded object; `{success: false}` becomes a
    /// persistence error carrying the server's message
    pub async fn register_lecture(&self, request: &RegisterLectureRequest) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint("api/lectures")?)
            .json(request)
            .send()
            .await
            .map_err(|e| LectureGraphError::Persistence(e.to_string()))?;

        let body: RegisterLectureResponse = response
            .json()
            .await
            .map_err(|_| LectureGraphError::Persistence(GENERIC_PERSISTENCE_ERROR.to_string()))?;

        match body {
            RegisterLectureResponse {
                success: true,
                record_id: Some(id),
                ..
            } => Ok(id),
            RegisterLectureResponse { error, .. } => Err(LectureGraphError::Persistence(
                error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| GENERIC_PERSISTENCE_ERROR.to_string()),
            )),
        }
    }

    pub async fn get_lecture(&self, id: &str) -> Result<LectureRecord> {
        let url = self.endpoint(&format!("api/lectures/{}", urlencoding::encode(id)))?;
        self.get_json(url, id).await
    }

    pub async fn lecture_graph(&self, id: &str, time: f64) -> Result<GraphData> {
        let mut url = self.endpoint(&format!("api/lectures/{}/graph", urlencoding::encode(id)))?;
        url.query_pairs_mut().append_pair("t", &time.to_string());
        self.get_json(url, id).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, id: &str) -> Result<T> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(LectureGraphError::NotFound(id.to_string())),
            status if status.is_success() => Ok(response.json().await?),
            status => Err(LectureGraphError::Persistence(format!(
                "lecture lookup failed {}: {}",
                status,
                error_message(response).await
            ))),
        }
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(text)
}

/// Base URL whose path ends in `/`, so relative joins keep every segment
pub(crate) fn directory_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
