use std::time::Duration;
use tracing::{error, info};

use super::{UploadTarget, UploadTargetRequest};
use crate::error::{LectureGraphError, Result};
use crate::storage::ObjectStorage;

/// Check that both request fields are present and non-blank
pub fn validate_request(request: &UploadTargetRequest) -> Result<(&str, &str)> {
    let filename = request.filename.as_deref().map(str::trim).unwrap_or_default();
    let content_type = request.content_type.as_deref().map(str::trim).unwrap_or_default();

    if filename.is_empty() || content_type.is_empty() {
        return Err(LectureGraphError::Validation(
            "Filename and contentType are required".to_string(),
        ));
    }
    Ok((filename, content_type))
}

/// Object key for an upload: a fresh UUID prefix keeps same-named files apart
pub fn storage_key(filename: &str) -> String {
    // keep only the final path component so keys never nest
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    format!("{}-{}", uuid::Uuid::new_v4(), name)
}

/// Validate the request and sign a PUT target for a new object key
pub async fn issue_upload_target(
    storage: &dyn ObjectStorage,
    request: &UploadTargetRequest,
    expires_in: Duration,
) -> Result<UploadTarget> {
    let (filename, content_type) = validate_request(request)?;
    info!("📨 Upload target requested: {} ({})", filename, content_type);

    let key = storage_key(filename);
    let url = storage
        .presign_put(&key, content_type, expires_in)
        .await
        .map_err(|e| {
            error!("Error generating presigned URL: {}", e);
            e
        })?;

    Ok(UploadTarget { url, key })
}
