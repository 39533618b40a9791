//! Upload flow: upload target, direct-to-bucket transfer, registration
//!
//! The three stages always run in order and the first failure ends the
//! pipeline. Nothing is retried and completed stages are not rolled back.

pub mod pipeline;
pub mod target;
pub mod transfer;

use serde::{Deserialize, Serialize};

pub use pipeline::{UploadOutcome, UploadPipeline};
pub use target::{issue_upload_target, storage_key};
pub use transfer::{content_type_for, transfer_file};

/// Request for a presigned upload target
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTargetRequest {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl UploadTargetRequest {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            content_type: Some(content_type.into()),
        }
    }
}

/// Time-limited write URL plus the object key it writes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    pub url: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterLectureRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub storage_key: String,
}

/// Outcome of metadata registration; failures carry a message, not a status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterLectureResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RegisterLectureResponse {
    pub fn registered(record_id: String) -> Self {
        Self {
            success: true,
            record_id: Some(record_id),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            record_id: None,
            error: Some(error),
        }
    }
}

/// Bytes sent so far out of the file size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    pub bytes_sent: u64,
    pub bytes_total: u64,
}

impl UploadProgress {
    /// Fraction in `0.0..=1.0`; an empty file counts as complete
    pub fn fraction(&self) -> f64 {
        if self.bytes_total == 0 {
            1.0
        } else {
            (self.bytes_sent as f64 / self.bytes_total as f64).min(1.0)
        }
    }

    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).round() as u8
    }
}
