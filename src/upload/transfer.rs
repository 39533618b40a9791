use bytes::Bytes;
use futures::stream;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::sync::watch;
use tracing::{debug, info};

use super::UploadProgress;
use crate::error::{LectureGraphError, Result};

/// Content type sent with the upload, derived from the file extension
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

struct ChunkReader {
    file: File,
    chunk_size: usize,
    sent: u64,
    total: u64,
    progress: watch::Sender<UploadProgress>,
    finished: bool,
}

/// PUT the file body to a presigned target, streaming it in chunks.
///
/// `progress` is updated as each chunk is handed to the HTTP client. Any I/O
/// or HTTP failure, or a non-success status from the bucket, is a transfer
/// error.
pub async fn transfer_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    content_type: &str,
    chunk_size: usize,
    progress: watch::Sender<UploadProgress>,
) -> Result<u64> {
    let file = File::open(path)
        .await
        .map_err(|e| LectureGraphError::Transfer(format!("cannot open {}: {}", path.display(), e)))?;
    let total = file
        .metadata()
        .await
        .map_err(|e| LectureGraphError::Transfer(e.to_string()))?
        .len();

    progress.send_replace(UploadProgress {
        bytes_sent: 0,
        bytes_total: total,
    });

    let reader = ChunkReader {
        file,
        chunk_size: chunk_size.max(1),
        sent: 0,
        total,
        progress,
        finished: false,
    };

    let body_stream = stream::unfold(reader, |mut reader| async move {
        if reader.finished {
            return None;
        }
        let mut buf = vec![0u8; reader.chunk_size];
        match reader.file.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                reader.sent += n as u64;
                reader.progress.send_replace(UploadProgress {
                    bytes_sent: reader.sent,
                    bytes_total: reader.total,
                });
                Some((Ok::<Bytes, std::io::Error>(Bytes::from(buf)), reader))
            }
            Err(e) => {
                reader.finished = true;
                Some((Err(e), reader))
            }
        }
    });

    debug!("⬆️ Uploading {} bytes as {}", total, content_type);
    let response = client
        .put(url)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, total)
        .body(reqwest::Body::wrap_stream(body_stream))
        .send()
        .await
        .map_err(|e| LectureGraphError::Transfer(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(LectureGraphError::Transfer(format!(
            "bucket rejected upload {}: {}",
            status, text
        )));
    }

    info!("✅ Transferred {} bytes", total);
    Ok(total)
}
