use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use serde::Serialize;
use std::time::Instant;

use crate::errors::ApiError;
use crate::multipart;
use crate::storage::{StorageKey, StoreDispatcher};

#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Body arrived base64 encoded by the transport.
    pub base64_encoded: bool,
    pub body: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub url: String,
    pub filename: String,
    pub size: usize,
}

/// Runs one upload: decode, extract the file part, name it, store it.
pub async fn handle_upload(
    dispatcher: &StoreDispatcher,
    request: UploadRequest,
) -> Result<UploadResult, ApiError> {
    let start = Instant::now();

    let body = if request.base64_encoded {
        // Transports may line-wrap base64 payloads.
        let encoded: Vec<u8> = request
            .body
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        STANDARD
            .decode(&encoded)
            .map(Bytes::from)
            .map_err(|e| ApiError::Unexpected(format!("Invalid base64 body: {e}")))?
    } else {
        request.body
    };

    let file = multipart::extract(&body, &request.content_type)?;
    let key = StorageKey::derive(&file.filename);
    let size = file.content.len();

    let url = dispatcher.store(&key, Bytes::from(file.content)).await?;

    tracing::info!(
        key = %key,
        filename = %file.filename,
        size_bytes = size,
        strategy = dispatcher.strategy(),
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "file uploaded"
    );

    Ok(UploadResult {
        url,
        filename: file.filename,
        size,
    })
}
