use axum::{
    Json,
    extract::rejection::{BytesRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::multipart::MultipartError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Content-Type must be multipart/form-data")]
    UnsupportedContentType,
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    #[error("No file found in request")]
    NoFileFound,
    #[error("Storage write failed: {0}")]
    StorageWriteFailed(#[from] StorageError),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::UnsupportedContentType
            | ApiError::MalformedRequest(_)
            | ApiError::NoFileFound => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::StorageWriteFailed(_) | ApiError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> serde_json::Value {
        json!({ "error": self.to_string() })
    }

    /// Logs at `error` for server faults and `warn` for rejected requests.
    pub fn log(&self, message: &str) {
        if self.status().is_server_error() {
            tracing::error!(error = %self, status = self.status().as_u16(), "{message}");
        } else {
            tracing::warn!(error = %self, status = self.status().as_u16(), "{message}");
        }
    }

    fn from_rejection(status: StatusCode, detail: String) -> Self {
        match status {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(detail),
            status if status.is_client_error() => ApiError::MalformedRequest(detail),
            _ => ApiError::Unexpected(detail),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        match err {
            MultipartError::UnsupportedContentType => ApiError::UnsupportedContentType,
            MultipartError::MissingBoundary => ApiError::MalformedRequest(err.to_string()),
            MultipartError::NoFileFound => ApiError::NoFileFound,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log("request failed");
        (self.status(), Json(self.body())).into_response()
    }
}
