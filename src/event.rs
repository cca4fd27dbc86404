//! Serverless-style invocation: the upload handler driven by a function event
//! instead of a raw HTTP request.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::ApiError;
use crate::routes::{CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS, CORS_MAX_AGE_SECS};
use crate::storage::StoreDispatcher;
use crate::upload::{UploadRequest, handle_upload};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl FunctionEvent {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl FunctionResponse {
    fn preflight() -> Self {
        let headers = [
            ("Access-Control-Allow-Origin", "*".to_string()),
            ("Access-Control-Allow-Methods", CORS_ALLOW_METHODS.to_string()),
            ("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS.to_string()),
            ("Access-Control-Max-Age", CORS_MAX_AGE_SECS.to_string()),
        ];
        Self {
            status_code: 200,
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    fn json(status_code: u16, body: serde_json::Value) -> Self {
        let headers = [
            ("Content-Type", mime::APPLICATION_JSON.as_ref()),
            ("Access-Control-Allow-Origin", "*"),
        ];
        Self {
            status_code,
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            body: body.to_string(),
            is_base64_encoded: false,
        }
    }

    fn error(err: &ApiError) -> Self {
        Self::json(err.status().as_u16(), err.body())
    }
}

pub async fn invoke(dispatcher: &StoreDispatcher, event: FunctionEvent) -> FunctionResponse {
    let method = event.http_method.as_deref().unwrap_or("GET");

    if method.eq_ignore_ascii_case("OPTIONS") {
        return FunctionResponse::preflight();
    }
    if !method.eq_ignore_ascii_case("POST") {
        return FunctionResponse::error(&ApiError::MethodNotAllowed);
    }

    let request = UploadRequest {
        base64_encoded: event.is_base64_encoded,
        content_type: event.header("content-type").unwrap_or_default().to_string(),
        body: Bytes::from(event.body.unwrap_or_default()),
    };

    match handle_upload(dispatcher, request).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(body) => FunctionResponse::json(200, body),
            Err(e) => FunctionResponse::error(&ApiError::Unexpected(e.to_string())),
        },
        Err(err) => {
            err.log("invocation failed");
            FunctionResponse::error(&err)
        }
    }
}
