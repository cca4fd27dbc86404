use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Request,
        rejection::{BytesRejection, JsonRejection},
    },
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use headers::{
    AccessControlAllowMethods, AccessControlAllowOrigin, AccessControlMaxAge, HeaderMapExt,
};
use std::{sync::Arc, time::Duration};

use crate::errors::ApiError;
use crate::event::{FunctionEvent, FunctionResponse, invoke as invoke_event};
use crate::storage::StoreDispatcher;
use crate::upload::{UploadRequest, UploadResult, handle_upload};

pub(crate) const CORS_ALLOW_METHODS: &str = "POST, OPTIONS";
pub(crate) const CORS_ALLOW_HEADERS: &str = "Content-Type";
pub(crate) const CORS_MAX_AGE_SECS: u64 = 86400;

pub fn router(dispatcher: Arc<StoreDispatcher>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(health))
        .route(
            "/upload",
            post(upload).options(preflight).fallback(method_not_allowed),
        )
        .route("/invoke", post(invoke))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(allow_any_origin))
        .layer(Extension(dispatcher))
}

async fn health() -> &'static str {
    "OK"
}

async fn upload(
    Extension(dispatcher): Extension<Arc<StoreDispatcher>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<UploadResult>, ApiError> {
    let body = body?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let result = handle_upload(
        &dispatcher,
        UploadRequest {
            base64_encoded: false,
            body,
            content_type,
        },
    )
    .await?;

    Ok(Json(result))
}

async fn invoke(
    Extension(dispatcher): Extension<Arc<StoreDispatcher>>,
    event: Result<Json<FunctionEvent>, JsonRejection>,
) -> Result<Json<FunctionResponse>, ApiError> {
    let Json(event) = event?;
    Ok(Json(invoke_event(&dispatcher, event).await))
}

async fn preflight() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.typed_insert(AccessControlAllowMethods::from_iter([
        Method::POST,
        Method::OPTIONS,
    ]));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers.typed_insert(AccessControlMaxAge::from(Duration::from_secs(
        CORS_MAX_AGE_SECS,
    )));
    (StatusCode::OK, headers)
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn allow_any_origin(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .typed_insert(AccessControlAllowOrigin::ANY);
    response
}
