use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use http::{HeaderMap, Method, Request, StatusCode, header};
use homework_upload::{
    StoreDispatcher, router,
    storage::{InMemoryStorage, Storage, StorageError},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const LIMIT: usize = 1024 * 1024;

struct UnreachableStorage;

#[async_trait]
impl Storage for UnreachableStorage {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        _content: Bytes,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        Err(StorageError::WriteFailed {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

fn report_body() -> Vec<u8> {
    let mut body = b"--XYZ\r\nContent-Disposition: form-data; name=\"title\"\r\n".to_vec();
    body.extend_from_slice(b"--XYZ\r\nContent-Disposition: form-data; name=\"file\"; filename=\"report.pdf\"\r\n");
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n%PDF-1.4..\r\n--XYZ--\r\n");
    body
}

fn upload_request(content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), LIMIT).await.unwrap();
    (status, headers, body)
}

fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn inline_upload_returns_data_uri() {
    let app = router(Arc::new(StoreDispatcher::Inline), LIMIT);

    let (status, headers, body) = send(
        app,
        upload_request("multipart/form-data; boundary=XYZ", report_body()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["access-control-allow-origin"], "*");
    let body = json_body(&body);
    assert_eq!(body["filename"], "report.pdf");
    assert_eq!(body["size"], 10);
    assert_eq!(
        body["url"],
        format!(
            "data:application/octet-stream;base64,{}",
            STANDARD.encode("%PDF-1.4..")
        )
    );
}

#[tokio::test]
async fn object_store_upload_returns_bucket_url() {
    let storage = InMemoryStorage::new();
    let dispatcher = StoreDispatcher::object_store(
        Arc::new(storage.clone()),
        "https://storage.example.net".to_string(),
        "homework".to_string(),
    );
    let app = router(Arc::new(dispatcher), LIMIT);

    let (status, _, body) = send(
        app,
        upload_request("multipart/form-data; boundary=XYZ", report_body()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("https://storage.example.net/homework/homework-files/"));
    assert!(url.ends_with(".pdf"));
    assert_eq!(body["size"], 10);

    let key = url.rsplit('/').next().unwrap();
    let object = storage
        .get("homework", &format!("homework-files/{key}"))
        .await
        .unwrap();
    assert_eq!(object.content, Bytes::from_static(b"%PDF-1.4.."));
}

#[tokio::test]
async fn storage_failure_is_500_with_detail() {
    let dispatcher = StoreDispatcher::object_store(
        Arc::new(UnreachableStorage),
        "https://s3".to_string(),
        "b".to_string(),
    );
    let app = router(Arc::new(dispatcher), LIMIT);

    let (status, _, body) = send(
        app,
        upload_request("multipart/form-data; boundary=XYZ", report_body()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(&body);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
    assert!(body.get("url").is_none());
}

#[tokio::test]
async fn json_content_type_is_400() {
    let app = router(Arc::new(StoreDispatcher::Inline), LIMIT);

    let (status, _, body) = send(app, upload_request("application/json", report_body())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(&body),
        json!({ "error": "Content-Type must be multipart/form-data" })
    );
}

#[tokio::test]
async fn missing_boundary_is_400() {
    let app = router(Arc::new(StoreDispatcher::Inline), LIMIT);

    let (status, _, body) = send(app, upload_request("multipart/form-data", report_body())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json_body(&body)["error"].as_str().unwrap().contains("boundary"));
}

#[tokio::test]
async fn body_without_file_is_400() {
    let app = router(Arc::new(StoreDispatcher::Inline), LIMIT);

    let (status, _, body) = send(
        app,
        upload_request(
            "multipart/form-data; boundary=XYZ",
            "--XYZ\r\n\r\nplain\r\n--XYZ--\r\n",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body), json!({ "error": "No file found in request" }));
}

#[tokio::test]
async fn rejected_upload_stores_nothing() {
    let storage = InMemoryStorage::new();
    let dispatcher = StoreDispatcher::object_store(
        Arc::new(storage.clone()),
        "https://s3".to_string(),
        "b".to_string(),
    );
    let app = router(Arc::new(dispatcher), LIMIT);

    let (status, _, _) = send(app, upload_request("application/json", report_body())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(storage.is_empty().await);
}

#[tokio::test]
async fn oversized_upload_is_413_json() {
    let app = router(Arc::new(StoreDispatcher::Inline), 64);

    let (status, headers, body) = send(
        app,
        upload_request("multipart/form-data; boundary=XYZ", vec![b'a'; 200]),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert!(json_body(&body)["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn invalid_invoke_json_is_400_json() {
    let app = router(Arc::new(StoreDispatcher::Inline), LIMIT);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/invoke")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, headers, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert!(json_body(&body)["error"].as_str().unwrap().contains("JSON"));
}

#[tokio::test]
async fn preflight_advertises_post() {
    let app = router(Arc::new(StoreDispatcher::Inline), LIMIT);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/upload")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_eq!(headers["access-control-allow-origin"], "*");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("POST"));
    assert!(methods.contains("OPTIONS"));
    assert_eq!(headers["access-control-max-age"], "86400");
    assert_eq!(headers["access-control-allow-headers"].as_bytes(), b"Content-Type");
}

#[tokio::test]
async fn other_methods_are_405() {
    let app = router(Arc::new(StoreDispatcher::Inline), LIMIT);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/upload")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(&body), json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn invoke_accepts_base64_events() {
    let app = router(Arc::new(StoreDispatcher::Inline), LIMIT);
    let event = json!({
        "httpMethod": "POST",
        "headers": { "content-type": "multipart/form-data; boundary=XYZ" },
        "body": STANDARD.encode(report_body()),
        "isBase64Encoded": true,
    });

    let request = Request::builder()
        .method(Method::POST)
        .uri("/invoke")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(event.to_string()))
        .unwrap();
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let response = json_body(&body);
    assert_eq!(response["statusCode"], 200);
    assert_eq!(response["isBase64Encoded"], false);
    let inner: Value = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
    assert_eq!(inner["filename"], "report.pdf");
    assert_eq!(inner["size"], 10);
}

#[tokio::test]
async fn health_check() {
    let app = router(Arc::new(StoreDispatcher::Inline), LIMIT);

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Bytes::from_static(b"OK"));
}
