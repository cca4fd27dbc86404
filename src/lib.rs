//! Upload endpoint of the school-schedule backend: takes a raw
//! `multipart/form-data` body, pulls out the file, and stores it in an
//! S3-compatible bucket or, without credentials, returns it as a data URI.

pub mod config;
pub mod errors;
pub mod event;
pub mod multipart;
pub mod routes;
pub mod storage;
pub mod upload;

pub use config::AppConfig;
pub use errors::ApiError;
pub use routes::router;
pub use storage::StoreDispatcher;
pub use upload::{UploadRequest, UploadResult, handle_upload};
