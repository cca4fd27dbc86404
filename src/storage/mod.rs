mod dispatcher;
mod in_memory;
mod keys;
mod s3;

pub use dispatcher::{KEY_PREFIX, StoreDispatcher};
pub use in_memory::{InMemoryStorage, StoredObject};
pub use keys::{FALLBACK_EXTENSION, StorageKey};
pub use s3::S3Storage;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("write of {key} to bucket {bucket} failed: {reason}")]
    WriteFailed {
        bucket: String,
        key: String,
        reason: String,
    },
    #[error("storage configuration error: {0}")]
    Config(String),
}

/// Key-addressed binary store holding uploaded files.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;
}
