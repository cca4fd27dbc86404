use super::*;
use crate::config::{StorageBackend, StorageConfig};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::sync::Arc;

/// Namespace segment every uploaded object is written under.
pub const KEY_PREFIX: &str = "homework-files";

/// Chooses where uploaded bytes end up.
#[derive(Clone)]
pub enum StoreDispatcher {
    /// No store configured: content is embedded in a data URI.
    Inline,
    ObjectStore {
        storage: Arc<dyn Storage>,
        endpoint: String,
        bucket: String,
    },
}

impl StoreDispatcher {
    /// Object store when credentials are configured (or the in-memory backend
    /// is selected), inline data URIs otherwise.
    pub fn from_config(config: &StorageConfig) -> Self {
        let storage: Arc<dyn Storage> = match (config.backend, config.credentials()) {
            (StorageBackend::Memory, _) => Arc::new(InMemoryStorage::new()),
            (StorageBackend::S3, Some((access_key, secret_key))) => Arc::new(S3Storage::new(
                config.endpoint.clone(),
                config.region.clone(),
                access_key.to_string(),
                secret_key.to_string(),
            )),
            (StorageBackend::S3, None) => return Self::Inline,
        };
        Self::object_store(storage, config.endpoint.clone(), config.bucket.clone())
    }

    pub fn object_store(storage: Arc<dyn Storage>, endpoint: String, bucket: String) -> Self {
        Self::ObjectStore {
            storage,
            endpoint,
            bucket,
        }
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::ObjectStore { .. } => "object_store",
        }
    }

    /// Persists `content` under `key` and returns the URL it is reachable at.
    pub async fn store(&self, key: &StorageKey, content: Bytes) -> Result<String, StorageError> {
        match self {
            Self::Inline => Ok(format!(
                "data:{};base64,{}",
                mime::APPLICATION_OCTET_STREAM,
                STANDARD.encode(&content)
            )),
            Self::ObjectStore {
                storage,
                endpoint,
                bucket,
            } => {
                let object_key = format!("{KEY_PREFIX}/{key}");
                storage
                    .put(
                        bucket,
                        &object_key,
                        content,
                        mime::APPLICATION_OCTET_STREAM.as_ref(),
                    )
                    .await?;

                Ok(format!(
                    "{}/{}/{}/{}",
                    endpoint.trim_end_matches('/'),
                    bucket,
                    KEY_PREFIX,
                    urlencoding::encode(key.as_str())
                ))
            }
        }
    }
}
