use super::*;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;

/// S3-compatible object store reached through an explicit endpoint.
pub struct S3Storage {
    endpoint: String,
    region: String,
    access_key: String,
    secret_key: String,
    clients: RwLock<HashMap<String, AmazonS3>>,
}

impl S3Storage {
    pub fn new(endpoint: String, region: String, access_key: String, secret_key: String) -> Self {
        Self {
            endpoint,
            region,
            access_key,
            secret_key,
            clients: RwLock::new(HashMap::new()),
        }
    }

    async fn client(&self, bucket: &str) -> Result<AmazonS3, StorageError> {
        if let Some(client) = self.clients.read().await.get(bucket) {
            return Ok(client.clone());
        }

        let client = AmazonS3Builder::new()
            .with_endpoint(self.endpoint.clone())
            .with_allow_http(self.endpoint.starts_with("http://"))
            .with_region(self.region.clone())
            .with_bucket_name(bucket)
            .with_access_key_id(self.access_key.clone())
            .with_secret_access_key(self.secret_key.clone())
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        self.clients
            .write()
            .await
            .insert(bucket.to_string(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let client = self.client(bucket).await?;
        let size = content.len();
        let start = Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        client
            .put_opts(&Path::from(key), PutPayload::from(content), options)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket,
                    key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 put failed"
                );
                StorageError::WriteFailed {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            })?;

        tracing::debug!(
            bucket,
            key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put succeeded"
        );
        Ok(())
    }
}
