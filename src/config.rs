use dotenvy::dotenv;
use std::{env, net::SocketAddr, str::FromStr};
use thiserror::Error;
use tracing::Level;

pub const DEFAULT_S3_ENDPOINT: &str = "https://storage.yandexcloud.net";
pub const DEFAULT_S3_BUCKET: &str = "poehali-files";
pub const DEFAULT_S3_REGION: &str = "ru-central1";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl StorageConfig {
    /// Access and secret key, when both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) => Some((access.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_level: Level,
    pub max_upload_bytes: usize,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let secret = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let backend = match var("STORAGE_BACKEND", "s3").to_ascii_lowercase().as_str() {
            "s3" => StorageBackend::S3,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port: parse(&lookup, "PORT", 8080)?,
            log_level: parse(&lookup, "LOG_LEVEL", Level::INFO)?,
            max_upload_bytes: parse(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            storage: StorageConfig {
                backend,
                endpoint: var("S3_ENDPOINT", DEFAULT_S3_ENDPOINT),
                bucket: var("S3_BUCKET", DEFAULT_S3_BUCKET),
                region: var("S3_REGION", DEFAULT_S3_REGION),
                access_key: secret("S3_ACCESS_KEY"),
                secret_key: secret("S3_SECRET_KEY"),
            },
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::Invalid {
            name: "HOST",
            value: addr,
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::Invalid { name, value }),
        },
    }
}
