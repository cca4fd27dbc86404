use std::fmt;

use uuid::Uuid;

/// Extension used when the original filename has no `.`.
pub const FALLBACK_EXTENSION: &str = "bin";

/// Storage name for an uploaded file: a fresh UUIDv4 plus the original extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn derive(filename: &str) -> Self {
        Self(format!("{}.{}", Uuid::new_v4(), extension(filename)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn extension(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map_or(FALLBACK_EXTENSION, |(_, ext)| ext)
}
