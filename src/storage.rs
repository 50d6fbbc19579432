//! Key-value persistence for the stable device identifier.

use crate::error::ClientError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Store key under which the generated device identifier is persisted.
pub const DEVICE_ID_KEY: &str = "device_id";

/// Minimal persistent key-value facility, injected by the host.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    async fn put(&self, key: &str, value: &str) -> Result<(), ClientError>;
}

/// JSON-file backed store. Good enough for a single device identifier;
/// hosts with real storage bring their own implementation.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn read_map(&self) -> Result<Map<String, Value>, ClientError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ClientError::Storage(format!("parse {}: {}", self.path.display(), e))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("store file {} absent, starting empty", self.path.display());
                Ok(Map::new())
            }
            Err(err) => Err(ClientError::Storage(format!(
                "read {}: {}",
                self.path.display(),
                err
            ))),
        }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        let map = self.read_map().await?;
        Ok(map.get(key).and_then(|v| v.as_str()).map(String::from))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        let bytes = serde_json::to_vec_pretty(&map)
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClientError::Storage(format!("create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| ClientError::Storage(format!("write {}: {}", self.path.display(), e)))
    }
}
