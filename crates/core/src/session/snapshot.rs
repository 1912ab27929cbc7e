//! Local key-value storage for the session snapshot
//!
//! Plain string values under string keys, the same contract as a browser's
//! local storage.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::warn;

use crate::{Error, Result};

/// Key the serialized identity lives under
pub const SESSION_KEY: &str = "todo_user";

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// File-backed storage: one JSON object in `<dir>/storage.json`
pub struct FileSnapshotStore {
    path: PathBuf,
    cache: RwLock<HashMap<String, String>>,
}

impl FileSnapshotStore {
    pub const FILE_NAME: &'static str = "storage.json";

    /// Open the store in `dir`.
    ///
    /// A missing file starts empty. So does one that cannot be read or
    /// parsed; it is overwritten on the next write.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(Self::FILE_NAME);
        let cache = if path.exists() {
            match tokio::fs::read(&path).await {
                Ok(content) => serde_json::from_slice(&content).unwrap_or_else(|e| {
                    warn!("Ignoring unreadable storage file {:?}: {}", path, e);
                    HashMap::new()
                }),
                Err(e) => {
                    warn!("Failed to read storage file {:?}: {}", path, e);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, cache: &HashMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(cache)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| Error::Storage(format!("failed to write {:?}: {}", self.path, e)))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut cache = self.cache.write().await;
        let mut next = cache.clone();
        next.insert(key.to_string(), value);
        // The cache only moves once the file has
        self.persist(&next).await?;
        *cache = next;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut cache = self.cache.write().await;
        if !cache.contains_key(key) {
            return Ok(());
        }
        let mut next = cache.clone();
        next.remove(key);
        self.persist(&next).await?;
        *cache = next;
        Ok(())
    }
}

/// In-process storage that forgets everything on drop
#[derive(Default)]
pub struct MemorySnapshotStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
