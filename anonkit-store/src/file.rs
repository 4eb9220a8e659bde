//! Plain file-backed storage backend.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use crate::{KeyValueStore, StoreError, StoreResult};

/// Persistent key-value backend storing all entries in one JSON map file.
///
/// Writes go through a temp-file-plus-rename sequence so a crash mid-write
/// leaves the previous file intact rather than a truncated one. A mutex
/// serializes the read-modify-write cycle; readers go straight to the file.
///
/// This is the plain fallback backend: values are stored unencrypted, and
/// callers must treat secrets persisted here as at-rest-unencrypted.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a file store over the map file at `path`.
    ///
    /// The file and its parent directories are created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> StoreResult<HashMap<String, String>> {
        match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                StoreError::serialization(format!(
                    "store file {} is not a valid JSON map: {err}",
                    self.path.display()
                ))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(StoreError::io("read store file", err)),
        }
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> StoreResult<()> {
        let bytes = serde_json::to_vec(entries)
            .map_err(|err| StoreError::serialization(err.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|err| StoreError::io("create store directory", err))?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes)
            .await
            .map_err(|err| StoreError::io("write store temp file", err))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|err| StoreError::io("rename store temp file", err))?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.load().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }
}
