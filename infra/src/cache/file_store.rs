//! Key-value store persisted as a single JSON document
//!
//! Every write replaces the file through a temporary sibling and a rename,
//! so a crash leaves either the old or the new document on disk.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use hp_core::services::verification::KeyValueStoreTrait;

use crate::InfrastructureError;

/// JSON-file store. Clones share the same document.
#[derive(Clone)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl FileKeyValueStore {
    /// Open the document at `path`, creating parent directories. A missing
    /// file starts empty; an unreadable one is an error.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, InfrastructureError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), entries = entries.len(), "Opened file store");

        Ok(Self {
            path,
            entries: Arc::new(Mutex::new(entries)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), InfrastructureError> {
        let document = serde_json::to_vec_pretty(entries)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, document).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), entries = entries.len(), "File store written");
        Ok(())
    }

    /// Apply `change` and write the document; the change is rolled back if
    /// the write fails.
    async fn update<F>(&self, change: F) -> Result<(), String>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self.entries.lock().await;
        let previous = entries.clone();
        change(&mut *entries);
        if *entries == previous {
            return Ok(());
        }

        if let Err(e) = self.persist(&entries).await {
            error!(path = %self.path.display(), error = %e, "Failed to write file store");
            *entries = previous;
            return Err(e.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStoreTrait for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), String> {
        self.update(|entries| {
            entries.remove(key);
        })
        .await
    }
}
