//! Durable key-value storage configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which durable store backs rate-limit and correlation-token persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map, lost on restart
    Memory,
    /// JSON document on disk
    File,
    /// Redis server
    Redis,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "file" | "json" => Ok(StorageBackend::File),
            "redis" => Ok(StorageBackend::Redis),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Selected backend
    pub backend: StorageBackend,

    /// File path used by the `file` backend
    pub file_path: PathBuf,

    /// Redis connection URL used by the `redis` backend
    pub redis_url: String,

    /// Optional prefix applied to every Redis key
    pub key_prefix: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            file_path: PathBuf::from("data/portal-storage.json"),
            redis_url: String::from("redis://localhost:6379"),
            key_prefix: None,
        }
    }
}

impl StorageConfig {
    /// In-memory storage
    pub fn memory() -> Self {
        Self::default()
    }

    /// File-backed storage at `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackend::File,
            file_path: path.into(),
            ..Default::default()
        }
    }

    /// Redis-backed storage
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: StorageBackend::Redis,
            redis_url: url.into(),
            ..Default::default()
        }
    }

    /// Set the key prefix for all Redis keys
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Override `base` with `STORAGE_BACKEND`, `STORAGE_FILE` and `REDIS_URL`
    pub fn from_env_or(base: Self) -> Self {
        let backend = std::env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(base.backend);
        let file_path = std::env::var("STORAGE_FILE")
            .map(PathBuf::from)
            .unwrap_or(base.file_path);
        let redis_url = std::env::var("REDIS_URL").unwrap_or(base.redis_url);

        Self {
            backend,
            file_path,
            redis_url,
            key_prefix: base.key_prefix,
        }
    }
}
