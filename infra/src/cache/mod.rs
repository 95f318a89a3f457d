//! Key-value stores backing rate-limit and session persistence
//!
//! [`connect_store`] builds the backend selected by [`StorageConfig`].

pub mod file_store;
pub mod memory_store;
pub mod redis_client;
pub mod redis_store;


pub use file_store::FileKeyValueStore;
pub use memory_store::MemoryKeyValueStore;
pub use redis_client::RedisClient;
pub use redis_store::RedisKeyValueStore;

use async_trait::async_trait;
use hp_core::services::verification::KeyValueStoreTrait;
use hp_shared::{StorageBackend, StorageConfig};
use tracing::info;

use crate::InfrastructureError;

/// Store selected at startup
#[derive(Clone)]
pub enum StoreBackend {
    Memory(MemoryKeyValueStore),
    File(FileKeyValueStore),
    Redis(RedisKeyValueStore),
}

impl StoreBackend {
    pub fn kind(&self) -> StorageBackend {
        match self {
            StoreBackend::Memory(_) => StorageBackend::Memory,
            StoreBackend::File(_) => StorageBackend::File,
            StoreBackend::Redis(_) => StorageBackend::Redis,
        }
    }
}

/// Open the configured store. Redis must answer a PING before it is used.
pub async fn connect_store(config: &StorageConfig) -> Result<StoreBackend, InfrastructureError> {
    let store = match config.backend {
        StorageBackend::Memory => StoreBackend::Memory(MemoryKeyValueStore::new()),
        StorageBackend::File => StoreBackend::File(FileKeyValueStore::open(&config.file_path).await?),
        StorageBackend::Redis => {
            let client = RedisClient::new(&config.redis_url).await?;
            if !client.health_check().await? {
                return Err(InfrastructureError::General("Redis health check failed".to_string()));
            }
            StoreBackend::Redis(RedisKeyValueStore::new(client, config.key_prefix.clone()))
        }
    };

    info!(event = "store_connected", backend = ?store.kind(), "Key-value store ready");
    Ok(store)
}

#[async_trait]
impl KeyValueStoreTrait for StoreBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        match self {
            StoreBackend::Memory(store) => store.get(key).await,
            StoreBackend::File(store) => store.get(key).await,
            StoreBackend::Redis(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), String> {
        match self {
            StoreBackend::Memory(store) => store.set(key, value).await,
            StoreBackend::File(store) => store.set(key, value).await,
            StoreBackend::Redis(store) => store.set(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<(), String> {
        match self {
            StoreBackend::Memory(store) => store.remove(key).await,
            StoreBackend::File(store) => store.remove(key).await,
            StoreBackend::Redis(store) => store.remove(key).await,
        }
    }
}
