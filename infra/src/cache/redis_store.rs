//! Redis-backed key-value store

use async_trait::async_trait;

use hp_core::services::verification::KeyValueStoreTrait;

use super::redis_client::RedisClient;

/// Store keeping each entry as a plain Redis string, optionally under a
/// common key prefix
#[derive(Clone)]
pub struct RedisKeyValueStore {
    client: RedisClient,
    key_prefix: String,
}

impl RedisKeyValueStore {
    pub fn new(client: RedisClient, key_prefix: Option<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.unwrap_or_default(),
        }
    }

    pub fn client(&self) -> &RedisClient {
        &self.client
    }

    pub(crate) fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl KeyValueStoreTrait for RedisKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        self.client.get(&self.full_key(key)).await.map_err(|e| e.to_string())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.client.set(&self.full_key(key), value).await.map_err(|e| e.to_string())
    }

    async fn remove(&self, key: &str) -> Result<(), String> {
        self.client
            .delete(&self.full_key(key))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
