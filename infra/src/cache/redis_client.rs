//! Redis client with connection retry
//!
//! Thin wrapper over a multiplexed connection. Connecting and every command
//! retry transient failures with exponential backoff.

use redis::{aio::MultiplexedConnection, AsyncCommands, Client, RedisError, RedisResult};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::InfrastructureError;

type RedisFuture<T> = Pin<Box<dyn Future<Output = RedisResult<T>> + Send>>;

/// Upper bound on a single backoff delay
const MAX_DELAY_MS: u64 = 5_000;

/// Attempt budget with doubling delays
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor).min(MAX_DELAY_MS))
    }

    /// Run `operation` until it succeeds, fails permanently, or the budget
    /// runs out
    async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> RedisResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && is_retriable_error(&e) => {
                    let delay = self.delay(attempt);
                    warn!(
                        operation = label,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Redis call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(operation = label, attempt, error = %e, "Redis call failed");
                    return Err(e);
                }
            }
        }
    }
}

/// Redis client shared by the Redis-backed store
#[derive(Clone)]
pub struct RedisClient {
    connection: MultiplexedConnection,
    retry: RetryPolicy,
}

impl RedisClient {
    pub async fn new(url: &str) -> Result<Self, InfrastructureError> {
        Self::with_retry_policy(url, RetryPolicy::default()).await
    }

    pub async fn with_retry_policy(url: &str, retry: RetryPolicy) -> Result<Self, InfrastructureError> {
        let client = Client::open(url).map_err(|e| {
            error!(url = %mask_url(url), error = %e, "Invalid Redis URL");
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection = retry
            .run("connect", || client.get_multiplexed_async_connection())
            .await?;
        info!(url = %mask_url(url), "Connected to Redis");

        Ok(Self { connection, retry })
    }

    async fn execute<T, F>(&self, label: &str, command: F) -> Result<T, InfrastructureError>
    where
        F: Fn(MultiplexedConnection) -> RedisFuture<T>,
    {
        Ok(self.retry.run(label, || command(self.connection.clone())).await?)
    }

    /// Store `value` under `key` without expiry
    pub async fn set(&self, key: &str, value: &str) -> Result<(), InfrastructureError> {
        debug!(key, "SET");
        let (key, value) = (key.to_string(), value.to_string());
        self.execute("set", move |mut conn| {
            let (key, value) = (key.clone(), value.clone());
            Box::pin(async move { conn.set::<_, _, ()>(key, value).await })
        })
        .await
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, InfrastructureError> {
        debug!(key, "GET");
        let key = key.to_string();
        self.execute("get", move |mut conn| {
            let key = key.clone();
            Box::pin(async move { conn.get::<_, Option<String>>(key).await })
        })
        .await
    }

    /// Returns `true` when the key existed
    pub async fn delete(&self, key: &str) -> Result<bool, InfrastructureError> {
        debug!(key, "DEL");
        let key = key.to_string();
        let removed: u32 = self
            .execute("del", move |mut conn| {
                let key = key.clone();
                Box::pin(async move { conn.del::<_, u32>(key).await })
            })
            .await?;
        Ok(removed > 0)
    }

    /// PING the server
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let reply: String = self
            .execute("ping", |mut conn| {
                Box::pin(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            })
            .await?;
        if reply != "PONG" {
            warn!(reply = %reply, "Unexpected PING reply");
        }
        Ok(reply == "PONG")
    }
}

/// Transient errors worth retrying
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    matches!(
        error.kind(),
        redis::ErrorKind::IoError
            | redis::ErrorKind::ClientError
            | redis::ErrorKind::BusyLoadingError
            | redis::ErrorKind::TryAgain
    )
}

/// Hide credentials in a Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}****{}", &url[..scheme_end + 3], &url[at..])
        }
        _ => url.to_string(),
    }
}
