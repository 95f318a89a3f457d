//! Durable records kept by the verifiers: rate limits, the latest
//! correlation token and login session tokens.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::entities::{ChannelKind, VerificationContext};
use crate::errors::{DomainResult, StorageError};

use super::traits::KeyValueStoreTrait;
use super::types::SessionTokens;

/// Key holding the most recent correlation token
pub const OTP_ID_KEY: &str = "otpId";
/// Key holding the login access token
pub const ACCESS_TOKEN_KEY: &str = "token";
/// Key holding the login refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Persisted rate limit for one `(channel, context)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRecord {
    /// Expiry instant in epoch milliseconds
    pub expiry_time: i64,
    /// Seconds the server asked us to wait
    pub retry_after: i64,
}

impl RateLimitRecord {
    pub fn new(expires_at: DateTime<Utc>, retry_after: i64) -> Self {
        Self {
            expiry_time: expires_at.timestamp_millis(),
            retry_after,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.expiry_time).single()
    }
}

fn backend(err: String) -> StorageError {
    StorageError::Backend { message: err }
}

/// Rate-limit records over a key-value store
pub struct RateLimitStore<K: KeyValueStoreTrait> {
    store: Arc<K>,
}

impl<K: KeyValueStoreTrait> Clone for RateLimitStore<K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<K: KeyValueStoreTrait> RateLimitStore<K> {
    pub fn new(store: Arc<K>) -> Self {
        Self { store }
    }

    /// `otpRateLimit_{channel}_{context}`
    pub fn key_for(channel: ChannelKind, context: VerificationContext) -> String {
        format!("otpRateLimit_{}_{}", channel.as_str(), context.as_str())
    }

    pub async fn load(
        &self,
        channel: ChannelKind,
        context: VerificationContext,
    ) -> DomainResult<Option<RateLimitRecord>> {
        let key = Self::key_for(channel, context);
        let Some(raw) = self.store.get(&key).await.map_err(backend)? else {
            return Ok(None);
        };

        let record: RateLimitRecord = serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            key: key.clone(),
            message: e.to_string(),
        })?;
        if record.expires_at().is_none() {
            return Err(StorageError::Corrupt {
                key,
                message: format!("expiry out of range: {}", record.expiry_time),
            }
            .into());
        }
        Ok(Some(record))
    }

    pub async fn save(
        &self,
        channel: ChannelKind,
        context: VerificationContext,
        record: &RateLimitRecord,
    ) -> DomainResult<()> {
        let json = serde_json::to_string(record).map_err(|e| StorageError::Backend {
            message: e.to_string(),
        })?;
        self.store
            .set(&Self::key_for(channel, context), &json)
            .await
            .map_err(backend)?;
        Ok(())
    }

    pub async fn clear(&self, channel: ChannelKind, context: VerificationContext) -> DomainResult<()> {
        self.store
            .remove(&Self::key_for(channel, context))
            .await
            .map_err(backend)?;
        Ok(())
    }
}

/// Correlation and session tokens over a key-value store
pub struct SessionStore<K: KeyValueStoreTrait> {
    store: Arc<K>,
}

impl<K: KeyValueStoreTrait> Clone for SessionStore<K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<K: KeyValueStoreTrait> SessionStore<K> {
    pub fn new(store: Arc<K>) -> Self {
        Self { store }
    }

    pub async fn save_correlation_token(&self, token: &str) -> DomainResult<()> {
        self.store.set(OTP_ID_KEY, token).await.map_err(backend)?;
        Ok(())
    }

    /// Token of the most recent successful send, from any step
    pub async fn correlation_token(&self) -> DomainResult<Option<String>> {
        Ok(self.store.get(OTP_ID_KEY).await.map_err(backend)?)
    }

    pub async fn save_session_tokens(&self, tokens: &SessionTokens) -> DomainResult<()> {
        self.store
            .set(ACCESS_TOKEN_KEY, &tokens.access_token)
            .await
            .map_err(backend)?;
        let refresh = match &tokens.refresh_token {
            Some(refresh) => self.store.set(REFRESH_TOKEN_KEY, refresh).await,
            None => self.store.remove(REFRESH_TOKEN_KEY).await,
        };
        refresh.map_err(backend)?;
        Ok(())
    }

    pub async fn session_tokens(&self) -> DomainResult<Option<SessionTokens>> {
        let Some(access_token) = self.store.get(ACCESS_TOKEN_KEY).await.map_err(backend)? else {
            return Ok(None);
        };
        let refresh_token = self.store.get(REFRESH_TOKEN_KEY).await.map_err(backend)?;
        Ok(Some(SessionTokens {
            access_token,
            refresh_token,
        }))
    }
}
