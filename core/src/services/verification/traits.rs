//! Ports for the OTP gateway and durable key-value storage

use async_trait::async_trait;

use crate::domain::entities::{ChannelKind, VerificationContext};

use super::types::{SendCodeFailure, SendCodeReceipt, VerifyCodeFailure, VerifyCodeReceipt};

/// Backend that sends and checks one-time codes
#[async_trait]
pub trait OtpGatewayTrait: Send + Sync {
    /// Deliver a code to `value` over `channel`
    async fn send_code(
        &self,
        channel: ChannelKind,
        context: VerificationContext,
        value: &str,
    ) -> Result<SendCodeReceipt, SendCodeFailure>;

    /// Check `code` against the send identified by `correlation_token`
    async fn verify_code(
        &self,
        correlation_token: &str,
        code: &str,
        channel: ChannelKind,
        context: VerificationContext,
    ) -> Result<VerifyCodeReceipt, VerifyCodeFailure>;
}

/// String-keyed durable storage
#[async_trait]
pub trait KeyValueStoreTrait: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, String>;
    async fn set(&self, key: &str, value: &str) -> Result<(), String>;
    /// Removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), String>;
}
