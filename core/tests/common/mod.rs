//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hp_core::{
    ChannelKind, KeyValueStoreTrait, ManualTimeSource, OtpGatewayTrait, PasswordHasherTrait,
    RegistrationRecord, RegistrationSinkTrait, SendCodeFailure, SendCodeReceipt, VerificationContext,
    VerifyCodeFailure, VerifyCodeReceipt,
};

pub const CORRECT_CODE: &str = "654321";

/// Gateway that behaves like the backend: one accepted code, three
/// attempts per send
#[derive(Default)]
pub struct BackendGateway {
    pub sends: Mutex<Vec<(ChannelKind, VerificationContext, String)>>,
    pub verifies: Mutex<usize>,
    attempts: Mutex<HashMap<String, u32>>,
}

impl BackendGateway {
    pub fn send_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }

    pub fn verify_count(&self) -> usize {
        *self.verifies.lock().unwrap()
    }
}

#[async_trait]
impl OtpGatewayTrait for BackendGateway {
    async fn send_code(
        &self,
        channel: ChannelKind,
        context: VerificationContext,
        value: &str,
    ) -> Result<SendCodeReceipt, SendCodeFailure> {
        let mut sends = self.sends.lock().unwrap();
        sends.push((channel, context, value.to_string()));
        Ok(SendCodeReceipt {
            correlation_token: format!("otp-{}-{}", channel, sends.len()),
            message: "OTP sent".to_string(),
        })
    }

    async fn verify_code(
        &self,
        correlation_token: &str,
        code: &str,
        _channel: ChannelKind,
        _context: VerificationContext,
    ) -> Result<VerifyCodeReceipt, VerifyCodeFailure> {
        *self.verifies.lock().unwrap() += 1;
        if code == CORRECT_CODE {
            return Ok(VerifyCodeReceipt {
                message: "Verified".to_string(),
                session_tokens: None,
            });
        }
        let mut attempts = self.attempts.lock().unwrap();
        let used = attempts.entry(correlation_token.to_string()).or_insert(0);
        *used += 1;
        Err(VerifyCodeFailure::InvalidCode {
            attempts_remaining: 3u32.saturating_sub(*used),
        })
    }
}

/// Durable storage shared across "page loads"
#[derive(Default)]
pub struct SharedStore {
    pub entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStoreTrait for SharedStore {
    async fn get(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), String> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), String> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

pub struct PrefixHasher;

impl PasswordHasherTrait for PrefixHasher {
    fn hash(&self, plaintext: &str) -> String {
        format!("h({})", plaintext)
    }
}

#[derive(Default)]
pub struct CollectingSink {
    pub records: Mutex<Vec<RegistrationRecord>>,
}

#[async_trait]
impl RegistrationSinkTrait for CollectingSink {
    async fn submit_registration(&self, record: &RegistrationRecord) -> Result<String, String> {
        self.records.lock().unwrap().push(record.clone());
        Ok(record.id.to_string())
    }
}

pub fn clock() -> Arc<ManualTimeSource> {
    Arc::new(ManualTimeSource::new(
        Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap(),
    ))
}
