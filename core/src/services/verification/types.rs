//! Gateway payloads and verifier results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{ChannelKind, Phase, CODE_LENGTH};
use crate::errors::VerificationError;

/// Successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendCodeReceipt {
    /// Opaque token binding this send to its verify call
    pub correlation_token: String,
    pub message: String,
}

/// Send failures reported by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendCodeFailure {
    RateLimited { retry_after_seconds: Option<i64> },
    NotRegistered { message: String },
    Invalid { message: String },
    ServerError { message: String },
    NetworkError { message: String },
}

/// Tokens issued by a successful login verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyCodeReceipt {
    pub message: String,
    pub session_tokens: Option<SessionTokens>,
}

/// Verify failures reported by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyCodeFailure {
    InvalidCode { attempts_remaining: u32 },
    Locked { wait_seconds: Option<i64> },
    RateLimited { retry_after_seconds: Option<i64> },
    Expired,
    NotFound,
    ServerError { message: String },
    NetworkError { message: String },
}

impl From<SendCodeFailure> for VerificationError {
    fn from(failure: SendCodeFailure) -> Self {
        match failure {
            SendCodeFailure::RateLimited { retry_after_seconds } => VerificationError::RateLimited {
                remaining_seconds: retry_after_seconds.unwrap_or_default(),
            },
            SendCodeFailure::NotRegistered { message } => VerificationError::NotRegistered { message },
            SendCodeFailure::Invalid { message } => VerificationError::Rejected { message },
            SendCodeFailure::ServerError { message } => VerificationError::ServerError { message },
            SendCodeFailure::NetworkError { message } => VerificationError::NetworkError { message },
        }
    }
}

/// Outcome of a code sent by the verifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSent {
    pub message: String,
    pub resend_available_at: DateTime<Utc>,
}

/// Outcome of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationSuccess {
    pub message: String,
    pub session_tokens: Option<SessionTokens>,
}

/// Result of a code-buffer mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeEntry {
    /// Buffer not yet complete; nothing was submitted
    Incomplete,
    /// Buffer completed and the code was accepted
    Submitted(VerificationSuccess),
}

impl CodeEntry {
    pub fn is_submitted(&self) -> bool {
        matches!(self, CodeEntry::Submitted(_))
    }
}

/// Time-bounded hold that disables a channel's controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Hold {
    Locked { remaining_seconds: i64 },
    RateLimited { remaining_seconds: i64 },
}

impl Hold {
    pub fn remaining_seconds(&self) -> i64 {
        match self {
            Hold::Locked { remaining_seconds } | Hold::RateLimited { remaining_seconds } => *remaining_seconds,
        }
    }
}

/// Read-only view of a channel for presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    pub channel: ChannelKind,
    pub phase: Phase,
    pub value: String,
    pub code: [Option<char>; CODE_LENGTH],
    pub attempts_remaining: u32,
    /// The longer of lockout and rate limit, if either is active
    pub hold: Option<Hold>,
    pub resend_in_seconds: i64,
    pub can_request: bool,
    pub can_resend: bool,
    pub can_submit: bool,
    pub code_editable: bool,
    pub is_verifying: bool,
    /// Explains every disabled control
    pub hold_message: Option<String>,
}
