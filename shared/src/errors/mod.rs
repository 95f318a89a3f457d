//! Error payload handed to presentation layers, and the stable codes it carries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Presentation-ready error: a stable code, a message that can be shown as
/// is, and the values a UI needs to explain a disabled control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// One of [`error_codes`]
    pub code: String,

    pub message: String,

    /// Remaining seconds, attempts left, missing fields, ...
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, serde_json::Value>,

    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach a detail value. Values that cannot be represented as JSON are skipped.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.details.insert(key.into(), value);
        }
        self
    }

    pub fn detail(&self, key: &str) -> Option<&serde_json::Value> {
        self.details.get(key)
    }
}

/// Stable error codes for every failure the verification core can surface
pub mod error_codes {
    pub const INVALID_FORMAT: &str = "INVALID_FORMAT";
    pub const INVALID_CODE: &str = "INVALID_CODE";
    pub const SUPERSEDED: &str = "SUPERSEDED";
    pub const LOCKED: &str = "LOCKED";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const RESEND_COOLDOWN: &str = "RESEND_COOLDOWN";
    pub const CODE_EXPIRED: &str = "CODE_EXPIRED";
    pub const CODE_NOT_SENT: &str = "CODE_NOT_SENT";
    pub const ALREADY_VERIFIED: &str = "ALREADY_VERIFIED";
    pub const VERIFICATION_IN_PROGRESS: &str = "VERIFICATION_IN_PROGRESS";
    pub const NOT_REGISTERED: &str = "NOT_REGISTERED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const SERVER_ERROR: &str = "SERVER_ERROR";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const VIEW_CLOSED: &str = "VIEW_CLOSED";
    pub const STEP_INCOMPLETE: &str = "STEP_INCOMPLETE";
    pub const INVALID_STEP: &str = "INVALID_STEP";
    pub const SUBMISSION_FAILED: &str = "SUBMISSION_FAILED";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Conversion of a typed error into its presentation payload
pub trait IntoErrorResponse {
    fn to_error_response(&self) -> ErrorResponse;
}
