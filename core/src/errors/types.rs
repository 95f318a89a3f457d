//! Error families for channel verification, wizard gating and storage

use hp_shared::{error_codes, ErrorResponse, IntoErrorResponse};
use thiserror::Error;

use crate::domain::entities::{ChannelKind, WizardStep};

/// Channel verification failures.
///
/// `InvalidFormat` is resolved locally and never reaches the network;
/// `InvalidCode` is attempt-counted; `Locked` and `RateLimited` carry the
/// seconds left on their hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Invalid {} format", .channel.label())]
    InvalidFormat { channel: ChannelKind },

    #[error("Invalid verification code. {attempts_remaining} attempt(s) remaining")]
    InvalidCode { attempts_remaining: u32 },

    #[error("Too many invalid attempts. Try again in {remaining_seconds} seconds")]
    Locked { remaining_seconds: i64 },

    #[error("Too many requests. Try again in {remaining_seconds} seconds")]
    RateLimited { remaining_seconds: i64 },

    #[error("Verification code expired. Please request a new code")]
    Expired,

    #[error("Please wait {remaining_seconds} seconds before requesting a new code")]
    ResendCooldown { remaining_seconds: i64 },

    #[error("No verification code has been sent")]
    NotSent,

    #[error("Already verified")]
    AlreadyVerified,

    #[error("Verification already in progress")]
    VerificationInProgress,

    #[error("{message}")]
    NotRegistered { message: String },

    #[error("{message}")]
    Rejected { message: String },

    #[error("Verification request not found")]
    NotFound,

    #[error("Server error: {message}")]
    ServerError { message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Verification view was closed")]
    ViewClosed,

    #[error("Response belongs to a superseded request")]
    Superseded,
}

impl VerificationError {
    pub fn code(&self) -> &'static str {
        match self {
            VerificationError::InvalidFormat { .. } => error_codes::INVALID_FORMAT,
            VerificationError::InvalidCode { .. } => error_codes::INVALID_CODE,
            VerificationError::Locked { .. } => error_codes::LOCKED,
            VerificationError::RateLimited { .. } => error_codes::RATE_LIMITED,
            VerificationError::Expired => error_codes::CODE_EXPIRED,
            VerificationError::ResendCooldown { .. } => error_codes::RESEND_COOLDOWN,
            VerificationError::NotSent => error_codes::CODE_NOT_SENT,
            VerificationError::AlreadyVerified => error_codes::ALREADY_VERIFIED,
            VerificationError::VerificationInProgress => error_codes::VERIFICATION_IN_PROGRESS,
            VerificationError::NotRegistered { .. } => error_codes::NOT_REGISTERED,
            VerificationError::Rejected { .. } => error_codes::VALIDATION_ERROR,
            VerificationError::NotFound => error_codes::NOT_FOUND,
            VerificationError::ServerError { .. } => error_codes::SERVER_ERROR,
            VerificationError::NetworkError { .. } => error_codes::NETWORK_ERROR,
            VerificationError::ViewClosed => error_codes::VIEW_CLOSED,
            VerificationError::Superseded => error_codes::SUPERSEDED,
        }
    }

    /// Transient failures leave the channel unchanged so the user can retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            VerificationError::NotFound
                | VerificationError::ServerError { .. }
                | VerificationError::NetworkError { .. }
        )
    }
}

impl IntoErrorResponse for VerificationError {
    fn to_error_response(&self) -> ErrorResponse {
        let response = ErrorResponse::new(self.code(), self.to_string());
        match self {
            VerificationError::InvalidFormat { channel } => response.with_detail("channel", channel),
            VerificationError::InvalidCode { attempts_remaining } => {
                response.with_detail("attempts_remaining", attempts_remaining)
            }
            VerificationError::Locked { remaining_seconds }
            | VerificationError::RateLimited { remaining_seconds }
            | VerificationError::ResendCooldown { remaining_seconds } => {
                response.with_detail("remaining_seconds", remaining_seconds)
            }
            _ => response,
        }
    }
}

/// Wizard gating and submission failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    /// The current step's readiness predicate does not hold; `missing` names
    /// each unmet sub-condition in display order
    #[error("{message}")]
    StepIncomplete {
        step: WizardStep,
        missing: Vec<String>,
        message: String,
    },

    #[error("Operation not available on step {}", .step.number())]
    InvalidStep { step: WizardStep },

    #[error("Registration wizard is closed")]
    Closed,

    #[error("Registration failed: {message}")]
    SubmissionFailed { message: String },
}

impl WizardError {
    pub fn code(&self) -> &'static str {
        match self {
            WizardError::StepIncomplete { .. } => error_codes::STEP_INCOMPLETE,
            WizardError::InvalidStep { .. } | WizardError::Closed => error_codes::INVALID_STEP,
            WizardError::SubmissionFailed { .. } => error_codes::SUBMISSION_FAILED,
        }
    }

    /// Build a `StepIncomplete` whose message reads `"{prefix}: a, b"`
    pub fn incomplete(step: WizardStep, prefix: &str, missing: Vec<String>) -> Self {
        let message = format!("{}: {}", prefix, missing.join(", "));
        WizardError::StepIncomplete {
            step,
            missing,
            message,
        }
    }
}

impl IntoErrorResponse for WizardError {
    fn to_error_response(&self) -> ErrorResponse {
        let response = ErrorResponse::new(self.code(), self.to_string());
        match self {
            WizardError::StepIncomplete { step, missing, .. } => response
                .with_detail("step", step.number())
                .with_detail("missing", missing),
            WizardError::InvalidStep { step } => response.with_detail("step", step.number()),
            _ => response,
        }
    }
}

/// Durable storage failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage backend error: {message}")]
    Backend { message: String },

    #[error("Corrupt record under key {key}: {message}")]
    Corrupt { key: String, message: String },
}
