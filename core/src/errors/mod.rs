//! Domain-specific error types and error handling.

mod types;


// Re-export all error types
pub use types::{StorageError, VerificationError, WizardError};
pub use hp_shared::ErrorResponse;

use hp_shared::{error_codes, IntoErrorResponse};
use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Stable error code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation { .. } => error_codes::VALIDATION_ERROR,
            DomainError::Internal { .. } => error_codes::INTERNAL_ERROR,
            DomainError::Verification(e) => e.code(),
            DomainError::Wizard(e) => e.code(),
            DomainError::Storage(_) => error_codes::STORAGE_ERROR,
        }
    }

    /// The verification failure, if this is one
    pub fn as_verification(&self) -> Option<&VerificationError> {
        match self {
            DomainError::Verification(e) => Some(e),
            _ => None,
        }
    }
}

impl IntoErrorResponse for DomainError {
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            DomainError::Verification(e) => e.to_error_response(),
            DomainError::Wizard(e) => e.to_error_response(),
            other => ErrorResponse::new(other.code(), other.to_string()),
        }
    }
}

impl From<DomainError> for ErrorResponse {
    fn from(err: DomainError) -> Self {
        err.to_error_response()
    }
}
