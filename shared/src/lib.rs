//! Shared utilities and common types for the health portal verification core
//!
//! This crate provides common functionality used across all workspace crates:
//! - Configuration types (OTP timings, storage backend, logging)
//! - The error response structure and stable error codes
//! - Format validators for mobile numbers and email addresses
//! - Field-level validation error collection

pub mod config;
pub mod errors;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{AppConfig, Environment, LoggingConfig, LogFormat, OtpConfig, StorageBackend, StorageConfig};
pub use errors::{error_codes, ErrorResponse, IntoErrorResponse};
pub use utils::{email, phone, validation};
