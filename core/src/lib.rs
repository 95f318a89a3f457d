//! # Health Portal Core
//!
//! Verification engine and registration workflow for the health portal.
//! This crate contains domain entities, the channel verification state
//! machine, the wizard gate, the ports implemented by the infrastructure
//! layer, and the domain error types.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use services::*;
