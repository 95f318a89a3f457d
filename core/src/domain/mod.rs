//! Domain layer containing verification and registration entities.

pub mod entities;

// Re-export commonly used domain types
pub use entities::*;
