//! # Infrastructure Layer
//!
//! Concrete adapters for the ports declared by `hp_core`:
//! - **Cache**: key-value stores (memory, JSON file, Redis) behind `KeyValueStoreTrait`
//! - **Gateway**: a development OTP gateway behind `OtpGatewayTrait`
//! - **Security**: password hashing behind `PasswordHasherTrait`
//! - **Registration**: a registration sink that records submissions in a store
//! - **Config** and **Telemetry**: layered configuration and tracing setup

// Re-export core types for convenience
pub use hp_core::errors::*;

/// Cache module - Key-value stores and the Redis client
pub mod cache;

/// Configuration loading
pub mod config;

/// OTP gateway adapters
pub mod gateway;

/// Registration sink adapters
pub mod registration;

/// Password hashing
pub mod security;

/// Tracing subscriber setup
pub mod telemetry;

pub use cache::{connect_store, FileKeyValueStore, MemoryKeyValueStore, RedisClient, RedisKeyValueStore, StoreBackend};
pub use self::config::load_config;
pub use gateway::MockOtpGateway;
pub use registration::KeyValueRegistrationSink;
pub use security::Sha256PasswordHasher;
pub use telemetry::init_tracing;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// File storage error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

impl From<::config::ConfigError> for InfrastructureError {
    fn from(error: ::config::ConfigError) -> Self {
        InfrastructureError::Config(error.to_string())
    }
}
