//! Configuration module
//!
//! - `environment` - Deployment environment detection
//! - `logging` - Tracing level and output format
//! - `otp` - OTP timings: cooldowns, attempt budget, lockout and rate-limit defaults
//! - `storage` - Durable key-value storage backend selection

pub mod environment;
pub mod logging;
pub mod otp;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use environment::Environment;
pub use logging::{LogFormat, LoggingConfig};
pub use otp::OtpConfig;
pub use storage::{StorageBackend, StorageConfig};

/// Complete application configuration. Missing sections take their defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: Environment,
    pub otp: OtpConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Profile defaults for `env`. Production persists to Redis; the other
    /// environments keep state in memory.
    pub fn for_environment(env: Environment) -> Self {
        let storage = match env {
            Environment::Production => StorageConfig::redis("redis://localhost:6379"),
            Environment::Development | Environment::Staging => StorageConfig::memory(),
        };
        Self {
            environment: env,
            otp: OtpConfig::default(),
            storage,
            logging: LoggingConfig::for_environment(env),
        }
    }

    pub fn development() -> Self {
        Self::for_environment(Environment::Development)
    }

    pub fn production() -> Self {
        Self::for_environment(Environment::Production)
    }

    /// Profile of the current environment with the plain variable
    /// overrides (`OTP_*`, `STORAGE_*`, `REDIS_URL`, `LOG_*`) applied
    pub fn from_env() -> Self {
        let base = Self::for_environment(Environment::from_env());
        Self {
            otp: OtpConfig::from_env(),
            storage: StorageConfig::from_env_or(base.storage),
            logging: base.logging.with_env_overrides(),
            environment: base.environment,
        }
    }
}
