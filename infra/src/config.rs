//! Layered configuration loading
//!
//! Precedence, lowest first:
//! 1. Environment profile defaults plus the plain variables read by
//!    `AppConfig::from_env` (`OTP_*`, `STORAGE_BACKEND`, `REDIS_URL`, ...)
//! 2. The per-environment TOML file, or `PORTAL_CONFIG_FILE` when set
//! 3. `PORTAL__SECTION__KEY` variables, e.g. `PORTAL__OTP__MAX_ATTEMPTS=5`

use std::path::{Path, PathBuf};

use ::config::{Config, Environment as EnvSource, File};
use hp_shared::AppConfig;
use tracing::{debug, info};

use crate::InfrastructureError;

/// Variable naming an explicit configuration file
pub const CONFIG_FILE_VAR: &str = "PORTAL_CONFIG_FILE";

/// Prefix of structured override variables
pub const ENV_PREFIX: &str = "PORTAL";

/// Load the application configuration
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok(); // Load .env file if present

    let base = AppConfig::from_env();
    let file = std::env::var(CONFIG_FILE_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(base.environment.config_file()));

    let config = layer_config(base, &file)?;
    info!(
        event = "config_loaded",
        environment = %config.environment,
        storage = ?config.storage.backend,
        max_attempts = config.otp.max_attempts,
        "Configuration loaded"
    );
    Ok(config)
}

/// Apply the optional `file` and `PORTAL__*` overrides on top of `base`
pub fn layer_config(base: AppConfig, file: &Path) -> Result<AppConfig, InfrastructureError> {
    debug!(file = %file.display(), exists = file.is_file(), "Layering configuration");

    let settings = Config::builder()
        .add_source(Config::try_from(&base)?)
        .add_source(File::from(file).required(false))
        .add_source(
            EnvSource::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<(), InfrastructureError> {
    if config.otp.max_attempts == 0 {
        return Err(InfrastructureError::Config("otp.max_attempts must be at least 1".to_string()));
    }
    if config.otp.resend_cooldown_seconds < 0
        || config.otp.default_lockout_seconds < 0
        || config.otp.default_rate_limit_seconds < 0
    {
        return Err(InfrastructureError::Config("otp durations must not be negative".to_string()));
    }
    Ok(())
}
