//! Configuration for channel verifiers

use hp_shared::OtpConfig;

use crate::domain::entities::MAX_ATTEMPTS;

/// Timing and attempt budget of a channel verifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Invalid-code attempts allowed per send
    pub max_attempts: u32,
    /// Minimum seconds between code requests
    pub resend_cooldown_seconds: i64,
    /// Lockout applied when the gateway gives no wait time
    pub default_lockout_seconds: i64,
    /// Rate limit applied when the gateway gives no retry-after
    pub default_rate_limit_seconds: i64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            resend_cooldown_seconds: 60,
            default_lockout_seconds: 300,
            default_rate_limit_seconds: 300,
        }
    }
}

impl From<&OtpConfig> for VerifierConfig {
    fn from(config: &OtpConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            resend_cooldown_seconds: config.resend_cooldown_seconds,
            default_lockout_seconds: config.default_lockout_seconds,
            default_rate_limit_seconds: config.default_rate_limit_seconds,
        }
    }
}
