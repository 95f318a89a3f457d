//! OTP verification timing configuration

use serde::{Deserialize, Serialize};

/// Timings and budgets applied by every channel verifier
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OtpConfig {
    /// Invalid-code attempts allowed per send before lockout
    pub max_attempts: u32,

    /// Seconds after a successful send before another code may be requested
    pub resend_cooldown_seconds: i64,

    /// Lockout duration when the server does not supply a wait time
    pub default_lockout_seconds: i64,

    /// Rate-limit backoff when the server does not supply a retry-after
    pub default_rate_limit_seconds: i64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            resend_cooldown_seconds: 60,
            default_lockout_seconds: 300,  // 5 minutes
            default_rate_limit_seconds: 300,  // 5 minutes
        }
    }
}

impl OtpConfig {
    /// Create from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: env_or("OTP_MAX_ATTEMPTS", defaults.max_attempts),
            resend_cooldown_seconds: env_or(
                "OTP_RESEND_COOLDOWN_SECONDS",
                defaults.resend_cooldown_seconds,
            ),
            default_lockout_seconds: env_or("OTP_LOCKOUT_SECONDS", defaults.default_lockout_seconds),
            default_rate_limit_seconds: env_or(
                "OTP_RATE_LIMIT_SECONDS",
                defaults.default_rate_limit_seconds,
            ),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
