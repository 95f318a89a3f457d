//! Development OTP gateway
//!
//! Issues codes locally instead of delivering them. Codes are printed to
//! the console when enabled and can be read back with [`MockOtpGateway::last_code`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use hp_core::domain::entities::{ChannelKind, VerificationContext, CODE_LENGTH};
use hp_core::services::countdown::TimeSource;
use hp_core::services::verification::{
    OtpGatewayTrait, SendCodeFailure, SendCodeReceipt, SessionTokens, VerifyCodeFailure, VerifyCodeReceipt,
};

/// Invalid attempts the gateway accepts per issued code
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Lifetime of an issued code
pub const DEFAULT_CODE_TTL_SECONDS: i64 = 300;

#[derive(Debug, Clone)]
struct IssuedCode {
    code: String,
    channel: ChannelKind,
    context: VerificationContext,
    value: String,
    attempts_remaining: u32,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct GatewayState {
    /// Keyed by correlation token
    issued: HashMap<String, IssuedCode>,
    /// Send timestamps per (channel, value) inside the current window
    sends: HashMap<(ChannelKind, String), Vec<DateTime<Utc>>>,
}

/// Limit on sends per destination within a sliding window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendLimit {
    pub max_sends: usize,
    pub window_seconds: i64,
}

/// Local gateway for development and tests. Clones share issued codes.
#[derive(Clone)]
pub struct MockOtpGateway {
    clock: Arc<dyn TimeSource>,
    state: Arc<Mutex<GatewayState>>,
    sent_count: Arc<AtomicU64>,
    simulate_failure: Arc<AtomicBool>,
    fixed_code: Option<String>,
    registered: Option<HashSet<String>>,
    send_limit: Option<SendLimit>,
    attempts: u32,
    code_ttl_seconds: i64,
    console_output: bool,
}

impl MockOtpGateway {
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(GatewayState::default())),
            sent_count: Arc::new(AtomicU64::new(0)),
            simulate_failure: Arc::new(AtomicBool::new(false)),
            fixed_code: None,
            registered: None,
            send_limit: None,
            attempts: DEFAULT_ATTEMPTS,
            code_ttl_seconds: DEFAULT_CODE_TTL_SECONDS,
            console_output: false,
        }
    }

    /// Issue `code` on every send instead of a random one
    pub fn with_fixed_code(mut self, code: impl Into<String>) -> Self {
        self.fixed_code = Some(code.into());
        self
    }

    /// Only these values may request login or password-reset codes
    pub fn with_registered<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registered = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_send_limit(mut self, max_sends: usize, window_seconds: i64) -> Self {
        self.send_limit = Some(SendLimit {
            max_sends,
            window_seconds,
        });
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_code_ttl(mut self, seconds: i64) -> Self {
        self.code_ttl_seconds = seconds;
        self
    }

    /// Print issued codes to stdout
    pub fn with_console_output(mut self, enabled: bool) -> Self {
        self.console_output = enabled;
        self
    }

    /// Make every call fail with a server error
    pub fn set_simulate_failure(&self, simulate: bool) {
        self.simulate_failure.store(simulate, Ordering::SeqCst);
    }

    /// Total codes issued
    pub fn sent_count(&self) -> u64 {
        self.sent_count.load(Ordering::SeqCst)
    }

    /// Most recent outstanding code for `value` on `channel`
    pub fn last_code(&self, channel: ChannelKind, value: &str) -> Option<String> {
        self.lock()
            .issued
            .values()
            .filter(|issued| issued.channel == channel && issued.value == value)
            .max_by_key(|issued| issued.expires_at)
            .map(|issued| issued.code.clone())
    }

    fn lock(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn generate_code(&self) -> String {
        match &self.fixed_code {
            Some(code) => code.clone(),
            None => {
                let upper = 10u32.pow(CODE_LENGTH as u32);
                format!("{:0width$}", rand::thread_rng().gen_range(0..upper), width = CODE_LENGTH)
            }
        }
    }

    /// Record a send for `key`, or report how long until the window frees up
    fn check_send_limit(&self, state: &mut GatewayState, key: (ChannelKind, String), now: DateTime<Utc>) -> Result<(), i64> {
        let Some(limit) = self.send_limit else {
            return Ok(());
        };
        let window = Duration::seconds(limit.window_seconds);
        let sends = state.sends.entry(key).or_default();
        sends.retain(|sent| *sent + window > now);

        if sends.len() >= limit.max_sends {
            let oldest = sends.iter().min().copied().unwrap_or(now);
            return Err((oldest + window - now).num_seconds().max(1));
        }
        sends.push(now);
        Ok(())
    }

    fn session_tokens() -> SessionTokens {
        SessionTokens {
            access_token: format!("mock_access_{}", Uuid::new_v4()),
            refresh_token: Some(format!("mock_refresh_{}", Uuid::new_v4())),
        }
    }
}

#[async_trait]
impl OtpGatewayTrait for MockOtpGateway {
    async fn send_code(
        &self,
        channel: ChannelKind,
        context: VerificationContext,
        value: &str,
    ) -> Result<SendCodeReceipt, SendCodeFailure> {
        let masked = channel.mask(value);

        if !channel.is_valid_value(value) {
            return Err(SendCodeFailure::Invalid {
                message: format!("Invalid {} format", channel.label()),
            });
        }
        if self.simulate_failure.load(Ordering::SeqCst) {
            warn!(provider = "mock", channel = %channel, value = %masked, "Simulating send failure");
            return Err(SendCodeFailure::ServerError {
                message: "Simulated send failure".to_string(),
            });
        }
        if context != VerificationContext::Registration {
            if let Some(registered) = &self.registered {
                if !registered.contains(value) {
                    return Err(SendCodeFailure::NotRegistered {
                        message: format!("{} is not registered", channel.label()),
                    });
                }
            }
        }

        let now = self.clock.now();
        let code = self.generate_code();
        let correlation_token = format!("mock_{}", Uuid::new_v4());
        {
            let mut state = self.lock();
            if let Err(retry_after) = self.check_send_limit(&mut state, (channel, value.to_string()), now) {
                warn!(provider = "mock", channel = %channel, value = %masked, retry_after, "Send limit reached");
                return Err(SendCodeFailure::RateLimited {
                    retry_after_seconds: Some(retry_after),
                });
            }
            state.issued.insert(
                correlation_token.clone(),
                IssuedCode {
                    code: code.clone(),
                    channel,
                    context,
                    value: value.to_string(),
                    attempts_remaining: self.attempts,
                    expires_at: now + Duration::seconds(self.code_ttl_seconds),
                },
            );
        }
        let count = self.sent_count.fetch_add(1, Ordering::SeqCst) + 1;

        if self.console_output {
            println!("\n{}", "=".repeat(60));
            println!("MOCK OTP GATEWAY - CODE #{}", count);
            println!("{}", "=".repeat(60));
            println!("Channel: {} ({})", channel.label(), context);
            println!("To: {}", value);
            println!("Code: {}", code);
            println!("{}\n", "=".repeat(60));
        }

        info!(
            target: "otp_gateway",
            provider = "mock",
            channel = %channel,
            context = %context,
            value = %masked,
            "Code issued (mock)"
        );

        Ok(SendCodeReceipt {
            correlation_token,
            message: format!("Code sent to your {}", channel.label()),
        })
    }

    async fn verify_code(
        &self,
        correlation_token: &str,
        code: &str,
        channel: ChannelKind,
        context: VerificationContext,
    ) -> Result<VerifyCodeReceipt, VerifyCodeFailure> {
        if self.simulate_failure.load(Ordering::SeqCst) {
            return Err(VerifyCodeFailure::ServerError {
                message: "Simulated verify failure".to_string(),
            });
        }

        let now = self.clock.now();
        let mut state = self.lock();
        let issued = match state.issued.get_mut(correlation_token) {
            Some(issued) if issued.channel == channel && issued.context == context => issued,
            _ => return Err(VerifyCodeFailure::NotFound),
        };

        if issued.expires_at <= now {
            state.issued.remove(correlation_token);
            return Err(VerifyCodeFailure::Expired);
        }

        if issued.code != code {
            issued.attempts_remaining = issued.attempts_remaining.saturating_sub(1);
            let attempts_remaining = issued.attempts_remaining;
            if attempts_remaining == 0 {
                state.issued.remove(correlation_token);
            }
            info!(target: "otp_gateway", provider = "mock", channel = %channel, attempts_remaining, "Invalid code");
            return Err(VerifyCodeFailure::InvalidCode { attempts_remaining });
        }

        state.issued.remove(correlation_token);
        info!(target: "otp_gateway", provider = "mock", channel = %channel, context = %context, "Code verified (mock)");

        Ok(VerifyCodeReceipt {
            message: format!("{} verified", channel.label()),
            session_tokens: context.persists_session().then(Self::session_tokens),
        })
    }
}
