//! Per-channel verification state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::code_buffer::CodeBuffer;

/// Invalid-code attempts allowed per send before lockout
pub const MAX_ATTEMPTS: u32 = 3;

/// Top-level phase of a channel.
///
/// Lockout and rate limiting are time-bounded holds expressed as optional
/// expiry fields on [`ChannelState`], not as phases of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    NotSent,
    AwaitingCode,
    Verified,
}

/// Verification state of one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelState {
    /// Raw phone number or email address being verified
    pub value: String,

    pub phase: Phase,

    /// Current code input
    pub code: CodeBuffer,

    /// Invalid-code attempts since the last successful send
    pub attempt_count: u32,

    pub max_attempts: u32,

    /// Local suspension after the attempt budget is exhausted
    pub lockout: Option<DateTime<Utc>>,

    /// Earliest instant a new code may be requested; set once a code was sent
    pub resend_available_at: Option<DateTime<Utc>>,

    /// Server-declared throttle, persisted across reloads
    pub rate_limit_until: Option<DateTime<Utc>>,

    /// Token returned by the send operation, required to verify
    pub correlation_token: Option<String>,

    /// A verify call is outstanding
    pub is_verifying: bool,

    /// Bumped whenever the state is reset so late responses can be discarded
    pub epoch: u64,
}

impl ChannelState {
    /// Fresh state with the given attempt budget
    pub fn new(max_attempts: u32) -> Self {
        Self {
            value: String::new(),
            phase: Phase::NotSent,
            code: CodeBuffer::new(),
            attempt_count: 0,
            max_attempts,
            lockout: None,
            resend_available_at: None,
            rate_limit_until: None,
            correlation_token: None,
            is_verifying: false,
            epoch: 0,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.phase == Phase::Verified
    }

    /// Attempts left before lockout
    pub fn attempts_remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempt_count)
    }

    /// Return to `NotSent`, clearing the code, attempts, lockout, resend timer
    /// and correlation token. The value is kept for editing and the rate
    /// limit is kept because it is keyed by channel, not by value.
    pub fn reset_for_change(&mut self) {
        self.phase = Phase::NotSent;
        self.code.clear();
        self.attempt_count = 0;
        self.lockout = None;
        self.resend_available_at = None;
        self.correlation_token = None;
        self.is_verifying = false;
        self.epoch += 1;
    }

    /// Back to the initial state, value included. A server-declared rate
    /// limit outlives the reset.
    pub fn reset(&mut self) {
        self.reset_for_change();
        self.value.clear();
    }

    /// Record a successful send
    pub fn mark_sent(&mut self, value: &str, correlation_token: String, resend_available_at: DateTime<Utc>) {
        self.value = value.to_string();
        self.phase = Phase::AwaitingCode;
        self.code.clear();
        self.attempt_count = 0;
        self.lockout = None;
        self.resend_available_at = Some(resend_available_at);
        self.correlation_token = Some(correlation_token);
    }

    /// Record a successful verification
    pub fn mark_verified(&mut self) {
        self.phase = Phase::Verified;
        self.attempt_count = 0;
        self.lockout = None;
    }

    /// Record an invalid code. Returns `true` when the attempt budget is
    /// exhausted, in which case the lockout is set and the counter reset.
    pub fn record_invalid_code(&mut self, attempts_remaining: u32, lockout_until: DateTime<Utc>) -> bool {
        self.code.clear();
        if attempts_remaining == 0 {
            self.apply_lockout(lockout_until);
            true
        } else {
            self.attempt_count = self
                .max_attempts
                .saturating_sub(attempts_remaining)
                .min(self.max_attempts);
            false
        }
    }

    /// Suspend submission until `until`
    pub fn apply_lockout(&mut self, until: DateTime<Utc>) {
        self.code.clear();
        self.attempt_count = 0;
        self.lockout = Some(until);
        self.phase = Phase::AwaitingCode;
    }

    /// Force the channel back to the send view
    pub fn return_to_send(&mut self) {
        self.phase = Phase::NotSent;
        self.code.clear();
        self.attempt_count = 0;
        self.resend_available_at = None;
        self.correlation_token = None;
    }
}
