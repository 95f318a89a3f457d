//! Per-channel verification state machine

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::entities::{ChannelKind, ChannelState, Phase, VerificationContext};
use crate::errors::{DomainError, DomainResult, StorageError, VerificationError};
use crate::services::countdown::{clamp_hold, format_remaining, Countdown, TimeSource, MAX_HOLD_SECONDS};

use super::config::VerifierConfig;
use super::storage::{RateLimitRecord, RateLimitStore, SessionStore};
use super::traits::{KeyValueStoreTrait, OtpGatewayTrait};
use super::types::{
    ChannelStatus, CodeEntry, CodeSent, Hold, SendCodeFailure, VerificationSuccess, VerifyCodeFailure,
};

/// Clears the send flag when dropped, so a cancelled send frees the channel
struct SendingGuard<'a>(&'a AtomicBool);

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Releases `is_verifying` for the cycle that set it when dropped
struct VerifyingGuard<'a> {
    state: &'a Mutex<ChannelState>,
    epoch: u64,
}

impl Drop for VerifyingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.epoch == self.epoch {
            state.is_verifying = false;
        }
    }
}

/// Verification state machine for one `(channel, context)` pair.
///
/// All methods take `&self`; the state lock is never held across a gateway
/// call. A response is applied only if the verifier is still open and no
/// `change_value`/`reset` happened while it was in flight.
pub struct ChannelVerifier<G: OtpGatewayTrait, K: KeyValueStoreTrait> {
    channel: ChannelKind,
    context: VerificationContext,
    gateway: Arc<G>,
    rate_limits: RateLimitStore<K>,
    sessions: SessionStore<K>,
    countdown: Countdown,
    config: VerifierConfig,
    state: Mutex<ChannelState>,
    sending: AtomicBool,
    closed: AtomicBool,
}

impl<G: OtpGatewayTrait, K: KeyValueStoreTrait> ChannelVerifier<G, K> {
    /// Create a verifier in the `NotSent` phase.
    ///
    /// Call [`mount`](Self::mount) afterwards to pick up a persisted rate limit.
    pub fn new(
        channel: ChannelKind,
        context: VerificationContext,
        gateway: Arc<G>,
        store: Arc<K>,
        clock: Arc<dyn TimeSource>,
        config: VerifierConfig,
    ) -> Self {
        Self {
            channel,
            context,
            gateway,
            rate_limits: RateLimitStore::new(store.clone()),
            sessions: SessionStore::new(store),
            countdown: Countdown::new(clock),
            state: Mutex::new(ChannelState::new(config.max_attempts)),
            config,
            sending: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn channel(&self) -> ChannelKind {
        self.channel
    }

    pub fn context(&self) -> VerificationContext {
        self.context
    }

    fn state(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ChannelState) -> R) -> R {
        f(&mut *self.state())
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ChannelState {
        self.state().clone()
    }

    pub fn value(&self) -> String {
        self.state().value.clone()
    }

    pub fn phase(&self) -> Phase {
        self.state().phase
    }

    pub fn is_verified(&self) -> bool {
        self.state().is_verified()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if self.is_closed() {
            return Err(VerificationError::ViewClosed.into());
        }
        Ok(())
    }

    /// Responses are applied only to the cycle that issued them
    fn ensure_current(&self, epoch: u64, state: &ChannelState) -> DomainResult<()> {
        if self.is_closed() {
            return Err(VerificationError::ViewClosed.into());
        }
        if state.epoch != epoch {
            return Err(VerificationError::Superseded.into());
        }
        Ok(())
    }

    fn masked(&self, value: &str) -> String {
        self.channel.mask(value)
    }

    /// Restore a persisted rate limit. Elapsed or unreadable records are
    /// deleted.
    pub async fn mount(&self) -> DomainResult<()> {
        self.ensure_open()?;

        let record = match self.rate_limits.load(self.channel, self.context).await {
            Ok(record) => record,
            Err(DomainError::Storage(StorageError::Corrupt { key, message })) => {
                tracing::warn!(
                    key = %key,
                    error = %message,
                    event = "rate_limit_record_discarded",
                    "Discarding unreadable rate-limit record"
                );
                self.rate_limits.clear(self.channel, self.context).await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let Some(until) = record.and_then(|r| r.expires_at()) else {
            return Ok(());
        };

        if self.countdown.is_elapsed(until) {
            self.rate_limits.clear(self.channel, self.context).await?;
            return Ok(());
        }

        let until = until.min(self.countdown.start(MAX_HOLD_SECONDS));
        self.with_state(|state| state.rate_limit_until = Some(until));
        tracing::info!(
            channel = %self.channel,
            context = %self.context,
            remaining_seconds = self.countdown.remaining(until),
            event = "rate_limit_restored",
            "Restored persisted rate limit"
        );
        Ok(())
    }

    /// Enforce holds that block both sending and submitting
    fn check_holds(&self, state: &ChannelState) -> Result<(), VerificationError> {
        let rate_limited = self.countdown.remaining_opt(state.rate_limit_until);
        let locked = self.countdown.remaining_opt(state.lockout);
        if rate_limited > 0 && rate_limited >= locked {
            return Err(VerificationError::RateLimited {
                remaining_seconds: rate_limited,
            });
        }
        if locked > 0 {
            return Err(VerificationError::Locked {
                remaining_seconds: locked,
            });
        }
        Ok(())
    }

    /// Send a code to `value`.
    ///
    /// Format violations fail locally. A gateway rate limit is recorded and
    /// persisted; any other gateway failure leaves the phase unchanged.
    pub async fn request_code(&self, value: &str) -> DomainResult<CodeSent> {
        self.ensure_open()?;
        let value = value.trim();

        if !self.channel.is_valid_value(value) {
            tracing::debug!(
                channel = %self.channel,
                event = "invalid_format",
                "Rejected value with invalid format"
            );
            return Err(VerificationError::InvalidFormat { channel: self.channel }.into());
        }

        let epoch = self.with_state(|state| -> DomainResult<u64> {
            if state.is_verified() {
                return Err(VerificationError::AlreadyVerified.into());
            }
            if state.is_verifying {
                return Err(VerificationError::VerificationInProgress.into());
            }
            self.check_holds(state)?;
            if state.phase == Phase::AwaitingCode {
                let cooldown = self.countdown.remaining_opt(state.resend_available_at);
                if cooldown > 0 {
                    return Err(VerificationError::ResendCooldown {
                        remaining_seconds: cooldown,
                    }
                    .into());
                }
            }
            Ok(state.epoch)
        })?;

        if self.sending.swap(true, Ordering::SeqCst) {
            return Err(VerificationError::VerificationInProgress.into());
        }
        let result = {
            let _sending = SendingGuard(&self.sending);
            self.gateway.send_code(self.channel, self.context, value).await
        };

        match result {
            Ok(receipt) => {
                let resend_available_at = self.countdown.start(self.config.resend_cooldown_seconds);
                self.with_state(|state| -> DomainResult<()> {
                    self.ensure_current(epoch, state)?;
                    state.mark_sent(value, receipt.correlation_token.clone(), resend_available_at);
                    Ok(())
                })?;

                if let Err(e) = self.sessions.save_correlation_token(&receipt.correlation_token).await {
                    tracing::warn!(error = %e, event = "otp_id_persist_failed", "Failed to persist correlation token");
                }

                tracing::info!(
                    channel = %self.channel,
                    context = %self.context,
                    value = %self.masked(value),
                    event = "otp_sent",
                    "Verification code sent"
                );
                Ok(CodeSent {
                    message: receipt.message,
                    resend_available_at,
                })
            }
            Err(SendCodeFailure::RateLimited { retry_after_seconds }) => {
                let seconds = self.hold_seconds(retry_after_seconds, self.config.default_rate_limit_seconds);
                let until = self.countdown.start(seconds);
                self.with_state(|state| -> DomainResult<()> {
                    self.ensure_current(epoch, state)?;
                    state.rate_limit_until = Some(until);
                    Ok(())
                })?;
                self.persist_rate_limit(until, seconds).await;
                Err(VerificationError::RateLimited {
                    remaining_seconds: self.countdown.remaining(until),
                }
                .into())
            }
            Err(failure) => {
                let error = VerificationError::from(failure);
                tracing::warn!(
                    channel = %self.channel,
                    context = %self.context,
                    value = %self.masked(value),
                    error = %error,
                    event = "otp_send_failed",
                    "Failed to send verification code"
                );
                Err(error.into())
            }
        }
    }

    /// Request a new code for the current value once the cooldown has run out
    pub async fn resend(&self) -> DomainResult<CodeSent> {
        let value = self.with_state(|state| -> DomainResult<String> {
            if state.is_verified() {
                return Err(VerificationError::AlreadyVerified.into());
            }
            if state.value.is_empty() {
                return Err(VerificationError::NotSent.into());
            }
            Ok(state.value.clone())
        })?;
        self.request_code(&value).await
    }

    /// Gateway-supplied hold, or `default` when absent, clamped to a day
    fn hold_seconds(&self, requested: Option<i64>, default: i64) -> i64 {
        let seconds = requested.unwrap_or(default);
        let clamped = clamp_hold(seconds);
        if clamped != seconds {
            tracing::warn!(
                channel = %self.channel,
                requested_seconds = seconds,
                applied_seconds = clamped,
                event = "hold_clamped",
                "Gateway hold duration out of range"
            );
        }
        clamped
    }

    async fn persist_rate_limit(&self, until: DateTime<Utc>, retry_after: i64) {
        tracing::warn!(
            channel = %self.channel,
            context = %self.context,
            retry_after_seconds = retry_after,
            event = "rate_limited",
            "Verification rate limited"
        );
        let record = RateLimitRecord::new(until, retry_after);
        if let Err(e) = self.rate_limits.save(self.channel, self.context, &record).await {
            tracing::error!(error = %e, event = "rate_limit_persist_failed", "Failed to persist rate limit");
        }
    }

    /// Replace the code buffer with the digits in `digits` and submit once
    /// all six are present
    pub async fn submit_code(&self, digits: &str) -> DomainResult<CodeEntry> {
        self.paste_code(digits).await
    }

    /// Fill the buffer from pasted text, keeping only the first six digits
    pub async fn paste_code(&self, text: &str) -> DomainResult<CodeEntry> {
        self.edit_code(|state| {
            state.code.fill_from(text);
            Ok(())
        })?;
        self.submit_current().await
    }

    /// Set one slot. Completing the buffer submits it.
    pub async fn set_digit(&self, index: usize, digit: char) -> DomainResult<CodeEntry> {
        self.edit_code(|state| {
            if state.code.set(index, digit) {
                Ok(())
            } else {
                Err(DomainError::Validation {
                    message: format!("Invalid digit '{}' at position {}", digit, index + 1),
                })
            }
        })?;
        self.submit_current().await
    }

    pub fn clear_digit(&self, index: usize) -> DomainResult<()> {
        self.edit_code(|state| {
            if state.code.clear_slot(index) {
                Ok(())
            } else {
                Err(DomainError::Validation {
                    message: format!("Invalid code position {}", index + 1),
                })
            }
        })
    }

    fn edit_code(&self, f: impl FnOnce(&mut ChannelState) -> DomainResult<()>) -> DomainResult<()> {
        self.ensure_open()?;
        self.with_state(|state| {
            if state.is_verified() {
                return Err(VerificationError::AlreadyVerified.into());
            }
            if state.phase != Phase::AwaitingCode {
                return Err(VerificationError::NotSent.into());
            }
            if state.is_verifying {
                return Err(VerificationError::VerificationInProgress.into());
            }
            let locked = self.countdown.remaining_opt(state.lockout);
            if locked > 0 {
                return Err(VerificationError::Locked {
                    remaining_seconds: locked,
                }
                .into());
            }
            f(state)
        })
    }

    /// Submit the buffer if it is complete.
    ///
    /// An incomplete buffer yields [`CodeEntry::Incomplete`] without
    /// contacting the gateway.
    pub async fn submit_current(&self) -> DomainResult<CodeEntry> {
        self.ensure_open()?;

        let pending = self.with_state(|state| -> DomainResult<Option<(String, String, u64)>> {
            if state.is_verified() {
                return Err(VerificationError::AlreadyVerified.into());
            }
            let Some(code) = state.code.code() else {
                return Ok(None);
            };
            let token = match (&state.phase, &state.correlation_token) {
                (Phase::AwaitingCode, Some(token)) => token.clone(),
                _ => return Err(VerificationError::NotSent.into()),
            };
            let locked = self.countdown.remaining_opt(state.lockout);
            if locked > 0 {
                return Err(VerificationError::Locked {
                    remaining_seconds: locked,
                }
                .into());
            }
            if state.is_verifying {
                return Err(VerificationError::VerificationInProgress.into());
            }
            state.is_verifying = true;
            Ok(Some((token, code, state.epoch)))
        })?;
        let Some((token, code, epoch)) = pending else {
            return Ok(CodeEntry::Incomplete);
        };
        let _verifying = VerifyingGuard {
            state: &self.state,
            epoch,
        };

        let result = self
            .gateway
            .verify_code(&token, &code, self.channel, self.context)
            .await;

        match result {
            Ok(receipt) => {
                self.with_state(|state| -> DomainResult<()> {
                    self.finish_verify(epoch, state)?;
                    state.mark_verified();
                    Ok(())
                })?;
                tracing::info!(
                    channel = %self.channel,
                    context = %self.context,
                    event = "otp_verified",
                    "Channel verified"
                );

                if self.context.persists_session() {
                    if let Some(tokens) = &receipt.session_tokens {
                        if let Err(e) = self.sessions.save_session_tokens(tokens).await {
                            tracing::error!(error = %e, event = "session_persist_failed", "Failed to persist session tokens");
                        }
                    }
                }

                Ok(CodeEntry::Submitted(VerificationSuccess {
                    message: receipt.message,
                    session_tokens: receipt.session_tokens,
                }))
            }
            Err(failure) => {
                let (error, rate_limit) = self.with_state(|state| -> DomainResult<_> {
                    self.finish_verify(epoch, state)?;
                    Ok(self.apply_verify_failure(state, failure))
                })?;
                if let Some((until, seconds)) = rate_limit {
                    self.persist_rate_limit(until, seconds).await;
                }
                Err(error.into())
            }
        }
    }

    /// Release the single-flight flag and check the response is still wanted
    fn finish_verify(&self, epoch: u64, state: &mut ChannelState) -> DomainResult<()> {
        if state.epoch == epoch {
            state.is_verifying = false;
        }
        self.ensure_current(epoch, state)
    }

    /// Apply a verify failure to the state. Returns the error to surface and,
    /// for rate limits, the hold to persist.
    fn apply_verify_failure(
        &self,
        state: &mut ChannelState,
        failure: VerifyCodeFailure,
    ) -> (VerificationError, Option<(DateTime<Utc>, i64)>) {
        match failure {
            VerifyCodeFailure::InvalidCode { attempts_remaining } => {
                let until = self.countdown.start(self.config.default_lockout_seconds);
                if state.record_invalid_code(attempts_remaining, until) {
                    tracing::warn!(
                        channel = %self.channel,
                        context = %self.context,
                        event = "otp_locked",
                        "Attempt budget exhausted; channel locked"
                    );
                    let remaining_seconds = self.countdown.remaining(until);
                    return (VerificationError::Locked { remaining_seconds }, None);
                }
                tracing::info!(
                    channel = %self.channel,
                    attempt_count = state.attempt_count,
                    event = "otp_invalid",
                    "Invalid verification code"
                );
                let attempts_remaining = state.attempts_remaining();
                (VerificationError::InvalidCode { attempts_remaining }, None)
            }
            VerifyCodeFailure::Locked { wait_seconds } => {
                let until = self
                    .countdown
                    .start(self.hold_seconds(wait_seconds, self.config.default_lockout_seconds));
                state.apply_lockout(until);
                tracing::warn!(
                    channel = %self.channel,
                    context = %self.context,
                    event = "otp_locked",
                    "Gateway reported channel locked"
                );
                let remaining_seconds = self.countdown.remaining(until);
                (VerificationError::Locked { remaining_seconds }, None)
            }
            VerifyCodeFailure::RateLimited { retry_after_seconds } => {
                let seconds = self.hold_seconds(retry_after_seconds, self.config.default_rate_limit_seconds);
                let until = self.countdown.start(seconds);
                state.rate_limit_until = Some(until);
                state.return_to_send();
                let remaining_seconds = self.countdown.remaining(until);
                (VerificationError::RateLimited { remaining_seconds }, Some((until, seconds)))
            }
            VerifyCodeFailure::Expired => {
                state.return_to_send();
                tracing::info!(channel = %self.channel, event = "otp_expired", "Verification code expired");
                (VerificationError::Expired, None)
            }
            // Transient: the buffer is kept so the user can resubmit
            VerifyCodeFailure::NotFound => (VerificationError::NotFound, None),
            VerifyCodeFailure::ServerError { message } => (VerificationError::ServerError { message }, None),
            VerifyCodeFailure::NetworkError { message } => (VerificationError::NetworkError { message }, None),
        }
    }

    /// Return to `NotSent` so the value can be corrected. Any in-flight
    /// response is discarded.
    pub fn change_value(&self) -> DomainResult<()> {
        self.ensure_open()?;
        self.with_state(ChannelState::reset_for_change);
        tracing::debug!(channel = %self.channel, event = "value_change", "Channel reset for value change");
        Ok(())
    }

    /// Back to the initial state, value included
    pub fn reset(&self) {
        self.with_state(ChannelState::reset);
    }

    /// Clear holds whose time has run out. Called on every UI poll.
    pub async fn tick(&self) -> DomainResult<ChannelStatus> {
        let (lockout_elapsed, rate_limit_elapsed) = self.with_state(|state| {
            let lockout_elapsed = matches!(state.lockout, Some(until) if self.countdown.is_elapsed(until));
            if lockout_elapsed {
                state.lockout = None;
                state.attempt_count = 0;
            }
            let rate_limit_elapsed =
                matches!(state.rate_limit_until, Some(until) if self.countdown.is_elapsed(until));
            if rate_limit_elapsed {
                state.rate_limit_until = None;
            }
            (lockout_elapsed, rate_limit_elapsed)
        });

        if lockout_elapsed {
            tracing::info!(channel = %self.channel, event = "lockout_expired", "Lockout elapsed");
        }
        if rate_limit_elapsed {
            tracing::info!(channel = %self.channel, event = "rate_limit_expired", "Rate limit elapsed");
            self.rate_limits.clear(self.channel, self.context).await?;
        }
        Ok(self.status())
    }

    /// Presentation view with every disabled control explained
    pub fn status(&self) -> ChannelStatus {
        let state = self.state();
        let locked = self.countdown.remaining_opt(state.lockout);
        let rate_limited = self.countdown.remaining_opt(state.rate_limit_until);
        let hold = if rate_limited > 0 && rate_limited >= locked {
            Some(Hold::RateLimited {
                remaining_seconds: rate_limited,
            })
        } else if locked > 0 {
            Some(Hold::Locked {
                remaining_seconds: locked,
            })
        } else {
            None
        };
        let resend_in = match state.phase {
            Phase::AwaitingCode => self.countdown.remaining_opt(state.resend_available_at),
            _ => 0,
        };

        let open = !self.is_closed();
        let verified = state.is_verified();
        let idle = open && !verified && hold.is_none() && !state.is_verifying;
        let can_request = idle && state.phase == Phase::NotSent;
        let can_resend = idle && state.phase == Phase::AwaitingCode && resend_in == 0;
        let code_editable = open && state.phase == Phase::AwaitingCode && locked == 0 && !state.is_verifying;
        let can_submit = code_editable && state.code.is_complete();

        let hold_message = if !open {
            Some("Verification closed".to_string())
        } else if verified {
            None
        } else {
            match hold {
                Some(Hold::Locked { remaining_seconds }) => Some(format!(
                    "Too many invalid attempts. Try again in {}",
                    format_remaining(remaining_seconds)
                )),
                Some(Hold::RateLimited { remaining_seconds }) => Some(format!(
                    "Too many requests. Try again in {}",
                    format_remaining(remaining_seconds)
                )),
                None if state.is_verifying => Some("Verifying code...".to_string()),
                None if resend_in > 0 => Some(format!("Resend code in {}", format_remaining(resend_in))),
                None => None,
            }
        };

        ChannelStatus {
            channel: self.channel,
            phase: state.phase,
            value: state.value.clone(),
            code: *state.code.slots(),
            attempts_remaining: state.attempts_remaining(),
            hold,
            resend_in_seconds: resend_in,
            can_request,
            can_resend,
            can_submit,
            code_editable,
            is_verifying: state.is_verifying,
            hold_message,
        }
    }

    /// Stop accepting input and discard any response still in flight
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(channel = %self.channel, context = %self.context, event = "verifier_closed", "Verifier closed");
        }
    }
}
