//! Unit tests for the channel verifier

use std::sync::Arc;
use tokio::sync::Notify;

use crate::domain::entities::{ChannelKind, Phase, VerificationContext};
use crate::errors::{DomainError, VerificationError};
use crate::services::countdown::{TimeSource, MAX_HOLD_SECONDS};
use crate::services::verification::{
    CodeEntry, Hold, RateLimitRecord, RateLimitStore, SendCodeFailure, VerifyCodeFailure,
    VerifyCodeReceipt, ACCESS_TOKEN_KEY, OTP_ID_KEY, REFRESH_TOKEN_KEY,
};

use super::mocks::*;

fn verification_error(result: Result<impl std::fmt::Debug, DomainError>) -> VerificationError {
    match result {
        Err(DomainError::Verification(e)) => e,
        other => panic!("expected verification error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_email_never_reaches_gateway() {
    let harness = Harness::new(ChannelKind::Email, VerificationContext::Registration);

    let error = verification_error(harness.verifier.request_code("not-an-email").await);

    assert_eq!(error, VerificationError::InvalidFormat { channel: ChannelKind::Email });
    assert_eq!(harness.gateway.send_count(), 0);
    assert_eq!(harness.verifier.phase(), Phase::NotSent);
}

#[tokio::test]
async fn test_invalid_mobile_prefix_rejected() {
    let harness = Harness::mobile();
    assert!(harness.verifier.request_code("5876543210").await.is_err());
    assert!(harness.verifier.request_code("98765").await.is_err());
    assert_eq!(harness.gateway.send_count(), 0);
}

#[tokio::test]
async fn test_request_code_moves_to_awaiting_code() {
    let harness = Harness::mobile();

    let sent = harness.verifier.request_code(" 9876543210 ").await.unwrap();

    let state = harness.verifier.snapshot();
    assert_eq!(state.phase, Phase::AwaitingCode);
    assert_eq!(state.value, "9876543210");
    assert_eq!(state.correlation_token.as_deref(), Some("otp-1"));
    assert!(state.code.is_empty());
    assert_eq!((sent.resend_available_at - harness.clock.now()).num_seconds(), 60);
    assert_eq!(harness.store.entry(OTP_ID_KEY).as_deref(), Some("otp-1"));
}

#[tokio::test]
async fn test_resend_waits_for_cooldown() {
    let harness = Harness::awaiting_code().await;

    let error = verification_error(harness.verifier.resend().await);
    assert_eq!(error, VerificationError::ResendCooldown { remaining_seconds: 60 });
    assert_eq!(harness.gateway.send_count(), 1);

    harness.clock.advance(60);
    harness.verifier.resend().await.unwrap();
    assert_eq!(harness.gateway.send_count(), 2);
    assert_eq!(harness.verifier.snapshot().correlation_token.as_deref(), Some("otp-2"));
}

#[tokio::test]
async fn test_resend_before_any_send() {
    let harness = Harness::mobile();
    let error = verification_error(harness.verifier.resend().await);
    assert_eq!(error, VerificationError::NotSent);
}

#[tokio::test]
async fn test_send_failure_leaves_phase_unchanged() {
    let harness = Harness::mobile();
    harness.gateway.queue_send(Err(SendCodeFailure::NotRegistered {
        message: "Mobile number not registered".to_string(),
    }));

    let error = verification_error(harness.verifier.request_code("9876543210").await);

    assert_eq!(error.code(), "NOT_REGISTERED");
    assert_eq!(harness.verifier.phase(), Phase::NotSent);
    assert!(harness.store.entry(OTP_ID_KEY).is_none());
}

#[tokio::test]
async fn test_send_rate_limit_is_persisted_and_enforced_locally() {
    let harness = Harness::mobile();
    harness.gateway.queue_send(Err(SendCodeFailure::RateLimited {
        retry_after_seconds: Some(120),
    }));

    let error = verification_error(harness.verifier.request_code("9876543210").await);
    assert_eq!(error, VerificationError::RateLimited { remaining_seconds: 120 });
    assert_eq!(harness.verifier.phase(), Phase::NotSent);

    let key = RateLimitStore::<MockKeyValueStore>::key_for(ChannelKind::Mobile, VerificationContext::Registration);
    assert_eq!(key, "otpRateLimit_mobile_registration");
    let raw = harness.store.entry(&key).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["retryAfter"], 120);
    assert_eq!(
        json["expiryTime"],
        (harness.clock.now() + chrono::Duration::seconds(120)).timestamp_millis()
    );

    // A second request fails without contacting the gateway
    harness.clock.advance(30);
    let error = verification_error(harness.verifier.request_code("9876543210").await);
    assert_eq!(error, VerificationError::RateLimited { remaining_seconds: 90 });
    assert_eq!(harness.gateway.send_count(), 1);
}

#[tokio::test]
async fn test_send_rate_limit_defaults_to_five_minutes() {
    let harness = Harness::mobile();
    harness.gateway.queue_send(Err(SendCodeFailure::RateLimited {
        retry_after_seconds: None,
    }));

    let error = verification_error(harness.verifier.request_code("9876543210").await);
    assert_eq!(error, VerificationError::RateLimited { remaining_seconds: 300 });
}

#[tokio::test]
async fn test_incomplete_buffer_does_not_submit() {
    let harness = Harness::awaiting_code().await;

    assert_eq!(harness.verifier.submit_code("12345").await.unwrap(), CodeEntry::Incomplete);
    assert_eq!(harness.verifier.submit_current().await.unwrap(), CodeEntry::Incomplete);
    assert_eq!(harness.gateway.verify_count(), 0);
}

#[tokio::test]
async fn test_submit_before_send_is_rejected() {
    let harness = Harness::mobile();

    let error = verification_error(harness.verifier.submit_code("123456").await);

    assert_eq!(error, VerificationError::NotSent);
    assert_eq!(harness.gateway.verify_count(), 0);
    assert!(harness.verifier.snapshot().code.is_empty());
}

#[tokio::test]
async fn test_code_entry_rejected_until_sent() {
    let harness = Harness::mobile();

    let error = verification_error(harness.verifier.set_digit(0, '1').await);
    assert_eq!(error, VerificationError::NotSent);
    assert!(harness.verifier.clear_digit(0).is_err());
    assert!(harness.verifier.snapshot().code.is_empty());
    assert!(!harness.verifier.status().code_editable);
}

#[tokio::test]
async fn test_successful_verification() {
    let harness = Harness::awaiting_code().await;

    let entry = harness.verifier.submit_code("123456").await.unwrap();

    assert!(entry.is_submitted());
    let state = harness.verifier.snapshot();
    assert_eq!(state.phase, Phase::Verified);
    assert_eq!(state.attempt_count, 0);
    assert_eq!(state.code.code().as_deref(), Some("123456"));
    assert!(!state.is_verifying);
    assert_eq!(
        harness.gateway.verified.lock().unwrap()[0],
        ("otp-1".to_string(), "123456".to_string())
    );
    // Registration does not persist session tokens
    assert!(harness.store.entry(ACCESS_TOKEN_KEY).is_none());
}

#[tokio::test]
async fn test_code_is_read_only_once_verified() {
    let harness = Harness::awaiting_code().await;
    harness.verifier.submit_code("123456").await.unwrap();

    let error = verification_error(harness.verifier.set_digit(0, '9').await);
    assert_eq!(error, VerificationError::AlreadyVerified);
    assert!(harness.verifier.clear_digit(0).is_err());
    assert_eq!(harness.verifier.snapshot().code.code().as_deref(), Some("123456"));
    assert!(!harness.verifier.status().code_editable);
}

#[tokio::test]
async fn test_sixth_digit_triggers_submission() {
    let harness = Harness::awaiting_code().await;

    for (i, d) in "12345".chars().enumerate() {
        assert_eq!(harness.verifier.set_digit(i, d).await.unwrap(), CodeEntry::Incomplete);
    }
    assert_eq!(harness.gateway.verify_count(), 0);

    let entry = harness.verifier.set_digit(5, '6').await.unwrap();
    assert!(entry.is_submitted());
    assert_eq!(harness.gateway.verify_count(), 1);
    assert!(harness.verifier.is_verified());
}

#[tokio::test]
async fn test_non_digit_entry_rejected() {
    let harness = Harness::awaiting_code().await;
    assert!(matches!(
        harness.verifier.set_digit(0, 'x').await,
        Err(DomainError::Validation { .. })
    ));
    assert!(harness.verifier.clear_digit(6).is_err());
}

#[tokio::test]
async fn test_paste_keeps_first_six_digits() {
    let harness = Harness::awaiting_code().await;

    harness.verifier.paste_code("12-34-56-78").await.unwrap();

    assert_eq!(harness.gateway.verified.lock().unwrap()[0].1, "123456");
}

#[tokio::test]
async fn test_attempts_count_up_then_lock() {
    let harness = Harness::awaiting_code().await;
    harness.gateway.queue_invalid(2);
    harness.gateway.queue_invalid(1);
    harness.gateway.queue_invalid(0);

    let error = verification_error(harness.verifier.submit_code("111111").await);
    assert_eq!(error, VerificationError::InvalidCode { attempts_remaining: 2 });
    let state = harness.verifier.snapshot();
    assert_eq!(state.attempt_count, 1);
    assert_eq!(state.phase, Phase::AwaitingCode);
    assert!(state.code.is_empty());

    verification_error(harness.verifier.submit_code("222222").await);
    assert_eq!(harness.verifier.snapshot().attempt_count, 2);

    let error = verification_error(harness.verifier.submit_code("333333").await);
    assert_eq!(error, VerificationError::Locked { remaining_seconds: 300 });
    let state = harness.verifier.snapshot();
    assert_eq!(state.attempt_count, 0);
    assert_eq!(state.phase, Phase::AwaitingCode);
    assert_eq!(state.lockout, Some(harness.clock.now() + chrono::Duration::seconds(300)));

    // Rejected locally while locked
    harness.clock.advance(100);
    let error = verification_error(harness.verifier.submit_code("444444").await);
    assert_eq!(error, VerificationError::Locked { remaining_seconds: 200 });
    assert_eq!(harness.gateway.verify_count(), 3);

    // Lockout elapses
    harness.clock.advance(200);
    let status = harness.verifier.tick().await.unwrap();
    assert!(status.hold.is_none());
    assert!(harness.verifier.snapshot().lockout.is_none());
    assert!(harness.verifier.submit_code("555555").await.unwrap().is_submitted());
}

#[tokio::test]
async fn test_gateway_lock_uses_wait_seconds() {
    let harness = Harness::awaiting_code().await;
    harness.gateway.queue_verify(Err(VerifyCodeFailure::Locked { wait_seconds: Some(90) }));

    let error = verification_error(harness.verifier.submit_code("123456").await);

    assert_eq!(error, VerificationError::Locked { remaining_seconds: 90 });
    assert_eq!(harness.verifier.status().hold, Some(Hold::Locked { remaining_seconds: 90 }));
}

#[tokio::test]
async fn test_expired_code_returns_to_send() {
    let harness = Harness::awaiting_code().await;
    harness.gateway.queue_verify(Err(VerifyCodeFailure::Expired));

    let error = verification_error(harness.verifier.submit_code("123456").await);

    assert_eq!(error, VerificationError::Expired);
    let state = harness.verifier.snapshot();
    assert_eq!(state.phase, Phase::NotSent);
    assert!(state.code.is_empty());
    assert!(state.correlation_token.is_none());
    // Back on the send view a new request goes straight through
    harness.verifier.request_code("9876543210").await.unwrap();
}

#[tokio::test]
async fn test_verify_rate_limit_returns_to_send() {
    let harness = Harness::awaiting_code().await;
    harness.gateway.queue_verify(Err(VerifyCodeFailure::RateLimited {
        retry_after_seconds: Some(600),
    }));

    let error = verification_error(harness.verifier.submit_code("123456").await);

    assert_eq!(error, VerificationError::RateLimited { remaining_seconds: 600 });
    assert_eq!(harness.verifier.phase(), Phase::NotSent);
    let key = RateLimitStore::<MockKeyValueStore>::key_for(ChannelKind::Mobile, VerificationContext::Registration);
    let record: RateLimitRecord = serde_json::from_str(&harness.store.entry(&key).unwrap()).unwrap();
    assert_eq!(record.retry_after, 600);
}

#[tokio::test]
async fn test_transient_failures_keep_state() {
    let harness = Harness::awaiting_code().await;
    harness.gateway.queue_verify(Err(VerifyCodeFailure::NetworkError {
        message: "connection reset".to_string(),
    }));
    harness.gateway.queue_verify(Err(VerifyCodeFailure::NotFound));

    let error = verification_error(harness.verifier.submit_code("123456").await);
    assert!(error.is_transient());
    let state = harness.verifier.snapshot();
    assert_eq!(state.phase, Phase::AwaitingCode);
    assert_eq!(state.attempt_count, 0);
    assert!(!state.is_verifying);
    assert_eq!(state.code.code().as_deref(), Some("123456"));

    let error = verification_error(harness.verifier.submit_current().await);
    assert_eq!(error, VerificationError::NotFound);

    // Manual retry with the kept buffer
    assert!(harness.verifier.submit_current().await.unwrap().is_submitted());
}

#[tokio::test]
async fn test_login_persists_session_tokens() {
    let harness = Harness::new(ChannelKind::Mobile, VerificationContext::Login);
    harness.verifier.request_code("9876543210").await.unwrap();
    harness.gateway.queue_verify(Ok(VerifyCodeReceipt {
        message: "Login successful".to_string(),
        session_tokens: Some(login_tokens()),
    }));

    let entry = harness.verifier.submit_code("123456").await.unwrap();

    match entry {
        CodeEntry::Submitted(success) => assert_eq!(success.session_tokens, Some(login_tokens())),
        CodeEntry::Incomplete => panic!("expected submission"),
    }
    assert_eq!(harness.store.entry(ACCESS_TOKEN_KEY).as_deref(), Some("access-1"));
    assert_eq!(harness.store.entry(REFRESH_TOKEN_KEY).as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn test_forgot_password_does_not_persist_session() {
    let harness = Harness::new(ChannelKind::Mobile, VerificationContext::ForgotPassword);
    harness.verifier.request_code("9876543210").await.unwrap();
    harness.gateway.queue_verify(Ok(VerifyCodeReceipt {
        message: "Verified".to_string(),
        session_tokens: Some(login_tokens()),
    }));

    harness.verifier.submit_code("123456").await.unwrap();

    assert!(harness.store.entry(ACCESS_TOKEN_KEY).is_none());
}

#[tokio::test]
async fn test_change_value_resets_channel() {
    let harness = Harness::awaiting_code().await;
    harness.gateway.queue_invalid(2);
    verification_error(harness.verifier.submit_code("111111").await);

    harness.verifier.change_value().unwrap();

    let state = harness.verifier.snapshot();
    assert_eq!(state.phase, Phase::NotSent);
    assert_eq!(state.value, "9876543210");
    assert_eq!(state.attempt_count, 0);
    assert!(state.resend_available_at.is_none());
    // No cooldown applies to the corrected value
    harness.verifier.request_code("9123456780").await.unwrap();
    assert_eq!(harness.verifier.value(), "9123456780");
}

#[tokio::test]
async fn test_mount_restores_rate_limit() {
    let harness = Harness::mobile();
    let key = RateLimitStore::<MockKeyValueStore>::key_for(ChannelKind::Mobile, VerificationContext::Registration);
    let until = harness.clock.now() + chrono::Duration::seconds(200);
    harness
        .store
        .insert(&key, &serde_json::to_string(&RateLimitRecord::new(until, 300)).unwrap());

    harness.verifier.mount().await.unwrap();

    let status = harness.verifier.status();
    assert_eq!(status.hold, Some(Hold::RateLimited { remaining_seconds: 200 }));
    assert!(!status.can_request);
    assert_eq!(status.hold_message.as_deref(), Some("Too many requests. Try again in 3:20"));
}

#[tokio::test]
async fn test_mount_discards_elapsed_and_corrupt_records() {
    let harness = Harness::mobile();
    let key = RateLimitStore::<MockKeyValueStore>::key_for(ChannelKind::Mobile, VerificationContext::Registration);

    let past = harness.clock.now() - chrono::Duration::seconds(1);
    harness
        .store
        .insert(&key, &serde_json::to_string(&RateLimitRecord::new(past, 300)).unwrap());
    harness.verifier.mount().await.unwrap();
    assert!(harness.store.entry(&key).is_none());
    assert!(harness.verifier.snapshot().rate_limit_until.is_none());

    harness.store.insert(&key, "{not json");
    harness.verifier.mount().await.unwrap();
    assert!(harness.store.entry(&key).is_none());
}

#[tokio::test]
async fn test_mount_surfaces_backend_failure() {
    let harness = Harness::with(
        ChannelKind::Mobile,
        VerificationContext::Login,
        MockGateway::new(),
        MockKeyValueStore::failing(),
    );
    assert!(matches!(harness.verifier.mount().await, Err(DomainError::Storage(_))));
}

#[tokio::test]
async fn test_tick_clears_elapsed_rate_limit() {
    let harness = Harness::mobile();
    harness.gateway.queue_send(Err(SendCodeFailure::RateLimited {
        retry_after_seconds: Some(10),
    }));
    let _ = harness.verifier.request_code("9876543210").await;
    let key = RateLimitStore::<MockKeyValueStore>::key_for(ChannelKind::Mobile, VerificationContext::Registration);
    assert!(harness.store.entry(&key).is_some());

    harness.clock.advance(5);
    let status = harness.verifier.tick().await.unwrap();
    assert_eq!(status.hold, Some(Hold::RateLimited { remaining_seconds: 5 }));

    harness.clock.advance(5);
    let status = harness.verifier.tick().await.unwrap();
    assert!(status.hold.is_none());
    assert!(status.can_request);
    assert!(harness.store.entry(&key).is_none());
}

#[tokio::test]
async fn test_longer_hold_governs_status() {
    let harness = Harness::awaiting_code().await;
    harness.gateway.queue_verify(Err(VerifyCodeFailure::Locked { wait_seconds: Some(60) }));
    verification_error(harness.verifier.submit_code("123456").await);

    let status = harness.verifier.status();
    assert_eq!(status.hold, Some(Hold::Locked { remaining_seconds: 60 }));
    assert_eq!(
        status.hold_message.as_deref(),
        Some("Too many invalid attempts. Try again in 1:00")
    );
    assert!(!status.can_submit);
    assert!(!status.can_resend);
}

#[tokio::test]
async fn test_resend_countdown_is_explained() {
    let harness = Harness::awaiting_code().await;
    harness.clock.advance(15);

    let status = harness.verifier.status();

    assert_eq!(status.resend_in_seconds, 45);
    assert!(!status.can_resend);
    assert_eq!(status.hold_message.as_deref(), Some("Resend code in 0:45"));
}

#[tokio::test]
async fn test_concurrent_submission_rejected() {
    let gate = Arc::new(Notify::new());
    let harness = Harness::with(
        ChannelKind::Mobile,
        VerificationContext::Registration,
        MockGateway::gated(gate.clone()),
        MockKeyValueStore::new(),
    );
    harness.verifier.request_code("9876543210").await.unwrap();

    let (first, second) = tokio::join!(harness.verifier.submit_code("123456"), async {
        tokio::task::yield_now().await;
        let second = harness.verifier.submit_current().await;
        gate.notify_one();
        second
    });

    assert!(first.unwrap().is_submitted());
    assert_eq!(verification_error(second), VerificationError::VerificationInProgress);
    assert_eq!(harness.gateway.verify_count(), 1);
}

#[tokio::test]
async fn test_response_after_close_is_discarded() {
    let gate = Arc::new(Notify::new());
    let harness = Harness::with(
        ChannelKind::Mobile,
        VerificationContext::Registration,
        MockGateway::gated(gate.clone()),
        MockKeyValueStore::new(),
    );
    harness.verifier.request_code("9876543210").await.unwrap();

    let (result, _) = tokio::join!(harness.verifier.submit_code("123456"), async {
        tokio::task::yield_now().await;
        harness.verifier.close();
        gate.notify_one();
    });

    assert_eq!(verification_error(result), VerificationError::ViewClosed);
    assert!(!harness.verifier.is_verified());
    let error = verification_error(harness.verifier.request_code("9876543210").await);
    assert_eq!(error, VerificationError::ViewClosed);
}

#[tokio::test]
async fn test_response_after_change_is_superseded() {
    let gate = Arc::new(Notify::new());
    let harness = Harness::with(
        ChannelKind::Mobile,
        VerificationContext::Registration,
        MockGateway::gated(gate.clone()),
        MockKeyValueStore::new(),
    );
    harness.verifier.request_code("9876543210").await.unwrap();

    let (result, _) = tokio::join!(harness.verifier.submit_code("123456"), async {
        tokio::task::yield_now().await;
        harness.verifier.change_value().unwrap();
        gate.notify_one();
    });

    assert_eq!(verification_error(result), VerificationError::Superseded);
    let state = harness.verifier.snapshot();
    assert_eq!(state.phase, Phase::NotSent);
    assert!(!state.is_verifying);
}

#[tokio::test]
async fn test_oversized_send_rate_limit_is_clamped() {
    let harness = Harness::mobile();
    harness.gateway.queue_send(Err(SendCodeFailure::RateLimited {
        retry_after_seconds: Some(i64::MAX),
    }));

    let error = verification_error(harness.verifier.request_code("9876543210").await);

    assert_eq!(error, VerificationError::RateLimited { remaining_seconds: MAX_HOLD_SECONDS });
    let until = harness.verifier.snapshot().rate_limit_until.unwrap();
    assert_eq!((until - harness.clock.now()).num_seconds(), MAX_HOLD_SECONDS);
    let key = RateLimitStore::<MockKeyValueStore>::key_for(ChannelKind::Mobile, VerificationContext::Registration);
    let record: RateLimitRecord = serde_json::from_str(&harness.store.entry(&key).unwrap()).unwrap();
    assert_eq!(record.retry_after, MAX_HOLD_SECONDS);
}

#[tokio::test]
async fn test_oversized_verify_holds_are_clamped() {
    let harness = Harness::awaiting_code().await;
    harness.gateway.queue_verify(Err(VerifyCodeFailure::Locked {
        wait_seconds: Some(i64::MAX / 2),
    }));

    let error = verification_error(harness.verifier.submit_code("123456").await);
    assert_eq!(error, VerificationError::Locked { remaining_seconds: MAX_HOLD_SECONDS });

    harness.clock.advance(MAX_HOLD_SECONDS);
    harness.verifier.tick().await.unwrap();
    harness.gateway.queue_verify(Err(VerifyCodeFailure::RateLimited {
        retry_after_seconds: Some(i64::MAX),
    }));

    let error = verification_error(harness.verifier.submit_code("123456").await);
    assert_eq!(error, VerificationError::RateLimited { remaining_seconds: MAX_HOLD_SECONDS });
    assert_eq!(harness.verifier.phase(), Phase::NotSent);
}

#[tokio::test]
async fn test_negative_hold_is_treated_as_elapsed() {
    let harness = Harness::awaiting_code().await;
    harness.gateway.queue_verify(Err(VerifyCodeFailure::Locked {
        wait_seconds: Some(-30),
    }));

    let error = verification_error(harness.verifier.submit_code("123456").await);

    assert_eq!(error, VerificationError::Locked { remaining_seconds: 0 });
    assert!(harness.verifier.status().code_editable);
}

#[tokio::test]
async fn test_dropped_submission_releases_channel() {
    let gate = Arc::new(Notify::new());
    let harness = Harness::with(
        ChannelKind::Mobile,
        VerificationContext::Registration,
        MockGateway::gated(gate.clone()),
        MockKeyValueStore::new(),
    );
    harness.verifier.request_code("9876543210").await.unwrap();

    let pending = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        harness.verifier.submit_code("123456"),
    )
    .await;
    assert!(pending.is_err());

    let status = harness.verifier.status();
    assert!(!status.is_verifying);
    assert!(status.code_editable);
    assert_ne!(status.hold_message.as_deref(), Some("Verifying code..."));

    gate.notify_one();
    let entry = harness.verifier.submit_current().await.unwrap();
    assert!(entry.is_submitted());
    assert_eq!(harness.gateway.verify_count(), 2);
}

#[tokio::test]
async fn test_dropped_send_releases_channel() {
    let gate = Arc::new(Notify::new());
    let harness = Harness::with(
        ChannelKind::Mobile,
        VerificationContext::Registration,
        MockGateway::send_gated(gate.clone()),
        MockKeyValueStore::new(),
    );

    let pending = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        harness.verifier.request_code("9876543210"),
    )
    .await;
    assert!(pending.is_err());
    assert_eq!(harness.verifier.phase(), Phase::NotSent);

    gate.notify_one();
    harness.verifier.request_code("9876543210").await.unwrap();
    assert_eq!(harness.verifier.phase(), Phase::AwaitingCode);
    assert_eq!(harness.gateway.send_count(), 2);
}
