use std::sync::Arc;

use hp_core::domain::entities::{ChannelKind, VerificationContext};
use hp_core::services::countdown::ManualTimeSource;
use hp_core::services::verification::{OtpGatewayTrait, SendCodeFailure, VerifyCodeFailure};

use crate::gateway::MockOtpGateway;

const MOBILE: &str = "9876543210";

fn gateway() -> (MockOtpGateway, Arc<ManualTimeSource>) {
    let clock = Arc::new(ManualTimeSource::default());
    (MockOtpGateway::new(clock.clone()).with_fixed_code("123456"), clock)
}

#[tokio::test]
async fn test_send_then_verify() {
    let (gateway, _) = gateway();
    let receipt = gateway
        .send_code(ChannelKind::Mobile, VerificationContext::Registration, MOBILE)
        .await
        .unwrap();
    assert!(receipt.correlation_token.starts_with("mock_"));
    assert_eq!(gateway.sent_count(), 1);

    let verified = gateway
        .verify_code(&receipt.correlation_token, "123456", ChannelKind::Mobile, VerificationContext::Registration)
        .await
        .unwrap();
    assert!(verified.session_tokens.is_none());

    // A verified code cannot be reused
    let reused = gateway
        .verify_code(&receipt.correlation_token, "123456", ChannelKind::Mobile, VerificationContext::Registration)
        .await;
    assert_eq!(reused.unwrap_err(), VerifyCodeFailure::NotFound);
}

#[tokio::test]
async fn test_random_codes_are_six_digits() {
    let clock = Arc::new(ManualTimeSource::default());
    let gateway = MockOtpGateway::new(clock);
    gateway
        .send_code(ChannelKind::Email, VerificationContext::Registration, "asha@example.org")
        .await
        .unwrap();

    let code = gateway.last_code(ChannelKind::Email, "asha@example.org").unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_invalid_value_rejected() {
    let (gateway, _) = gateway();
    let result = gateway
        .send_code(ChannelKind::Mobile, VerificationContext::Registration, "12345")
        .await;
    assert!(matches!(result, Err(SendCodeFailure::Invalid { .. })));
    assert_eq!(gateway.sent_count(), 0);
}

#[tokio::test]
async fn test_wrong_codes_count_down_to_zero() {
    let (gateway, _) = gateway();
    let receipt = gateway
        .send_code(ChannelKind::Mobile, VerificationContext::Registration, MOBILE)
        .await
        .unwrap();

    for expected in [2, 1, 0] {
        let result = gateway
            .verify_code(&receipt.correlation_token, "000000", ChannelKind::Mobile, VerificationContext::Registration)
            .await;
        assert_eq!(result.unwrap_err(), VerifyCodeFailure::InvalidCode { attempts_remaining: expected });
    }

    let result = gateway
        .verify_code(&receipt.correlation_token, "123456", ChannelKind::Mobile, VerificationContext::Registration)
        .await;
    assert_eq!(result.unwrap_err(), VerifyCodeFailure::NotFound);
}

#[tokio::test]
async fn test_code_expires() {
    let (gateway, clock) = gateway();
    let gateway = gateway.with_code_ttl(120);
    let receipt = gateway
        .send_code(ChannelKind::WhatsApp, VerificationContext::Registration, MOBILE)
        .await
        .unwrap();

    clock.advance(120);
    let result = gateway
        .verify_code(&receipt.correlation_token, "123456", ChannelKind::WhatsApp, VerificationContext::Registration)
        .await;
    assert_eq!(result.unwrap_err(), VerifyCodeFailure::Expired);
}

#[tokio::test]
async fn test_token_bound_to_channel() {
    let (gateway, _) = gateway();
    let receipt = gateway
        .send_code(ChannelKind::Mobile, VerificationContext::Registration, MOBILE)
        .await
        .unwrap();

    let result = gateway
        .verify_code(&receipt.correlation_token, "123456", ChannelKind::WhatsApp, VerificationContext::Registration)
        .await;
    assert_eq!(result.unwrap_err(), VerifyCodeFailure::NotFound);
}

#[tokio::test]
async fn test_send_limit_reports_retry_after() {
    let (gateway, clock) = gateway();
    let gateway = gateway.with_send_limit(2, 600);

    for _ in 0..2 {
        gateway
            .send_code(ChannelKind::Mobile, VerificationContext::Registration, MOBILE)
            .await
            .unwrap();
        clock.advance(100);
    }

    let result = gateway
        .send_code(ChannelKind::Mobile, VerificationContext::Registration, MOBILE)
        .await;
    assert_eq!(
        result.unwrap_err(),
        SendCodeFailure::RateLimited {
            retry_after_seconds: Some(400)
        }
    );

    clock.advance(400);
    assert!(gateway
        .send_code(ChannelKind::Mobile, VerificationContext::Registration, MOBILE)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_login_requires_registered_number_and_issues_tokens() {
    let (gateway, _) = gateway();
    let gateway = gateway.with_registered([MOBILE]);

    let unknown = gateway
        .send_code(ChannelKind::Mobile, VerificationContext::Login, "9123456780")
        .await;
    assert!(matches!(unknown, Err(SendCodeFailure::NotRegistered { .. })));

    let receipt = gateway
        .send_code(ChannelKind::Mobile, VerificationContext::Login, MOBILE)
        .await
        .unwrap();
    let verified = gateway
        .verify_code(&receipt.correlation_token, "123456", ChannelKind::Mobile, VerificationContext::Login)
        .await
        .unwrap();

    let tokens = verified.session_tokens.unwrap();
    assert!(tokens.access_token.starts_with("mock_access_"));
    assert!(tokens.refresh_token.is_some());
}

#[tokio::test]
async fn test_simulated_failure() {
    let (gateway, _) = gateway();
    gateway.set_simulate_failure(true);
    let result = gateway
        .send_code(ChannelKind::Mobile, VerificationContext::Registration, MOBILE)
        .await;
    assert!(matches!(result, Err(SendCodeFailure::ServerError { .. })));

    gateway.set_simulate_failure(false);
    assert!(gateway
        .send_code(ChannelKind::Mobile, VerificationContext::Registration, MOBILE)
        .await
        .is_ok());
}
