//! Verification engine and registration workflow services.

pub mod countdown;
pub mod registration;
pub mod verification;

// Re-export commonly used types
pub use countdown::{Countdown, ManualTimeSource, SystemTimeSource, TimeSource};
pub use registration::{
    PasswordHasherTrait, RegistrationSession, RegistrationSinkTrait, RegistrationSubmission,
    SubmissionReceipt, WizardGate,
};
pub use verification::{
    ChannelStatus, ChannelVerifier, CodeEntry, CodeSent, Hold, KeyValueStoreTrait, OtpGatewayTrait,
    RateLimitRecord, RateLimitStore, SendCodeFailure, SendCodeReceipt, SessionStore, SessionTokens,
    VerificationAggregator, VerificationSuccess, VerifierConfig, VerifyCodeFailure, VerifyCodeReceipt,
};
