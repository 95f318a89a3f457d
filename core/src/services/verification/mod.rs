//! Channel verification: the per-channel state machine, its ports and the
//! aggregator that answers whether a context's channels are all verified.

mod aggregator;
mod config;
mod service;
mod storage;
mod traits;
mod types;

#[cfg(test)]
pub(crate) mod tests;

pub use aggregator::VerificationAggregator;
pub use config::VerifierConfig;
pub use service::ChannelVerifier;
pub use storage::{
    RateLimitRecord, RateLimitStore, SessionStore, ACCESS_TOKEN_KEY, OTP_ID_KEY, REFRESH_TOKEN_KEY,
};
pub use traits::{KeyValueStoreTrait, OtpGatewayTrait};
pub use types::{
    ChannelStatus, CodeEntry, CodeSent, Hold, SendCodeFailure, SendCodeReceipt, SessionTokens,
    VerificationSuccess, VerifyCodeFailure, VerifyCodeReceipt,
};
