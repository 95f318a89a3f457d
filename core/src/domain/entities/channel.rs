//! Verification channels and the contexts that scope them.

use serde::{Deserialize, Serialize};

use hp_shared::utils::{email, phone};

/// Identity-verification medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// SMS to a mobile number
    Mobile,
    /// WhatsApp message to a mobile number
    #[serde(rename = "whatsapp")]
    WhatsApp,
    /// Email address
    Email,
}

impl ChannelKind {
    /// All channels in display order
    pub const ALL: [ChannelKind; 3] = [ChannelKind::Mobile, ChannelKind::WhatsApp, ChannelKind::Email];

    /// Label shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            ChannelKind::Mobile => "Mobile number",
            ChannelKind::WhatsApp => "WhatsApp number",
            ChannelKind::Email => "Email",
        }
    }

    /// Name used in storage keys and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Mobile => "mobile",
            ChannelKind::WhatsApp => "whatsapp",
            ChannelKind::Email => "email",
        }
    }

    /// Check `value` against this channel's format rule.
    ///
    /// Mobile and WhatsApp take a ten-digit number whose first digit is 6-9;
    /// email takes the standard `local@domain.tld` pattern.
    pub fn is_valid_value(&self, value: &str) -> bool {
        match self {
            ChannelKind::Mobile | ChannelKind::WhatsApp => phone::is_valid_mobile(value),
            ChannelKind::Email => email::is_valid_email(value),
        }
    }

    /// Mask a value of this channel for logging
    pub fn mask(&self, value: &str) -> String {
        match self {
            ChannelKind::Mobile | ChannelKind::WhatsApp => phone::mask_phone_number(value),
            ChannelKind::Email => email::mask_email(value),
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Use case a verification belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationContext {
    Registration,
    Login,
    ForgotPassword,
}

impl VerificationContext {
    /// Name used in storage keys and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationContext::Registration => "registration",
            VerificationContext::Login => "login",
            VerificationContext::ForgotPassword => "forgot_password",
        }
    }

    /// Channels that must all be verified before the context is satisfied
    pub fn required_channels(&self) -> &'static [ChannelKind] {
        match self {
            VerificationContext::Registration => &ChannelKind::ALL,
            VerificationContext::Login | VerificationContext::ForgotPassword => &[ChannelKind::Mobile],
        }
    }

    /// Whether a successful verification persists session tokens
    pub fn persists_session(&self) -> bool {
        matches!(self, VerificationContext::Login)
    }
}

impl std::fmt::Display for VerificationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
