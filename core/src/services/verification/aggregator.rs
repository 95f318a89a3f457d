//! Verification aggregator: the channel verifiers of one session

use std::sync::Arc;

use crate::domain::entities::{ChannelKind, VerificationContext, VerifiedContacts};
use crate::errors::DomainResult;
use crate::services::countdown::TimeSource;

use super::config::VerifierConfig;
use super::service::ChannelVerifier;
use super::traits::{KeyValueStoreTrait, OtpGatewayTrait};
use super::types::ChannelStatus;

/// Owns one verifier per channel required by its context
pub struct VerificationAggregator<G: OtpGatewayTrait, K: KeyValueStoreTrait> {
    context: VerificationContext,
    verifiers: Vec<ChannelVerifier<G, K>>,
}

impl<G: OtpGatewayTrait, K: KeyValueStoreTrait> VerificationAggregator<G, K> {
    /// Build and mount the verifiers required by `context`
    pub async fn mount(
        context: VerificationContext,
        gateway: Arc<G>,
        store: Arc<K>,
        clock: Arc<dyn TimeSource>,
        config: VerifierConfig,
    ) -> DomainResult<Self> {
        let verifiers = context
            .required_channels()
            .iter()
            .map(|&channel| {
                ChannelVerifier::new(
                    channel,
                    context,
                    gateway.clone(),
                    store.clone(),
                    clock.clone(),
                    config.clone(),
                )
            })
            .collect::<Vec<_>>();

        for verifier in &verifiers {
            verifier.mount().await?;
        }

        tracing::debug!(
            context = %context,
            channels = verifiers.len(),
            event = "verification_mounted",
            "Verification channels mounted"
        );
        Ok(Self { context, verifiers })
    }

    /// Mobile, WhatsApp and email
    pub async fn for_registration(
        gateway: Arc<G>,
        store: Arc<K>,
        clock: Arc<dyn TimeSource>,
        config: VerifierConfig,
    ) -> DomainResult<Self> {
        Self::mount(VerificationContext::Registration, gateway, store, clock, config).await
    }

    /// Mobile only
    pub async fn for_login(
        gateway: Arc<G>,
        store: Arc<K>,
        clock: Arc<dyn TimeSource>,
        config: VerifierConfig,
    ) -> DomainResult<Self> {
        Self::mount(VerificationContext::Login, gateway, store, clock, config).await
    }

    /// Mobile only
    pub async fn for_forgot_password(
        gateway: Arc<G>,
        store: Arc<K>,
        clock: Arc<dyn TimeSource>,
        config: VerifierConfig,
    ) -> DomainResult<Self> {
        Self::mount(VerificationContext::ForgotPassword, gateway, store, clock, config).await
    }

    pub fn context(&self) -> VerificationContext {
        self.context
    }

    pub fn channel(&self, kind: ChannelKind) -> Option<&ChannelVerifier<G, K>> {
        self.verifiers.iter().find(|v| v.channel() == kind)
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelVerifier<G, K>> {
        self.verifiers.iter()
    }

    fn is_channel_verified(&self, kind: ChannelKind) -> bool {
        // A verified-looking channel with no value does not count
        self.channel(kind)
            .map(|v| {
                let state = v.snapshot();
                state.is_verified() && !state.value.trim().is_empty()
            })
            .unwrap_or(false)
    }

    /// Every channel `context` requires is verified with a non-empty value
    pub fn all_verified(&self, context: VerificationContext) -> bool {
        context
            .required_channels()
            .iter()
            .all(|&kind| self.is_channel_verified(kind))
    }

    /// Required channels still unverified, in display order
    pub fn unverified_channels(&self, context: VerificationContext) -> Vec<ChannelKind> {
        context
            .required_channels()
            .iter()
            .copied()
            .filter(|&kind| !self.is_channel_verified(kind))
            .collect()
    }

    /// Verified values for the registration record, once all three are in
    pub fn verified_contacts(&self) -> Option<VerifiedContacts> {
        if !self.all_verified(VerificationContext::Registration) {
            return None;
        }
        let value = |kind| self.channel(kind).map(|v| v.value()).unwrap_or_default();
        Some(VerifiedContacts {
            mobile: value(ChannelKind::Mobile),
            whatsapp: value(ChannelKind::WhatsApp),
            email: value(ChannelKind::Email),
        })
    }

    pub fn statuses(&self) -> Vec<ChannelStatus> {
        self.verifiers.iter().map(ChannelVerifier::status).collect()
    }

    /// Housekeeping poll over every channel
    pub async fn tick_all(&self) -> DomainResult<Vec<ChannelStatus>> {
        let mut statuses = Vec::with_capacity(self.verifiers.len());
        for verifier in &self.verifiers {
            statuses.push(verifier.tick().await?);
        }
        Ok(statuses)
    }

    pub fn reset_all(&self) {
        for verifier in &self.verifiers {
            verifier.reset();
        }
    }

    pub fn close_all(&self) {
        for verifier in &self.verifiers {
            verifier.close();
        }
    }
}
