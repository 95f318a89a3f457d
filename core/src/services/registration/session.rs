//! One open registration flow

use crate::domain::entities::{LevelInfo, PersonalInfo, WizardState, WizardStep};
use crate::errors::{DomainResult, WizardError};
use crate::services::verification::{KeyValueStoreTrait, OtpGatewayTrait, VerificationAggregator};

use super::gate::WizardGate;
use super::submission::{RegistrationSubmission, SubmissionReceipt};
use super::traits::{PasswordHasherTrait, RegistrationSinkTrait};

/// Wizard data, channel verifiers and submission for a single open of the
/// registration flow. Closed after a successful submit or a cancel.
pub struct RegistrationSession<G, K, H, S>
where
    G: OtpGatewayTrait,
    K: KeyValueStoreTrait,
    H: PasswordHasherTrait,
    S: RegistrationSinkTrait,
{
    aggregator: VerificationAggregator<G, K>,
    submission: RegistrationSubmission<H, S>,
    gate: WizardGate,
    level_info: LevelInfo,
    personal_info: PersonalInfo,
    open: bool,
}

impl<G, K, H, S> RegistrationSession<G, K, H, S>
where
    G: OtpGatewayTrait,
    K: KeyValueStoreTrait,
    H: PasswordHasherTrait,
    S: RegistrationSinkTrait,
{
    pub fn new(aggregator: VerificationAggregator<G, K>, submission: RegistrationSubmission<H, S>) -> Self {
        Self {
            aggregator,
            submission,
            gate: WizardGate::new(),
            level_info: LevelInfo::default(),
            personal_info: PersonalInfo::default(),
            open: true,
        }
    }

    pub fn aggregator(&self) -> &VerificationAggregator<G, K> {
        &self.aggregator
    }

    pub fn step(&self) -> WizardStep {
        self.gate.step()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn level_info(&self) -> &LevelInfo {
        &self.level_info
    }

    pub fn level_info_mut(&mut self) -> &mut LevelInfo {
        &mut self.level_info
    }

    pub fn personal_info(&self) -> &PersonalInfo {
        &self.personal_info
    }

    pub fn personal_info_mut(&mut self) -> &mut PersonalInfo {
        &mut self.personal_info
    }

    /// Snapshot of the wizard records
    pub fn wizard_state(&self) -> WizardState {
        WizardState {
            step: self.gate.step(),
            level_info: self.level_info.clone(),
            personal_info: self.personal_info.clone(),
        }
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        if self.open {
            Ok(())
        } else {
            Err(WizardError::Closed)
        }
    }

    pub fn next(&mut self) -> DomainResult<WizardStep> {
        self.ensure_open()?;
        Ok(self
            .gate
            .next(&self.aggregator, &self.level_info, &self.personal_info)?)
    }

    pub fn back(&mut self) -> DomainResult<WizardStep> {
        self.ensure_open()?;
        Ok(self.gate.back()?)
    }

    /// Submit from the approval step. On success every record and channel
    /// is reset and the session closes; on failure it stays on step 4.
    pub async fn submit(&mut self) -> DomainResult<SubmissionReceipt> {
        self.ensure_open()?;
        if self.gate.step() != WizardStep::Approval {
            return Err(WizardError::InvalidStep { step: self.gate.step() }.into());
        }

        // Records stay editable on step 4, so every gate is checked again
        for step in [WizardStep::Verification, WizardStep::UserDetails, WizardStep::PersonalInfo] {
            WizardGate::check_step(step, &self.aggregator, &self.level_info, &self.personal_info)?;
        }
        let contacts = self.aggregator.verified_contacts().ok_or_else(|| WizardError::incomplete(
            WizardStep::Verification,
            "Please verify",
            Vec::new(),
        ))?;

        let receipt = self
            .submission
            .submit(contacts, &self.level_info, &self.personal_info)
            .await?;

        self.clear();
        self.open = false;
        Ok(receipt)
    }

    /// Abandon the flow
    pub fn cancel(&mut self) {
        if self.open {
            tracing::info!(step = self.gate.step().number(), event = "registration_cancelled", "Registration cancelled");
        }
        self.clear();
        self.open = false;
    }

    fn clear(&mut self) {
        self.aggregator.reset_all();
        self.aggregator.close_all();
        self.gate.reset();
        self.level_info = LevelInfo::default();
        self.personal_info = PersonalInfo::default();
    }
}
