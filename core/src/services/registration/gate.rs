//! Four-step wizard gate

use hp_shared::validation::{Validate, ValidationErrors};

use crate::domain::entities::{LevelInfo, PersonalInfo, VerificationContext, WizardStep};
use crate::errors::WizardError;
use crate::services::verification::{KeyValueStoreTrait, OtpGatewayTrait, VerificationAggregator};

/// Linear stepper over [`WizardStep`].
///
/// `next` checks the current step's readiness; `back` never re-validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardGate {
    step: WizardStep,
}

impl Default for WizardGate {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardGate {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Verification,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Readiness of `step`. Every unmet sub-condition is named.
    pub fn check_step<G, K>(
        step: WizardStep,
        aggregator: &VerificationAggregator<G, K>,
        level_info: &LevelInfo,
        personal_info: &PersonalInfo,
    ) -> Result<(), WizardError>
    where
        G: OtpGatewayTrait,
        K: KeyValueStoreTrait,
    {
        match step {
            WizardStep::Verification => {
                let missing: Vec<String> = aggregator
                    .unverified_channels(VerificationContext::Registration)
                    .iter()
                    .map(|kind| kind.label().to_string())
                    .collect();
                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(WizardError::incomplete(step, "Please verify", missing))
                }
            }
            WizardStep::UserDetails => level_info
                .validate()
                .map_err(|errors| incomplete(step, "Please complete", errors)),
            WizardStep::PersonalInfo => personal_info
                .validate()
                .map_err(|errors| incomplete(step, "Please correct", errors)),
            WizardStep::Approval => Ok(()),
        }
    }

    /// Advance if the current step is ready
    pub fn next<G, K>(
        &mut self,
        aggregator: &VerificationAggregator<G, K>,
        level_info: &LevelInfo,
        personal_info: &PersonalInfo,
    ) -> Result<WizardStep, WizardError>
    where
        G: OtpGatewayTrait,
        K: KeyValueStoreTrait,
    {
        let Some(next) = self.step.next() else {
            return Err(WizardError::InvalidStep { step: self.step });
        };
        Self::check_step(self.step, aggregator, level_info, personal_info)?;

        tracing::info!(
            from = self.step.number(),
            to = next.number(),
            event = "wizard_step_advanced",
            "Wizard advanced to {}",
            next.title()
        );
        self.step = next;
        Ok(next)
    }

    /// Go back one step without validation
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        let previous = self
            .step
            .previous()
            .ok_or(WizardError::InvalidStep { step: self.step })?;
        tracing::debug!(from = self.step.number(), to = previous.number(), event = "wizard_step_back");
        self.step = previous;
        Ok(previous)
    }

    pub fn reset(&mut self) {
        self.step = WizardStep::Verification;
    }
}

fn incomplete(step: WizardStep, prefix: &str, errors: ValidationErrors) -> WizardError {
    let missing = errors.errors().iter().map(|e| e.message.clone()).collect();
    WizardError::incomplete(step, prefix, missing)
}
