//! Registration submission

use std::sync::Arc;

use crate::domain::entities::{LevelInfo, PersonalInfo, RegistrationRecord, VerifiedContacts};
use crate::errors::{DomainError, DomainResult, WizardError};
use crate::services::countdown::TimeSource;

use super::traits::{PasswordHasherTrait, RegistrationSinkTrait};

/// Accepted registration
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    /// Identifier assigned by the sink
    pub registration_id: String,
    pub record: RegistrationRecord,
}

/// Terminal wizard operation: hash, assemble, emit
pub struct RegistrationSubmission<H: PasswordHasherTrait, S: RegistrationSinkTrait> {
    hasher: Arc<H>,
    sink: Arc<S>,
    clock: Arc<dyn TimeSource>,
}

impl<H: PasswordHasherTrait, S: RegistrationSinkTrait> RegistrationSubmission<H, S> {
    pub fn new(hasher: Arc<H>, sink: Arc<S>, clock: Arc<dyn TimeSource>) -> Self {
        Self { hasher, sink, clock }
    }

    /// Build the record from the wizard snapshot and hand it to the sink.
    ///
    /// Only `password` is hashed, exactly once; the confirmation is never
    /// part of the record. Failures are not retried.
    pub async fn submit(
        &self,
        contacts: VerifiedContacts,
        level_info: &LevelInfo,
        personal_info: &PersonalInfo,
    ) -> DomainResult<SubmissionReceipt> {
        let selected_level = level_info.selected_level.ok_or_else(|| DomainError::Validation {
            message: "Level is required".to_string(),
        })?;
        if personal_info.password.is_empty() {
            return Err(DomainError::Validation {
                message: "Password is required".to_string(),
            });
        }

        let password_hash = self.hasher.hash(&personal_info.password);
        let record = RegistrationRecord::new(
            contacts,
            selected_level,
            level_info,
            &personal_info.first_name,
            &personal_info.last_name,
            password_hash,
            self.clock.now(),
        );

        let registration_id = self.sink.submit_registration(&record).await.map_err(|e| {
            tracing::error!(
                record_id = %record.id,
                error = %e,
                event = "registration_failed",
                "Registration submission failed"
            );
            WizardError::SubmissionFailed { message: e }
        })?;

        tracing::info!(
            record_id = %record.id,
            registration_id = %registration_id,
            mobile = %hp_shared::phone::mask_phone_number(&record.mobile),
            event = "registration_submitted",
            "Registration submitted"
        );
        Ok(SubmissionReceipt {
            registration_id,
            record,
        })
    }
}
