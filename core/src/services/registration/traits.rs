//! Ports used by registration submission

use async_trait::async_trait;

use crate::domain::entities::RegistrationRecord;

/// External password-hashing collaborator. Must be deterministic for a
/// given plaintext.
pub trait PasswordHasherTrait: Send + Sync {
    fn hash(&self, plaintext: &str) -> String;
}

/// Receiver of finalized registrations
#[async_trait]
pub trait RegistrationSinkTrait: Send + Sync {
    /// Returns the identifier assigned by the receiver
    async fn submit_registration(&self, record: &RegistrationRecord) -> Result<String, String>;
}
