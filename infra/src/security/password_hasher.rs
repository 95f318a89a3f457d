//! SHA-256 password hashing adapter

use sha2::{Digest, Sha256};

use hp_core::services::registration::PasswordHasherTrait;

/// Hex-encoded SHA-256 of `pepper || plaintext`.
///
/// Deterministic, so the registration receiver can recompute it.
#[derive(Clone, Default)]
pub struct Sha256PasswordHasher {
    pepper: String,
}

impl Sha256PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pepper(pepper: impl Into<String>) -> Self {
        Self { pepper: pepper.into() }
    }
}

impl PasswordHasherTrait for Sha256PasswordHasher {
    fn hash(&self, plaintext: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.pepper.as_bytes());
        hasher.update(plaintext.as_bytes());
        hex::encode(hasher.finalize())
    }
}
