//! Security adapters

pub mod password_hasher;

pub use password_hasher::Sha256PasswordHasher;
