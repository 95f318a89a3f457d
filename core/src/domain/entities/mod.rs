//! Domain entities representing core business objects.

pub mod channel;
pub mod channel_state;
pub mod code_buffer;
pub mod record;
pub mod wizard;

// Re-export commonly used types
pub use channel::{ChannelKind, VerificationContext};
pub use channel_state::{ChannelState, Phase, MAX_ATTEMPTS};
pub use code_buffer::{CodeBuffer, CODE_LENGTH};
pub use record::{RegistrationRecord, VerifiedContacts};
pub use wizard::{GeoLevel, LevelInfo, PersonalInfo, WizardState, WizardStep};
