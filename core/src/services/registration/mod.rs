//! Registration wizard: step gating and final submission

mod gate;
mod session;
mod submission;
mod traits;


pub use gate::WizardGate;
pub use session::RegistrationSession;
pub use submission::{RegistrationSubmission, SubmissionReceipt};
pub use traits::{PasswordHasherTrait, RegistrationSinkTrait};
