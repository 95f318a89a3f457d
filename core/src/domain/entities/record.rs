//! Finalized registration record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::wizard::{GeoLevel, LevelInfo};

/// Registration emitted once the wizard is submitted.
///
/// Carries the hashed password only; the confirmation field never leaves
/// the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    /// Client-side identifier for this submission
    pub id: Uuid,

    /// Verified mobile number
    pub mobile: String,

    /// Verified WhatsApp number
    pub whatsapp: String,

    /// Verified email address
    pub email: String,

    pub selected_level: GeoLevel,
    pub state: String,
    pub division: String,
    pub district: String,
    pub block: String,
    pub sector: String,
    pub organization_type_id: String,
    pub organization_id: String,
    pub designation_id: String,

    pub first_name: String,
    pub last_name: String,

    /// Output of the password-hashing collaborator
    pub password_hash: String,

    pub submitted_at: DateTime<Utc>,
}

/// Builder inputs that are not part of [`LevelInfo`]
#[derive(Debug, Clone)]
pub struct VerifiedContacts {
    pub mobile: String,
    pub whatsapp: String,
    pub email: String,
}

impl RegistrationRecord {
    /// Assemble a record from the wizard's step records
    pub fn new(
        contacts: VerifiedContacts,
        selected_level: GeoLevel,
        level: &LevelInfo,
        first_name: &str,
        last_name: &str,
        password_hash: String,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        // Fields deeper than the selected level are not part of the selection
        let geo = |l: GeoLevel| {
            if l <= selected_level {
                level.geo_value(l).trim().to_string()
            } else {
                String::new()
            }
        };

        Self {
            id: Uuid::new_v4(),
            mobile: contacts.mobile,
            whatsapp: contacts.whatsapp,
            email: contacts.email,
            selected_level,
            state: geo(GeoLevel::State),
            division: geo(GeoLevel::Division),
            district: geo(GeoLevel::District),
            block: geo(GeoLevel::Block),
            sector: geo(GeoLevel::Sector),
            organization_type_id: level.organization_type_id.trim().to_string(),
            organization_id: level.organization_id.trim().to_string(),
            designation_id: level.designation_id.trim().to_string(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            password_hash,
            submitted_at,
        }
    }
}
