//! Registration wizard records.

use serde::{Deserialize, Serialize};

use hp_shared::validation::{validators, Validate, ValidationError, ValidationErrors};

/// Step of the four-step registration wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Verification = 1,
    UserDetails = 2,
    PersonalInfo = 3,
    Approval = 4,
}

impl WizardStep {
    /// Step number, 1-based
    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(WizardStep::Verification),
            2 => Some(WizardStep::UserDetails),
            3 => Some(WizardStep::PersonalInfo),
            4 => Some(WizardStep::Approval),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        self.number().checked_sub(1).and_then(Self::from_number)
    }

    pub fn is_terminal(&self) -> bool {
        *self == WizardStep::Approval
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Verification => "Verification",
            WizardStep::UserDetails => "User Details",
            WizardStep::PersonalInfo => "Personal Info",
            WizardStep::Approval => "Approval",
        }
    }
}

/// Geographic depth of a user's organizational level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoLevel {
    State,
    Division,
    District,
    Block,
    Sector,
}

impl GeoLevel {
    /// Levels from shallowest to deepest
    pub const ORDERED: [GeoLevel; 5] = [
        GeoLevel::State,
        GeoLevel::Division,
        GeoLevel::District,
        GeoLevel::Block,
        GeoLevel::Sector,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GeoLevel::State => "State",
            GeoLevel::Division => "Division",
            GeoLevel::District => "District",
            GeoLevel::Block => "Block",
            GeoLevel::Sector => "Sector",
        }
    }

    /// This level and every shallower one
    pub fn required_levels(&self) -> impl Iterator<Item = GeoLevel> {
        let deepest = *self;
        Self::ORDERED.into_iter().filter(move |level| *level <= deepest)
    }
}

impl std::str::FromStr for GeoLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "state" => Ok(GeoLevel::State),
            "division" => Ok(GeoLevel::Division),
            "district" => Ok(GeoLevel::District),
            "block" => Ok(GeoLevel::Block),
            "sector" => Ok(GeoLevel::Sector),
            _ => Err(format!("Invalid level: {}", s)),
        }
    }
}

/// Organizational and geographic selections made on step 2.
///
/// Values are opaque identifiers; only their presence matters here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub selected_level: Option<GeoLevel>,
    pub state: String,
    pub division: String,
    pub district: String,
    pub block: String,
    pub sector: String,
    pub organization_type_id: String,
    pub organization_id: String,
    pub designation_id: String,
}

impl LevelInfo {
    /// Value of the geographic field for `level`
    pub fn geo_value(&self, level: GeoLevel) -> &str {
        match level {
            GeoLevel::State => &self.state,
            GeoLevel::Division => &self.division,
            GeoLevel::District => &self.district,
            GeoLevel::Block => &self.block,
            GeoLevel::Sector => &self.sector,
        }
    }
}

impl Validate for LevelInfo {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match self.selected_level {
            Some(level) => {
                for required in level.required_levels() {
                    errors.require(
                        &required.label().to_lowercase(),
                        required.label(),
                        self.geo_value(required),
                    );
                }
            }
            None => {
                errors.add(ValidationError::required("selected_level", "Level"));
                errors.require("state", "State", &self.state);
            }
        }
        errors.require("organization_type_id", "Organization type", &self.organization_type_id);
        errors.require("organization_id", "Organization", &self.organization_id);
        errors.require("designation_id", "Designation", &self.designation_id);

        errors.into_result()
    }
}

/// Personal details entered on step 3
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    /// Client-side check only; never transmitted
    #[serde(skip_serializing, default)]
    pub confirm_password: String,
}

impl std::fmt::Debug for PersonalInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalInfo")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .finish()
    }
}

impl Validate for PersonalInfo {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("first_name", "First name", &self.first_name);
        errors.require("password", "Password", &self.password);
        errors.require("confirm_password", "Confirm password", &self.confirm_password);

        if !self.password.is_empty() && !self.confirm_password.is_empty() && self.password != self.confirm_password {
            errors.add_error("confirm_password", "Passwords do not match", "MISMATCH");
        }
        if !self.password.is_empty() && !validators::is_strong_password(&self.password) {
            errors.add_error(
                "password",
                "Password must be at least 6 characters with an uppercase letter, a lowercase letter and a digit",
                "COMPLEXITY",
            );
        }

        errors.into_result()
    }
}

/// Wizard data outside the channel verifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub step: WizardStep,
    pub level_info: LevelInfo,
    pub personal_info: PersonalInfo,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: WizardStep::Verification,
            level_info: LevelInfo::default(),
            personal_info: PersonalInfo::default(),
        }
    }
}
