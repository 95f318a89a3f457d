//! Deployment environment

use serde::{Deserialize, Serialize};

/// Deployment environment; selects the default profile and config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    /// Shared test deployments
    Staging,
    Production,
}

impl Environment {
    /// Variables consulted in order; the first set one wins
    pub const VARIABLES: [&'static str; 2] = ["PORTAL_ENV", "ENVIRONMENT"];

    /// Environment named by `PORTAL_ENV` or `ENVIRONMENT`; unset or
    /// unrecognised values mean development
    pub fn from_env() -> Self {
        Self::VARIABLES
            .iter()
            .find_map(|name| std::env::var(name).ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Optional TOML file layered over the profile defaults
    pub fn config_file(&self) -> String {
        format!("config/portal.{}.toml", self.as_str())
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "staging" | "stage" | "test" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("Unknown environment: {}", other)),
        }
    }
}
