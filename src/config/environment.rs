//! Deployment profile selecting the `config/{profile}.toml` overlay.

use std::fmt;
use std::str::FromStr;

use crate::config::error::ConfigError;

/// Where the watcher runs: a workstation while tuning, or the unattended
/// scheduler host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const ENV_VAR: &'static str = "BILIWATCH_APP_ENV";

    /// Profile named by `BILIWATCH_APP_ENV`; unset or unrecognised means
    /// `Development`.
    pub fn from_env() -> Self {
        std::env::var(Self::ENV_VAR)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// File layered over `default.toml` for this profile
    pub fn overlay_file(&self) -> &'static str {
        match self {
            Environment::Development => "development.toml",
            Environment::Production => "production.toml",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::EnvVarError(format!(
                "Unknown profile '{other}' in {}; expected development or production",
                Self::ENV_VAR
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
