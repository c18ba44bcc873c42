//! Settings file management.
//!
//! Handles reading and validating the optional `.puff.toml` at the root.
//! A missing file means built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::constants;
use crate::core::format::Encoding;
use crate::error::{ConfigError, Result};

/// Settings stored in `.puff.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub puff: Meta,
    #[serde(default)]
    pub identity: IdentitySettings,
    #[serde(default)]
    pub generate: GenerateSettings,
}

/// Metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Settings format version
    pub version: String,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Where to find the local age identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentitySettings {
    /// age key file, used after the environment variables
    #[serde(default)]
    pub key_file: Option<PathBuf>,
}

/// Defaults for `puff generate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateSettings {
    /// Output encoding: env, json, yaml or k8s
    #[serde(default)]
    pub format: Option<String>,
    /// Secret name for the k8s encoding
    #[serde(default)]
    pub secret_name: Option<String>,
    /// Base64 values in k8s output
    #[serde(default)]
    pub base64: bool,
}

impl Settings {
    /// Path to the settings file under `root`
    pub fn path(root: &Path) -> PathBuf {
        root.join(constants::SETTINGS_FILE)
    }

    /// Load `.puff.toml` from `root`, or defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the TOML is malformed, or
    /// `ConfigError::InvalidValue` if validation fails.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);
        debug!(path = %path.display(), "loading settings");

        if !path.exists() {
            debug!("no settings file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
            path: path.clone(),
            source,
        })?;
        let settings: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        settings.validate()?;
        debug!(
            key_file = settings.identity.key_file.is_some(),
            format = settings.generate.format.as_deref().unwrap_or("-"),
            "settings loaded"
        );
        Ok(settings)
    }

    /// Validate the settings.
    ///
    /// Checks:
    /// - Version looks like semver
    /// - Default format names a known encoding
    /// - Secret name, if set, is not blank
    pub fn validate(&self) -> Result<()> {
        let version_parts: Vec<&str> = self.puff.version.split('.').collect();
        if self.puff.version.is_empty() || version_parts.len() < 2 {
            return Err(ConfigError::InvalidValue {
                field: "puff.version",
                reason: format!("not a valid semver: {}", self.puff.version),
            }
            .into());
        }

        if let Some(format) = &self.generate.format {
            format
                .parse::<Encoding>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: "generate.format",
                    reason: e.to_string(),
                })?;
        }

        if let Some(name) = &self.generate.secret_name {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "generate.secret_name",
                    reason: "must not be empty".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Default encoding for `generate`, if configured.
    pub fn default_encoding(&self) -> Option<Encoding> {
        self.generate.format.as_deref().and_then(|f| f.parse().ok())
    }
}
