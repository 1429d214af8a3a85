//! Backend configuration
//!
//! Loaded from a TOML file, with environment overrides so credentials can
//! stay out of the file.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding the API base URL
pub const ENV_API_BASE: &str = "COURSEDOC_API_BASE";
/// Environment variable overriding the project id
pub const ENV_PROJECT_ID: &str = "COURSEDOC_PROJECT_ID";
/// Environment variable overriding the API key
pub const ENV_API_KEY: &str = "COURSEDOC_API_KEY";
/// Environment variable overriding the storage bucket
pub const ENV_STORAGE_BUCKET: &str = "COURSEDOC_STORAGE_BUCKET";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("config read failed: {0}")]
    Io(#[from] std::io::Error),

    /// Config file did not parse
    #[error("config parse failed: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required field is empty
    #[error("missing configuration value: {0}")]
    Missing(&'static str),
}

/// Connection settings for the hosted platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the platform API
    pub api_base: String,
    /// Project identifier namespacing all collections
    pub project_id: String,
    /// API key sent with every request
    pub api_key: String,
    /// Object-storage bucket for document uploads
    pub storage_bucket: String,
}

impl BackendConfig {
    /// Create a configuration with every field given
    #[inline]
    #[must_use]
    pub fn new(
        api_base: impl Into<String>,
        project_id: impl Into<String>,
        api_key: impl Into<String>,
        storage_bucket: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            project_id: project_id.into(),
            api_key: api_key.into(),
            storage_bucket: storage_bucket.into(),
        }
    }

    /// Load from a TOML file, then apply environment overrides
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file is unreadable, unparsable, or a
    /// required field ends up empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&raw)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-variable overrides in place
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var(ENV_API_BASE) {
            self.api_base = v;
        }
        if let Ok(v) = std::env::var(ENV_PROJECT_ID) {
            self.project_id = v;
        }
        if let Ok(v) = std::env::var(ENV_API_KEY) {
            self.api_key = v;
        }
        if let Ok(v) = std::env::var(ENV_STORAGE_BUCKET) {
            self.storage_bucket = v;
        }
    }

    /// Check that every required field is present
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] naming the first empty field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::Missing("api_base"));
        }
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Missing("project_id"));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("api_key"));
        }
        if self.storage_bucket.trim().is_empty() {
            return Err(ConfigError::Missing("storage_bucket"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_base = \"https://api.example.test\"\n\
             project_id = \"demo\"\n\
             api_key = \"k-123\"\n\
             storage_bucket = \"demo-files\""
        )
        .unwrap();

        let config = BackendConfig::load(file.path()).unwrap();
        assert_eq!(config.api_base, "https://api.example.test");
        assert_eq!(config.storage_bucket, "demo-files");
    }

    #[test]
    fn validate_names_the_missing_field() {
        let config = BackendConfig::new("https://api.example.test", "demo", "", "bucket");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn parse_failure_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_base = [not toml").unwrap();
        assert!(matches!(
            BackendConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
