//! Validator configuration.
//!
//! Defines the YAML-serializable configuration that locates the metadata
//! directory, pins metadata versions, sizes the worker pool and sets the
//! default validation policy.
//!
//! # Example YAML
//!
//! ```yaml
//! metadata_dir: /var/lib/cli-validator
//! core_version: 2.60.0
//! extensions: true
//! jobs: 4
//! defaults:
//!   non_interactive: false
//!   placeholder: true
//!   reject_help: true
//! ```
//!
//! Every key is optional.

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use cli_validator::ValidateOptions;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Top-level validator configuration.
///
/// # Examples
///
/// ```
/// use cli_validator_db::ValidatorConfig;
///
/// let config: ValidatorConfig = serde_yaml::from_str("jobs: 2\ndefaults: { non_interactive: true }").unwrap();
/// assert_eq!(config.jobs, Some(2));
/// assert!(config.defaults.non_interactive);
/// assert!(config.defaults.placeholder);
/// assert!(config.extensions);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Root of the metadata layout.
    pub metadata_dir: PathBuf,
    /// Core metadata version; the latest listed version when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_version: Option<String>,
    /// Whether extension metadata is consulted.
    pub extensions: bool,
    /// Worker threads for batch validation (default: number of CPUs).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// Validation policy applied unless overridden per call.
    pub defaults: ValidateOptions,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            metadata_dir: PathBuf::from("metadata"),
            core_version: None,
            extensions: true,
            jobs: None,
            defaults: ValidateOptions::default(),
        }
    }
}

impl ValidatorConfig {
    /// Loads configuration from a YAML file.
    ///
    /// A relative `metadata_dir` is resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot be
    /// read, or [`YamlError`](crate::StoreError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
        let reader = BufReader::new(file);
        let mut config: Self = serde_yaml::from_reader(reader)?;
        if config.metadata_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.metadata_dir = parent.join(&config.metadata_dir);
            }
        }
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot be
    /// written, or [`YamlError`](crate::StoreError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| StoreError::io(path, e))?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
metadata_dir: /opt/az-meta
core_version: 2.60.0
extensions: false
jobs: 8
defaults:
  non_interactive: true
  placeholder: false
  reject_help: false
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: ValidatorConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.metadata_dir, PathBuf::from("/opt/az-meta"));
        assert_eq!(config.core_version.as_deref(), Some("2.60.0"));
        assert!(!config.extensions);
        assert_eq!(config.jobs, Some(8));
        assert!(config.defaults.non_interactive);
        assert!(!config.defaults.placeholder);
        assert!(!config.defaults.reject_help);
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: ValidatorConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ValidatorConfig::default());
        assert_eq!(config.defaults, ValidateOptions::default());
    }

    #[test]
    fn test_load_resolves_relative_metadata_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validator.yml");
        std::fs::write(&path, "metadata_dir: meta\n").unwrap();

        let config = ValidatorConfig::load(&path).unwrap();
        assert_eq!(config.metadata_dir, dir.path().join("meta"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ValidatorConfig::load("/nonexistent/validator.yml").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validator.yml");

        let original: ValidatorConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        original.save(&path).unwrap();

        let loaded = ValidatorConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }
}
