//! Local-disk command metadata and validator configuration.
//!
//! [`MetadataStore`] implements [`MetadataProvider`] over a directory that
//! mirrors the published metadata layout, reading command trees and module
//! metadata lazily and caching them. [`ValidatorConfig`] is the YAML file that
//! points at that directory and carries the default validation policy.
//!
//! # Quick start
//!
//! ```no_run
//! use cli_validator::Validator;
//! use cli_validator_db::{MetadataStore, ValidatorConfig};
//!
//! let config = ValidatorConfig::load("validator.yml").unwrap();
//! let validator = Validator::new(MetadataStore::from_config(&config).unwrap());
//!
//! let result = validator.validate_command("az group list", config.defaults);
//! assert!(result.is_valid);
//! ```
//!
//! [`MetadataProvider`]: cli_validator_core::MetadataProvider

mod config;
mod error;
mod store;

pub use config::ValidatorConfig;
pub use error::{Result, StoreError};
pub use store::{MetadataStore, StoreBuilder};
