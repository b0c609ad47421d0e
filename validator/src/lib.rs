//! Validation of `az` commands, parameter-key lists, scripts and command sets.
//!
//! [`Validator`] composes the engines of [`cli_validator_core`] with a
//! [`MetadataProvider`]: it resolves a command against every source the
//! provider offers, fetches the owning module's metadata, and checks the
//! parameters. Every call returns a [`ValidationResult`]; failures never
//! escape as errors.
//!
//! # Quick start
//!
//! ```
//! use cli_validator::{StaticProvider, ValidateOptions, Validator};
//! use cli_validator_core::{CommandMeta, CommandSource, CommandTree, GroupMeta, ParameterMeta};
//! use serde_json::json;
//!
//! let tree = CommandTree::from_json(
//!     &json!({ "group": { "delete": "resource" } }),
//!     CommandSource::CoreModule,
//! )
//! .unwrap();
//! let module = GroupMeta::new("resource").with_group(
//!     GroupMeta::new("group").with_command(
//!         CommandMeta::new("group delete")
//!             .with_param(ParameterMeta::new("rg_name", &["--name", "-n"]).required())
//!             .with_param(ParameterMeta::new("yes", &["--yes", "-y"]))
//!             .with_confirmation(),
//!     ),
//! );
//! let validator = Validator::new(
//!     StaticProvider::new()
//!         .with_tree(tree)
//!         .with_module(CommandSource::CoreModule, "resource", module),
//! );
//!
//! let result = validator.validate_command("az group delete -n rg --yes", ValidateOptions::default());
//! assert!(result.is_valid);
//!
//! let strict = ValidateOptions { non_interactive: true, ..ValidateOptions::default() };
//! let result = validator.validate_command("az group delete -n rg", strict);
//! assert_eq!(
//!     result.error_message.as_deref(),
//!     Some("`--yes` is required for commands in non-interactive mode."),
//! );
//! ```
//!
//! [`MetadataProvider`]: cli_validator_core::MetadataProvider
//! [`ValidationResult`]: cli_validator_core::ValidationResult

mod command_set;
mod memory;
mod orchestrator;

pub use command_set::{CommandSetItem, CommandSetReport, CommandSetResultItem};
pub use memory::StaticProvider;
pub use orchestrator::{ValidateOptions, Validator};
