//! Command tree resolution, parameter validation and script tokenization for
//! `az` invocations.
//!
//! This crate holds the pure engines of the validator. Nothing here does I/O
//! or logs; metadata arrives through the [`MetadataProvider`] trait and every
//! failure is a typed [`ValidateError`].
//!
//! - [`CommandTree`] / [`resolve`] map the words of a command line to the
//!   module that owns the command, splitting off the parameter words.
//! - [`ParamValidator`] checks those parameters against a [`CommandMeta`],
//!   either with values ([`ParamValidator::validate_params`]) or as bare
//!   option names ([`ParamValidator::validate_param_keys`]). Both share one
//!   [`OptionCatalog`].
//! - [`extract_invocations`] pulls every invocation, nested command
//!   substitutions included, out of a shell script with exact source spans.
//!
//! # Example
//!
//! ```
//! use cli_validator_core::*;
//! use serde_json::json;
//!
//! let tree = CommandTree::from_json(
//!     &json!({ "group": { "create": "resource", "delete": "resource" } }),
//!     CommandSource::CoreModule,
//! )
//! .unwrap();
//! let info = tree
//!     .resolve(&split("az group create -n rg -l westus", false).unwrap())
//!     .unwrap();
//! assert_eq!(info.signature, ["group", "create"]);
//!
//! let meta = CommandMeta::new("group create")
//!     .with_param(ParameterMeta::new("rg_name", &["--name", "-n"]).required())
//!     .with_param(ParameterMeta::new("location", &["--location", "-l"]).required());
//! let verdict = ParamValidator::new(&meta)
//!     .validate_params(&info.parameters, false, true)
//!     .unwrap();
//! assert_eq!(verdict, Verdict::Valid);
//! ```

mod catalog;
mod error;
mod keys;
mod lexer;
mod meta;
mod params;
mod placeholder;
mod provider;
mod result;
mod script;
mod token;
mod tree;

pub use catalog::{Action, OUTPUT_FORMATS, OptionCatalog, ParamSpec};
pub use error::{
    LexError, ParameterError, PolicyError, ProviderError, ResolutionError, ScriptParseError,
    StructuralError, ValidateError,
};
pub use lexer::{Word, join, split, split_words};
pub use meta::{CommandMeta, GroupMeta, ModuleMeta, Nargs, ParameterMeta, ValueKind};
pub use params::{ParamValidator, Verdict};
pub use placeholder::{is_placeholder, quote_placeholders};
pub use provider::MetadataProvider;
pub use result::{CommandSource, ScriptValidationItem, ValidationResult};
pub use script::{Invocation, Invocations, extract_invocations, root_invocations};
pub use token::{LineIndex, Token};
pub use tree::{CommandInfo, CommandNode, CommandTree, ROOT_COMMAND, resolve};
