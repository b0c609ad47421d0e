//! Validation results returned to callers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidateError;

/// Which backing repository supplied a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommandSource {
    /// The command was not attributed to any source.
    #[default]
    Unknown,
    /// The core CLI modules.
    CoreModule,
    /// An installable extension.
    Extension,
}

impl CommandSource {
    /// Human-readable name used in messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown Source",
            Self::CoreModule => "Core Module",
            Self::Extension => "Extension",
        }
    }
}

impl fmt::Display for CommandSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Verdict for one validated command.
///
/// # Examples
///
/// ```
/// use cli_validator_core::{CommandSource, StructuralError, ValidationResult};
///
/// let ok = ValidationResult::valid("az vm list", CommandSource::CoreModule);
/// assert_eq!(ok.to_string(), "The command is valid and belongs to the Core Module.");
///
/// let bad = ValidationResult::from_error(
///     "kubectl get pods",
///     CommandSource::Unknown,
///     &StructuralError::NotRootCommand.into(),
/// );
/// assert!(!bad.is_valid);
/// assert_eq!(
///     bad.to_string(),
///     "The command is invalid. The input command is not an Azure CLI command.",
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The command text as supplied (or as sliced from a script).
    pub command: String,
    /// Whether the command passed.
    pub is_valid: bool,
    /// Source that owns the command.
    pub source: CommandSource,
    /// `false` when parameters were not checked (no metadata, or help).
    pub validated_param: bool,
    /// Failure message for invalid commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ValidationResult {
    /// A fully checked, valid command.
    pub fn valid(command: impl Into<String>, source: CommandSource) -> Self {
        Self {
            command: command.into(),
            is_valid: true,
            source,
            validated_param: true,
            error_message: None,
        }
    }

    /// A command whose path resolved but whose parameters were not checked.
    pub fn unchecked(command: impl Into<String>, source: CommandSource) -> Self {
        Self {
            validated_param: false,
            ..Self::valid(command, source)
        }
    }

    /// An invalid command.
    pub fn from_error(
        command: impl Into<String>,
        source: CommandSource,
        error: &ValidateError,
    ) -> Self {
        Self {
            command: command.into(),
            is_valid: false,
            source,
            validated_param: true,
            error_message: Some(error.to_string()),
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid {
            write!(f, "The command is valid and belongs to the {}.", self.source)
        } else {
            write!(
                f,
                "The command is invalid. {}",
                self.error_message.as_deref().unwrap_or_default()
            )
        }
    }
}

/// Result for one invocation found in a script, with its source span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptValidationItem {
    /// Start line (zero-based).
    pub line: usize,
    /// Start column.
    pub col: usize,
    /// End line.
    pub end_line: usize,
    /// End column (exclusive).
    pub end_col: usize,
    /// Verdict for the invocation.
    pub result: ValidationResult,
}
