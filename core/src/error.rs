//! Validation error taxonomy.
//!
//! Every failure the engines can produce is one of four categories, wrapped by
//! [`ValidateError`]:
//!
//! - [`StructuralError`]: the input cannot be interpreted at all, such as an
//!   empty command or unbalanced brackets in a script.
//! - [`ResolutionError`]: the words do not name a command.
//! - [`ParameterError`]: the command exists but its arguments are wrong. The
//!   `Display` text follows argparse wording because downstream consumers
//!   match on message shape.
//! - [`PolicyError`]: the command is fine but the caller rejects it, for
//!   instance a missing `--yes`.
//!
//! Metadata retrieval failures are kept apart in [`ProviderError`] so that an
//! unreachable metadata source is never reported as a wrong command. A
//! corrupted command tree travels through [`ProviderError::Corrupted`] and is
//! reported as the [`StructuralError`] it wraps.

use thiserror::Error;

use crate::result::CommandSource;

/// Input that cannot be interpreted as a command or script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// No words at all.
    #[error("The input command is empty.")]
    EmptyCommand,
    /// The first word is not the CLI root word.
    #[error("The input command is not an Azure CLI command.")]
    NotRootCommand,
    /// A command tree node holds something other than a module name or a
    /// nested group.
    #[error(
        "The {0} CommandTree is Corrupted. Fail to find parent module/extension of command."
    )]
    CommandTreeCorrupted(String),
    /// The shell lexer rejected the text (unterminated quote or escape).
    #[error("Fail to Parse command: {0}")]
    Lex(#[from] LexError),
    /// A script could not be split into invocations.
    #[error(transparent)]
    Script(#[from] ScriptParseError),
}

/// Words that do not resolve to a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// A word has no matching child in the command tree.
    #[error("Unknown Command: '{0}'.")]
    UnknownCommand(String),
    /// The words form a valid group path that never reaches a command.
    #[error("Unknown Command: '{0}'.")]
    MissingSubCommand(String),
    /// A signature carries extra words after the resolved command.
    #[error("Unknown Command: '{command}'. Do you mean '{fixed}'?")]
    TooLongSignature {
        /// Signature as supplied.
        command: String,
        /// The longest prefix that resolved to a command.
        fixed: String,
    },
}

/// Argument-level failures, worded like argparse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// Required parameters were not supplied.
    #[error("the following arguments are required: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
    /// Leftover tokens after full parsing, space-joined like argparse.
    #[error("unrecognized arguments: {}", .0.join(" "))]
    Unrecognized(Vec<String>),
    /// Parameter keys that matched no parameter, comma-joined.
    #[error("unrecognized arguments: {}", .0.join(", "))]
    UnrecognizedKeys(Vec<String>),
    /// A value outside the declared choices.
    #[error(
        "argument {argument}: invalid choice: '{value}' (choose from {})",
        quote_list(.choices)
    )]
    InvalidChoice {
        /// Option strings joined by `/`, or the destination for positionals.
        argument: String,
        /// Rejected value.
        value: String,
        /// Declared choices.
        choices: Vec<String>,
    },
    /// A value that does not convert to the parameter's backing kind.
    #[error("argument {argument}: invalid {kind} value: '{value}'")]
    InvalidValue {
        /// Option strings joined by `/`, or the destination for positionals.
        argument: String,
        /// Backing kind name (`int`, `float`, `str`, `bool`).
        kind: &'static str,
        /// Rejected value.
        value: String,
    },
    /// Wrong number of values for the declared cardinality.
    #[error("argument {argument}: {expected}")]
    WrongArity {
        /// Option strings joined by `/`, or the destination for positionals.
        argument: String,
        /// Argparse-style expectation (`expected one argument`, ...).
        expected: String,
    },
    /// An abbreviated option shared by several parameters.
    #[error("ambiguous option: {input} could match {}", .matches.join(", "))]
    AmbiguousOption {
        /// The abbreviation as typed.
        input: String,
        /// Full option strings starting with the abbreviation.
        matches: Vec<String>,
    },
}

/// The command is syntactically fine but rejected by caller policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// A confirmation command run non-interactively without `--yes`.
    #[error("`--yes` is required for commands in non-interactive mode.")]
    ConfirmationRequired,
    /// The command asks for help and the caller rejects help.
    #[error("The input command is help or `--help`.")]
    HelpRequested,
}

/// Metadata could not be retrieved from a source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The source (tree or module metadata) could not be loaded.
    #[error("Fail to retrieve metadata from {origin}: {reason}")]
    Unavailable {
        /// Source that failed.
        origin: CommandSource,
        /// Underlying failure.
        reason: String,
    },
    /// The source has no metadata for the module named by its tree.
    #[error("The metadata of module `{module}` is not found in {origin}.")]
    ModuleNotFound {
        /// Source that was asked.
        origin: CommandSource,
        /// Module or extension name.
        module: String,
    },
    /// The source's command tree was loaded but does not describe a tree.
    #[error(transparent)]
    Corrupted(#[from] StructuralError),
}

impl ProviderError {
    /// Unwraps corruption into the structural error it reports, so callers
    /// see the corruption itself rather than a retrieval failure.
    pub fn into_validate_error(self) -> ValidateError {
        match self {
            Self::Corrupted(err) => err.into(),
            other => other.into(),
        }
    }
}

/// Any failure of a validation call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidateError {
    /// See [`StructuralError`].
    #[error(transparent)]
    Structural(#[from] StructuralError),
    /// See [`ResolutionError`].
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    /// See [`ParameterError`].
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    /// See [`PolicyError`].
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// See [`ProviderError`].
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

fn quote_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("'{item}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Shell lexing failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A quote was opened and never closed on the line.
    #[error("No closing quotation")]
    NoClosingQuotation,
    /// A trailing backslash with nothing to escape.
    #[error("No escaped character")]
    NoEscapedCharacter,
}

/// A script whose bracket groups or quoting cannot be balanced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} at line {line}, column {col}: {text}")]
pub struct ScriptParseError {
    /// What went wrong.
    pub reason: String,
    /// Zero-based line number.
    pub line: usize,
    /// Raw text of that line.
    pub text: String,
    /// Zero-based byte column on that line.
    pub col: usize,
}

impl ScriptParseError {
    pub(crate) fn new(reason: impl Into<String>, line: usize, text: &str, col: usize) -> Self {
        Self {
            reason: reason.into(),
            line,
            text: text.to_string(),
            col,
        }
    }
}
