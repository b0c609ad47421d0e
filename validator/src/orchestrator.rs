//! Validation orchestration across metadata sources.

use std::sync::Arc;

use cli_validator_core::{
    CommandInfo, CommandMeta, CommandSource, LineIndex, MetadataProvider, ModuleMeta,
    ParamValidator, PolicyError, ProviderError, ROOT_COMMAND, ResolutionError, ScriptValidationItem,
    StructuralError, ValidateError, ValidationResult, Verdict, join, quote_placeholders,
    root_invocations, split,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const HELP_FLAGS: [&str; 2] = ["-h", "--help"];

/// Caller policy for one validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateOptions {
    /// Require `--yes` on commands that ask for confirmation.
    pub non_interactive: bool,
    /// Accept placeholder values such as `$rg` or `<NAME>` and skip choice
    /// checks.
    pub placeholder: bool,
    /// Report help requests as invalid.
    pub reject_help: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            non_interactive: false,
            placeholder: true,
            reject_help: true,
        }
    }
}

/// A command resolved in one source, with its module's metadata.
struct Resolved {
    source: CommandSource,
    info: CommandInfo,
    module: Option<Arc<ModuleMeta>>,
}

impl Resolved {
    fn command_meta(&self) -> Option<&CommandMeta> {
        self.module.as_ref()?.find_command(&self.info.signature)
    }
}

/// Validates commands against the metadata of a [`MetadataProvider`].
#[derive(Debug, Clone)]
pub struct Validator<P> {
    provider: P,
}

impl<P: MetadataProvider> Validator<P> {
    /// Creates a validator over `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The metadata provider in use.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Validates one command line, parameter values included.
    ///
    /// With placeholder mode on, placeholders following a space are quoted
    /// before splitting so that `<resource group>` stays one value.
    pub fn validate_command(&self, command: &str, options: ValidateOptions) -> ValidationResult {
        let prepared = if options.placeholder {
            quote_placeholders(command)
        } else {
            command.to_string()
        };
        match split(&prepared, false) {
            Ok(words) => self.check_words(command, &words, options),
            Err(err) => ValidationResult {
                validated_param: false,
                ..ValidationResult::from_error(
                    command,
                    CommandSource::Unknown,
                    &StructuralError::from(err).into(),
                )
            },
        }
    }

    /// Validates a command signature (e.g. `az vm create`) and the option
    /// names used with it, without values.
    pub fn validate_signature_and_keys<S: AsRef<str>>(
        &self,
        signature: &str,
        keys: &[S],
        options: ValidateOptions,
    ) -> ValidationResult {
        let keys: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
        let command = format!("{signature} {}", keys.join(" "));
        let unknown = CommandSource::Unknown;

        let words = match split(signature, false) {
            Ok(words) => words,
            Err(err) => {
                return ValidationResult::from_error(command, unknown, &StructuralError::from(err).into());
            }
        };
        let resolved = match self.resolve(&words) {
            Ok(resolved) => resolved,
            Err(ValidateError::Resolution(ResolutionError::MissingSubCommand(_)))
                if matches!(keys.as_slice(), [key] if HELP_FLAGS.contains(key)) =>
            {
                return help_result(command, unknown, options.reject_help);
            }
            Err(err) => return ValidationResult::from_error(command, unknown, &err),
        };
        if resolved.info.is_help() {
            return help_result(command, resolved.source, options.reject_help);
        }
        if !resolved.info.parameters.is_empty() {
            let err = ResolutionError::TooLongSignature {
                command: signature.to_string(),
                fixed: format!("{ROOT_COMMAND} {}", join(&resolved.info.signature)),
            };
            return ValidationResult::from_error(command, unknown, &err.into());
        }

        let source = resolved.source;
        let Some(meta) = resolved.command_meta() else {
            debug!(signature = ?resolved.info.signature, %source, "No metadata for command");
            return ValidationResult::unchecked(command, source);
        };
        let verdict = ParamValidator::new(meta).validate_param_keys(&keys, options.non_interactive);
        verdict_result(command, source, verdict, options.reject_help)
    }

    /// Validates every `az` invocation in a shell script, nested command
    /// substitutions included.
    ///
    /// Results follow the order in which invocations close, so a command
    /// substitution comes before the command that contains it. Placeholder
    /// mode is always on for scripts. A script that cannot be tokenized yields a single invalid item
    /// spanning the whole script.
    pub fn validate_script(&self, script: &str, options: ValidateOptions) -> Vec<ScriptValidationItem> {
        let index = LineIndex::new(script);
        let invocations = match root_invocations(script).collect::<Result<Vec<_>, _>>() {
            Ok(invocations) => invocations,
            Err(err) => {
                debug!(error = %err, "Script could not be tokenized");
                let end_line = index.line_count().saturating_sub(1);
                let end_col = index.line(end_line).map_or(0, str::len);
                return vec![ScriptValidationItem {
                    line: 0,
                    col: 0,
                    end_line,
                    end_col,
                    result: ValidationResult::from_error(
                        script,
                        CommandSource::Unknown,
                        &StructuralError::from(err).into(),
                    ),
                }];
            }
        };

        let options = ValidateOptions {
            placeholder: true,
            ..options
        };
        invocations
            .par_iter()
            .map(|invocation| {
                let (line, col, end_line, end_col) = invocation.span();
                let text = invocation.source(&index).unwrap_or_default();
                ScriptValidationItem {
                    line,
                    col,
                    end_line,
                    end_col,
                    result: self.check_words(text, &invocation.words(), options),
                }
            })
            .collect()
    }

    /// Resolves and validates already-split words; `command` is the text
    /// reported in the result.
    fn check_words<S: AsRef<str>>(
        &self,
        command: &str,
        words: &[S],
        options: ValidateOptions,
    ) -> ValidationResult {
        let resolved = match self.resolve(words) {
            Ok(resolved) => resolved,
            Err(err) => return ValidationResult::from_error(command, CommandSource::Unknown, &err),
        };
        let source = resolved.source;
        if resolved.info.is_help() {
            return help_result(command, source, options.reject_help);
        }
        let Some(meta) = resolved.command_meta() else {
            debug!(signature = ?resolved.info.signature, %source, "No metadata for command");
            return ValidationResult::unchecked(command, source);
        };
        let verdict = ParamValidator::new(meta).validate_params(
            &resolved.info.parameters,
            options.non_interactive,
            options.placeholder,
        );
        verdict_result(command, source, verdict, options.reject_help)
    }

    /// Tries each source in priority order.
    ///
    /// The first source that resolves the command wins. Otherwise the first
    /// retrieval failure or corrupted tree is reported, then a missing sub-command, then the
    /// last unknown-command error.
    fn resolve<S: AsRef<str>>(&self, words: &[S]) -> Result<Resolved, ValidateError> {
        match words.first().map(|word| word.as_ref()) {
            None => return Err(StructuralError::EmptyCommand.into()),
            Some(first) if first != ROOT_COMMAND => return Err(StructuralError::NotRootCommand.into()),
            Some(_) => {}
        }

        let mut failure = None;
        let mut missing = None;
        let mut unknown = None;
        for source in self.provider.sources() {
            match self.resolve_in(source, words) {
                Ok(resolved) => return Ok(resolved),
                Err(err @ ValidateError::Resolution(ResolutionError::MissingSubCommand(_))) => {
                    missing.get_or_insert(err);
                }
                Err(err @ ValidateError::Resolution(_)) => unknown = Some(err),
                Err(err) => {
                    warn!(%source, error = %err, "Skipping metadata source");
                    failure.get_or_insert(err);
                }
            }
        }

        Err(failure
            .or(missing)
            .or(unknown)
            .unwrap_or_else(|| ResolutionError::UnknownCommand(join(words)).into()))
    }

    fn resolve_in<S: AsRef<str>>(
        &self,
        source: CommandSource,
        words: &[S],
    ) -> Result<Resolved, ValidateError> {
        let tree = self
            .provider
            .command_tree(source)
            .map_err(ProviderError::into_validate_error)?;
        let info = tree.resolve(words)?;
        let module = match &info.module {
            Some(module) => Some(
                self.provider
                    .module_meta(source, module)
                    .map_err(ProviderError::into_validate_error)?,
            ),
            None => None,
        };
        debug!(%source, signature = ?info.signature, module = ?info.module, "Resolved command");
        Ok(Resolved {
            source,
            info,
            module,
        })
    }
}

fn help_result(command: impl Into<String>, source: CommandSource, reject_help: bool) -> ValidationResult {
    if reject_help {
        ValidationResult::from_error(command, source, &PolicyError::HelpRequested.into())
    } else {
        ValidationResult::unchecked(command, source)
    }
}

fn verdict_result(
    command: impl Into<String>,
    source: CommandSource,
    verdict: Result<Verdict, ValidateError>,
    reject_help: bool,
) -> ValidationResult {
    match verdict {
        Ok(Verdict::Valid) => ValidationResult::valid(command, source),
        Ok(Verdict::Help) => help_result(command, source, reject_help),
        Err(err) => ValidationResult::from_error(command, source, &err),
    }
}
