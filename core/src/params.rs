//! Parameter validation against command metadata.
//!
//! [`ParamValidator`] interprets a command's [`OptionCatalog`] in one of two
//! modes:
//!
//! - [`ParamValidator::validate_params`] parses actual argument values the way
//!   argparse would: option abbreviation, `--opt=value` and `-oVALUE` forms,
//!   cardinality, type conversion, choices and placeholders.
//! - [`ParamValidator::validate_param_keys`] checks a bare list of option
//!   names, with no values at all.
//!
//! Both report `-h`/`--help` as [`Verdict::Help`] rather than as a failure, so
//! callers decide whether a help request is acceptable.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::{Action, OptionCatalog, ParamSpec};
use crate::error::{ParameterError, PolicyError, ValidateError};
use crate::meta::{CommandMeta, Nargs, ValueKind};
use crate::placeholder::is_placeholder;

pub(crate) const HELP_FLAGS: [&str; 2] = ["-h", "--help"];

static NEGATIVE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\d+$|^-\d*\.\d+$").expect("static regex must compile"));

/// Successful outcome of a parameter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Parameters are acceptable.
    Valid,
    /// The input asked for help; nothing else was checked past that point.
    Help,
}

/// How one input token was classified before values are consumed.
#[derive(Clone, Copy)]
enum Arg<'c, 't> {
    /// A plain value.
    Value,
    /// The first `--`.
    EndOfOptions,
    Help,
    /// A known option, with a value attached by `=` or short-form gluing.
    Option(&'c ParamSpec, Option<&'t str>),
    /// Looks like an option but matches nothing.
    Unknown,
}

/// Validates parameters of one command.
///
/// # Examples
///
/// ```
/// use cli_validator_core::{CommandMeta, ParamValidator, ParameterMeta, Verdict};
///
/// let meta = CommandMeta::new("group create")
///     .with_param(ParameterMeta::new("rg_name", &["--name", "-n"]).required())
///     .with_param(ParameterMeta::new("location", &["--location", "-l"]).required());
/// let validator = ParamValidator::new(&meta);
///
/// let verdict = validator
///     .validate_params(&["-n", "rg", "--loc", "westus"], false, true)
///     .unwrap();
/// assert_eq!(verdict, Verdict::Valid);
///
/// let err = validator.validate_params(&["-n", "rg"], false, true).unwrap_err();
/// assert_eq!(
///     err.to_string(),
///     "the following arguments are required: --location/-l"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ParamValidator<'m> {
    pub(crate) meta: &'m CommandMeta,
    pub(crate) catalog: OptionCatalog,
}

impl<'m> ParamValidator<'m> {
    /// Builds the option catalog for `meta`.
    pub fn new(meta: &'m CommandMeta) -> Self {
        Self {
            meta,
            catalog: OptionCatalog::new(meta),
        }
    }

    /// The command being validated.
    pub fn meta(&self) -> &CommandMeta {
        self.meta
    }

    /// The option catalog in use.
    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    /// Parses the parameter words of a command with their values.
    ///
    /// With `placeholder` on, values shaped like placeholders are accepted
    /// as-is and declared choices are not enforced. With `non_interactive`
    /// on, a confirmation command must carry `--yes`.
    ///
    /// # Errors
    ///
    /// The first [`ParameterError`] found, in the order: parse errors
    /// (ambiguity, arity, type, choice), unrecognized arguments, missing
    /// required parameters. Then [`PolicyError::ConfirmationRequired`].
    pub fn validate_params<S: AsRef<str>>(
        &self,
        tokens: &[S],
        non_interactive: bool,
        placeholder: bool,
    ) -> Result<Verdict, ValidateError> {
        let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();

        // `words[i]` is the input token behind `args[i]`; a flag cluster
        // repeats its token once per expanded option.
        let mut args = Vec::with_capacity(tokens.len());
        let mut words = Vec::with_capacity(tokens.len());
        let mut options_ended = false;
        for &token in &tokens {
            if options_ended {
                args.push(Arg::Value);
            } else if token == "--" {
                options_ended = true;
                args.push(Arg::EndOfOptions);
            } else if let Some(cluster) = self.flag_cluster(token)? {
                words.extend(std::iter::repeat_n(token, cluster.len() - 1));
                args.extend(cluster);
            } else {
                args.push(self.classify(token)?);
            }
            words.push(token);
        }

        let mut received: HashSet<&str> = HashSet::new();
        let mut ids_given = false;
        let mut positionals: Vec<(usize, &str)> = Vec::new();
        let mut extras: Vec<(usize, &str)> = Vec::new();

        let mut idx = 0;
        while idx < args.len() {
            match args[idx] {
                Arg::EndOfOptions => {}
                Arg::Value => positionals.push((idx, words[idx])),
                Arg::Unknown => extras.push((idx, words[idx])),
                Arg::Help => return Ok(Verdict::Help),
                Arg::Option(spec, explicit) => {
                    let available = args[idx + 1..]
                        .iter()
                        .take_while(|arg| matches!(arg, Arg::Value))
                        .count();
                    let following = &words[idx + 1..idx + 1 + available];
                    let values = option_values(spec, explicit, following)?;
                    for value in &values {
                        check_value(spec, value, placeholder)?;
                    }
                    if spec.action == Action::StoreTrue
                        || !values.is_empty()
                        || spec.nargs == Nargs::ZeroOrMore
                    {
                        received.insert(spec.dest.as_str());
                    }
                    if spec.dest == "ids" && !values.is_empty() {
                        ids_given = true;
                    }
                    if explicit.is_none() {
                        idx += values.len();
                    }
                }
            }
            idx += 1;
        }

        let mut rest = positionals.as_slice();
        for spec in self.catalog.positionals() {
            let take = match spec.nargs {
                Nargs::Optional => rest.len().min(1),
                Nargs::ZeroOrMore | Nargs::OneOrMore => rest.len(),
                Nargs::Exact(n) if rest.len() >= n => n,
                Nargs::Exact(_) => 0,
            };
            let (values, tail) = rest.split_at(take);
            for (_, value) in values {
                check_value(spec, value, placeholder)?;
            }
            if take > 0 {
                received.insert(spec.dest.as_str());
            }
            rest = tail;
        }
        extras.extend_from_slice(rest);

        if !extras.is_empty() {
            extras.sort_by_key(|(idx, _)| *idx);
            let extras = extras.into_iter().map(|(_, token)| token.to_string()).collect();
            return Err(ParameterError::Unrecognized(extras).into());
        }

        let missing: Vec<String> = self
            .catalog
            .specs()
            .iter()
            .filter(|spec| !spec.global && spec.required && !spec.has_default)
            .filter(|spec| !received.contains(spec.dest.as_str()))
            .filter(|spec| !(ids_given && spec.id_part.is_some()))
            .map(ParamSpec::display_name)
            .collect();
        if !missing.is_empty() {
            return Err(ParameterError::MissingRequired(missing).into());
        }

        if self.meta.confirmation && non_interactive && !received.contains("yes") {
            return Err(PolicyError::ConfirmationRequired.into());
        }
        Ok(Verdict::Valid)
    }

    /// Expands clustered short flags such as `-yn` the way argparse does: a
    /// presence-only flag hands the rest of its token to the next short
    /// option, and the last option may keep the remainder as its value.
    ///
    /// `None` when `token` is not a cluster led by a presence-only flag.
    fn flag_cluster<'t>(&self, token: &'t str) -> Result<Option<Vec<Arg<'_, 't>>>, ParameterError> {
        if token.starts_with("--") || token.contains('=') || self.catalog.get(token).is_some() {
            return Ok(None);
        }
        let Some((short, attached)) = token.split_at_checked(2) else {
            return Ok(None);
        };
        let Some(mut spec) = self
            .catalog
            .get(short)
            .filter(|spec| spec.action == Action::StoreTrue && !attached.is_empty())
        else {
            return Ok(None);
        };

        let mut cluster = Vec::new();
        let mut rest = attached;
        while spec.action == Action::StoreTrue && !rest.is_empty() {
            cluster.push(Arg::Option(spec, None));
            let mut chars = rest.chars();
            let Some(flag) = chars.next() else {
                break;
            };
            let next = format!("-{flag}");
            if HELP_FLAGS.contains(&next.as_str()) {
                cluster.push(Arg::Help);
                return Ok(Some(cluster));
            }
            match self.catalog.get(&next) {
                Some(next_spec) => {
                    spec = next_spec;
                    rest = chars.as_str();
                }
                None => return Err(arity(spec, format!("ignored explicit argument '{rest}'"))),
            }
        }
        cluster.push(Arg::Option(spec, (!rest.is_empty()).then_some(rest)));
        Ok(Some(cluster))
    }

    fn classify<'t>(&self, token: &'t str) -> Result<Arg<'_, 't>, ParameterError> {
        if !token.starts_with('-') || token.len() == 1 {
            return Ok(Arg::Value);
        }
        if HELP_FLAGS.contains(&token) {
            return Ok(Arg::Help);
        }
        if let Some(spec) = self.catalog.get(token) {
            return Ok(Arg::Option(spec, None));
        }

        let (name, explicit) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };
        if HELP_FLAGS.contains(&name) {
            return Ok(Arg::Help);
        }
        if let Some(spec) = self.catalog.find(name)? {
            return Ok(Arg::Option(spec, explicit));
        }

        if !token.starts_with("--") {
            if let Some((short, attached)) = token.split_at_checked(2) {
                if let Some(spec) = self.catalog.get(short) {
                    return Ok(Arg::Option(spec, Some(attached)));
                }
            }
        }

        if NEGATIVE_NUMBER_RE.is_match(token) || token.contains(' ') {
            return Ok(Arg::Value);
        }
        Ok(Arg::Unknown)
    }
}

/// Picks the values an option consumes from the words that follow it.
fn option_values<'t>(
    spec: &ParamSpec,
    explicit: Option<&'t str>,
    following: &[&'t str],
) -> Result<Vec<&'t str>, ParameterError> {
    if spec.action == Action::StoreTrue {
        return match explicit {
            Some(value) => Err(arity(spec, format!("ignored explicit argument '{value}'"))),
            None => Ok(Vec::new()),
        };
    }

    if let Some(value) = explicit {
        return match spec.nargs {
            Nargs::Exact(n) if n != 1 => Err(arity(spec, expected_count(n))),
            _ => Ok(vec![value]),
        };
    }

    let take = match spec.nargs {
        Nargs::Optional => following.len().min(1),
        Nargs::ZeroOrMore => following.len(),
        Nargs::OneOrMore if following.is_empty() => {
            return Err(arity(spec, "expected at least one argument".to_string()));
        }
        Nargs::OneOrMore => following.len(),
        Nargs::Exact(n) if following.len() < n => return Err(arity(spec, expected_count(n))),
        Nargs::Exact(n) => n,
    };
    Ok(following[..take].to_vec())
}

fn expected_count(n: usize) -> String {
    if n == 1 {
        "expected one argument".to_string()
    } else {
        format!("expected {n} arguments")
    }
}

fn arity(spec: &ParamSpec, expected: String) -> ParameterError {
    ParameterError::WrongArity {
        argument: spec.argument_name(),
        expected,
    }
}

/// Placeholder, then type conversion, then choices.
fn check_value(spec: &ParamSpec, value: &str, placeholder: bool) -> Result<(), ParameterError> {
    if placeholder && is_placeholder(value) {
        return Ok(());
    }
    let value = if spec.lowercase {
        value.to_lowercase()
    } else {
        value.to_string()
    };
    // Queries may embed placeholders, so they compile only in literal mode.
    let deferred = placeholder && spec.kind == ValueKind::JmesPath;
    if !deferred && !spec.kind.accepts(&value) {
        return Err(ParameterError::InvalidValue {
            argument: spec.argument_name(),
            kind: spec.kind.type_name(),
            value,
        });
    }
    if placeholder {
        return Ok(());
    }
    if let Some(choices) = &spec.choices {
        if !choices.iter().any(|choice| spec.kind.same_value(&value, choice)) {
            return Err(ParameterError::InvalidChoice {
                argument: spec.argument_name(),
                value,
                choices: choices.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::ParameterMeta;

    fn vm_update() -> CommandMeta {
        CommandMeta::new("vm update")
            .with_param(
                ParameterMeta::new("vm_name", &["--name", "-n"])
                    .required()
                    .with_id_part("name"),
            )
            .with_param(
                ParameterMeta::new("resource_group_name", &["--resource-group", "-g"])
                    .required()
                    .with_id_part("resource_group"),
            )
            .with_param(ParameterMeta::new("ids", &["--ids"]).with_nargs(Nargs::OneOrMore))
            .with_param(
                ParameterMeta::new("location", &["--location", "-l"])
                    .with_type("custom_type")
                    .with_choices(&["eastus", "westus"]),
            )
            .with_param(ParameterMeta::new("count", &["--count"]).with_type("Int"))
            .with_param(ParameterMeta::new("zones", &["--zones", "-z"]).with_nargs(Nargs::OneOrMore))
            .with_param(ParameterMeta::new("yes", &["--yes", "-y"]).with_type("bool"))
    }

    fn check(meta: &CommandMeta, tokens: &[&str], placeholder: bool) -> Result<Verdict, String> {
        ParamValidator::new(meta)
            .validate_params(tokens, false, placeholder)
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_valid_with_abbreviation_and_equals_forms() {
        let meta = vm_update();
        assert_eq!(
            check(&meta, &["--na=vm1", "--resource-g", "rg", "-o", "TABLE"], false),
            Ok(Verdict::Valid)
        );
        assert_eq!(check(&meta, &["-nvm1", "-g", "rg"], false), Ok(Verdict::Valid));
    }

    #[test]
    fn test_missing_required_lists_option_strings() {
        assert_eq!(
            check(&vm_update(), &["--count", "3"], true),
            Err(
                "the following arguments are required: --name/-n, --resource-group/-g"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_ids_satisfies_id_part_parameters() {
        assert_eq!(
            check(&vm_update(), &["--ids", "/subscriptions/0/vm1", "/subscriptions/0/vm2"], true),
            Ok(Verdict::Valid)
        );
    }

    #[test]
    fn test_option_without_value_does_not_satisfy_required() {
        assert_eq!(
            check(&vm_update(), &["--name", "-g", "rg"], true),
            Err("the following arguments are required: --name/-n".to_string())
        );
    }

    #[test]
    fn test_type_conversion() {
        let meta = vm_update();
        assert_eq!(
            check(&meta, &["-n", "a", "-g", "b", "--count", "abc"], true),
            Err("argument --count: invalid int value: 'abc'".to_string())
        );
        assert_eq!(
            check(&meta, &["-n", "a", "-g", "b", "--count", "-5"], false),
            Ok(Verdict::Valid)
        );
        assert_eq!(
            check(&meta, &["-n", "a", "-g", "b", "--count", "$COUNT"], true),
            Ok(Verdict::Valid)
        );
    }

    #[test]
    fn test_query_must_compile_without_placeholder_mode() {
        let meta = vm_update();
        assert_eq!(
            check(&meta, &["-n", "a", "-g", "b", "--query", "[?name=="], false),
            Err("argument --query: invalid jmespath_type value: '[?name=='".to_string())
        );
        assert_eq!(
            check(&meta, &["-n", "a", "-g", "b", "--query", "[?name=='vm1'].id"], false),
            Ok(Verdict::Valid)
        );
        assert_eq!(
            check(&meta, &["-n", "a", "-g", "b", "--query", "[?name==<NAME>]"], true),
            Ok(Verdict::Valid)
        );
    }

    #[test]
    fn test_choices_only_without_placeholder_mode() {
        let meta = vm_update();
        let tokens = ["-n", "a", "-g", "b", "-l", "neither"];
        assert_eq!(
            check(&meta, &tokens, false),
            Err(
                "argument --location/-l: invalid choice: 'neither' (choose from 'eastus', 'westus')"
                    .to_string()
            )
        );
        assert_eq!(check(&meta, &tokens, true), Ok(Verdict::Valid));
        assert_eq!(
            check(&meta, &["-n", "a", "-g", "b", "-l", "<LOCATION>"], true),
            Ok(Verdict::Valid)
        );
    }

    #[test]
    fn test_output_format_is_lowercased_then_checked() {
        let meta = vm_update();
        let err = check(&meta, &["-n", "a", "-g", "b", "--output", "xml"], false).unwrap_err();
        assert!(err.starts_with("argument --output/-o: invalid choice: 'xml'"), "{err}");
    }

    #[test]
    fn test_unrecognized_in_input_order() {
        assert_eq!(
            check(&vm_update(), &["--bogus", "x", "-n", "a", "-g", "b", "stray"], true),
            Err("unrecognized arguments: --bogus x stray".to_string())
        );
    }

    #[test]
    fn test_arity_errors() {
        let meta = vm_update();
        assert_eq!(
            check(&meta, &["-n", "a", "-g", "b", "--zones"], true),
            Err("argument --zones/-z: expected at least one argument".to_string())
        );
        assert_eq!(
            check(&meta, &["-n", "a", "-g", "b", "--yes=1"], true),
            Err("argument --yes/-y: ignored explicit argument '1'".to_string())
        );
        assert_eq!(
            check(&meta, &["-n", "a", "-g", "b", "-z", "1", "2", "3"], true),
            Ok(Verdict::Valid)
        );
    }

    #[test]
    fn test_clustered_short_flags() {
        let meta = CommandMeta::new("group delete")
            .with_param(ParameterMeta::new("rg_name", &["--name", "-n"]).required())
            .with_param(ParameterMeta::new("yes", &["--yes", "-y"]))
            .with_confirmation();
        let validator = ParamValidator::new(&meta);

        assert_eq!(validator.validate_params(&["-yn", "rg"], true, true), Ok(Verdict::Valid));
        assert_eq!(validator.validate_params(&["-ynrg"], true, true), Ok(Verdict::Valid));
        assert_eq!(validator.validate_params(&["-yh"], true, true), Ok(Verdict::Help));
        assert_eq!(
            validator
                .validate_params(&["-yq", "-n", "rg"], true, true)
                .map_err(|e| e.to_string()),
            Err("argument --yes/-y: ignored explicit argument 'q'".to_string())
        );
        assert_eq!(
            validator
                .validate_params(&["-yn"], true, true)
                .map_err(|e| e.to_string()),
            Err("the following arguments are required: --name/-n".to_string())
        );
    }

    #[test]
    fn test_help_short_circuits_required_check() {
        assert_eq!(check(&vm_update(), &["--help"], true), Ok(Verdict::Help));
        assert_eq!(check(&vm_update(), &["-n", "a", "-h"], true), Ok(Verdict::Help));
    }

    #[test]
    fn test_confirmation_requires_yes_when_non_interactive() {
        let meta = CommandMeta::new("group delete")
            .with_param(ParameterMeta::new("rg_name", &["--name", "-n"]).required())
            .with_param(ParameterMeta::new("yes", &["--yes", "-y"]))
            .with_confirmation();
        let validator = ParamValidator::new(&meta);

        let err = validator.validate_params(&["-n", "rg"], true, true).unwrap_err();
        assert_eq!(err, PolicyError::ConfirmationRequired.into());
        assert_eq!(
            validator.validate_params(&["-n", "rg", "-y"], true, true),
            Ok(Verdict::Valid)
        );
        assert_eq!(
            validator.validate_params(&["-n", "rg"], false, true),
            Ok(Verdict::Valid)
        );
    }

    #[test]
    fn test_positional_parameters() {
        let meta = CommandMeta::new("extension add")
            .with_param(ParameterMeta::new("source", &[]).required())
            .with_param(ParameterMeta::new("version", &["--version"]));
        assert_eq!(check(&meta, &["./ext.whl"], true), Ok(Verdict::Valid));
        assert_eq!(
            check(&meta, &["--version", "1.0"], true),
            Err("the following arguments are required: <SOURCE>".to_string())
        );
        assert_eq!(
            check(&meta, &["a", "b"], true),
            Err("unrecognized arguments: b".to_string())
        );
    }

    #[test]
    fn test_default_satisfies_required() {
        let mut location = ParameterMeta::new("location", &["--location"]).required();
        location.default = Some(serde_json::json!("eastus"));
        let meta = CommandMeta::new("group create").with_param(location);
        assert_eq!(check(&meta, &[], true), Ok(Verdict::Valid));
    }

    #[test]
    fn test_double_dash_ends_options() {
        let meta = CommandMeta::new("x")
            .with_param(ParameterMeta::new("args", &[]).with_nargs(Nargs::ZeroOrMore));
        assert_eq!(check(&meta, &["--", "--not-an-option"], true), Ok(Verdict::Valid));
    }
}
