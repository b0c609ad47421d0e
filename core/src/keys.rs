//! Key-only parameter validation.

use crate::catalog::ParamSpec;
use crate::error::{ParameterError, PolicyError, ValidateError};
use crate::params::{HELP_FLAGS, ParamValidator, Verdict};
use crate::placeholder::is_key_placeholder;

impl ParamValidator<'_> {
    /// Checks a list of option names (no values) against the command.
    ///
    /// Each key is looked up exactly or by unique long-option prefix. `--ids`
    /// stands in for every `id_part` parameter when the command supports it.
    /// A `<NAME>` key stands in for the sole positional parameter, or for a
    /// required positional whose name matches.
    ///
    /// # Errors
    ///
    /// [`ParameterError::AmbiguousOption`] as soon as an ambiguous key is met,
    /// then [`ParameterError::UnrecognizedKeys`], then
    /// [`ParameterError::MissingRequired`], then
    /// [`PolicyError::ConfirmationRequired`] when `non_interactive` is set and
    /// neither `--yes` nor `-y` is present.
    ///
    /// # Examples
    ///
    /// ```
    /// use cli_validator_core::{CommandMeta, ParamValidator, ParameterMeta, Verdict};
    ///
    /// let meta = CommandMeta::new("network vnet subnet create")
    ///     .with_param(ParameterMeta::new("subnet_name", &["--subnet-name"]).required())
    ///     .with_param(ParameterMeta::new("subnet_prefix", &["--subnet-prefix"]));
    /// let validator = ParamValidator::new(&meta);
    ///
    /// assert_eq!(validator.validate_param_keys(&["--subnet-n"], false), Ok(Verdict::Valid));
    /// assert_eq!(
    ///     validator.validate_param_keys(&["--su"], false).unwrap_err().to_string(),
    ///     "ambiguous option: --su could match --subnet-name, --subnet-prefix, --subscription",
    /// );
    /// ```
    pub fn validate_param_keys<S: AsRef<str>>(
        &self,
        keys: &[S],
        non_interactive: bool,
    ) -> Result<Verdict, ValidateError> {
        let keys: Vec<&str> = keys.iter().map(AsRef::as_ref).collect();
        let positionals: Vec<&ParamSpec> = self.catalog.positionals().collect();
        let mut required: Vec<&ParamSpec> =
            self.catalog.specs().iter().filter(|spec| spec.required).collect();
        let mut unresolved = Vec::new();

        for key in &keys {
            let found = self.catalog.find(key)?;
            if let Some(spec) = found {
                required.retain(|r| r.dest != spec.dest);
            }
            if *key == "--ids" && self.catalog.supports_ids() {
                required.retain(|r| r.id_part.is_none());
                continue;
            }
            if found.is_some() {
                continue;
            }
            if HELP_FLAGS.contains(key) {
                return Ok(Verdict::Help);
            }
            if is_key_placeholder(key) {
                match positionals.as_slice() {
                    [only] if required.iter().any(|r| r.dest == only.dest) => {
                        required.retain(|r| r.dest != only.dest);
                    }
                    _ => {
                        let name = placeholder_name(key);
                        required.retain(|r| !(r.dest == name && r.is_positional()));
                    }
                }
                continue;
            }
            unresolved.push(key.to_string());
        }

        if !unresolved.is_empty() {
            return Err(ParameterError::UnrecognizedKeys(unresolved).into());
        }
        if !required.is_empty() {
            let missing = required.iter().map(|spec| spec.display_name()).collect();
            return Err(ParameterError::MissingRequired(missing).into());
        }

        let has_yes = keys.iter().any(|key| *key == "--yes" || *key == "-y");
        if self.meta.confirmation && non_interactive && !has_yes {
            return Err(PolicyError::ConfirmationRequired.into());
        }
        Ok(Verdict::Valid)
    }
}

/// `<VM_NAME>` becomes `vm_name`.
fn placeholder_name(key: &str) -> String {
    let mut chars = key.chars();
    chars.next();
    chars.next_back();
    chars.as_str().to_lowercase()
}

#[cfg(test)]
mod tests {
    use crate::error::{ParameterError, PolicyError};
    use crate::meta::{CommandMeta, ParameterMeta};
    use crate::params::{ParamValidator, Verdict};

    fn subnet_create() -> CommandMeta {
        CommandMeta::new("network vnet subnet create")
            .with_param(ParameterMeta::new("subnet_name", &["--subnet-name", "--name", "-n"]).required())
            .with_param(ParameterMeta::new("subnet_prefix", &["--subnet-prefix"]))
            .with_param(
                ParameterMeta::new("resource_group_name", &["--resource-group", "-g"]).required(),
            )
    }

    fn vm_show() -> CommandMeta {
        CommandMeta::new("vm show")
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
            .with_param(ParameterMeta::new("ids", &["--ids"]))
    }

    #[test]
    fn test_ambiguous_prefix() {
        let meta = subnet_create();
        let err = ParamValidator::new(&meta)
            .validate_param_keys(&["-g", "--su"], false)
            .unwrap_err();
        assert_eq!(
            err,
            ParameterError::AmbiguousOption {
                input: "--su".into(),
                matches: vec![
                    "--subnet-name".into(),
                    "--subnet-prefix".into(),
                    "--subscription".into(),
                ],
            }
            .into()
        );
    }

    #[test]
    fn test_unique_prefix_satisfies_required() {
        let meta = subnet_create();
        assert_eq!(
            ParamValidator::new(&meta).validate_param_keys(&["--subnet-n", "--resource-gr"], false),
            Ok(Verdict::Valid)
        );
    }

    #[test]
    fn test_missing_and_unrecognized() {
        let meta = subnet_create();
        let validator = ParamValidator::new(&meta);
        assert_eq!(
            validator.validate_param_keys(&["-n"], false).unwrap_err().to_string(),
            "the following arguments are required: --resource-group/-g"
        );
        assert_eq!(
            validator
                .validate_param_keys(&["-n", "--foo", "--bar"], false)
                .unwrap_err()
                .to_string(),
            "unrecognized arguments: --foo, --bar"
        );
    }

    #[test]
    fn test_ids_replaces_id_part_parameters() {
        let meta = vm_show();
        let validator = ParamValidator::new(&meta);
        assert_eq!(validator.validate_param_keys(&["--ids"], false), Ok(Verdict::Valid));
        assert_eq!(
            validator.validate_param_keys(&["--query"], false).unwrap_err().to_string(),
            "the following arguments are required: --name/-n, --resource-group/-g"
        );
    }

    #[test]
    fn test_ids_is_unknown_for_create_commands() {
        let meta = CommandMeta::new("vm create").with_param(
            ParameterMeta::new("vm_name", &["--name", "-n"])
                .required()
                .with_id_part("name"),
        );
        assert_eq!(
            ParamValidator::new(&meta)
                .validate_param_keys(&["--ids"], false)
                .unwrap_err()
                .to_string(),
            "unrecognized arguments: --ids"
        );
    }

    #[test]
    fn test_help_key() {
        let meta = subnet_create();
        assert_eq!(
            ParamValidator::new(&meta).validate_param_keys(&["--help"], false),
            Ok(Verdict::Help)
        );
    }

    #[test]
    fn test_placeholder_key_fills_positional() {
        let sole = CommandMeta::new("extension add")
            .with_param(ParameterMeta::new("source", &[]).required());
        assert_eq!(
            ParamValidator::new(&sole).validate_param_keys(&["<WHEEL_PATH>"], false),
            Ok(Verdict::Valid)
        );

        let two = CommandMeta::new("x")
            .with_param(ParameterMeta::new("first", &[]).required())
            .with_param(ParameterMeta::new("second", &[]).required());
        assert_eq!(
            ParamValidator::new(&two)
                .validate_param_keys(&["<FIRST>"], false)
                .unwrap_err()
                .to_string(),
            "the following arguments are required: <SECOND>"
        );
    }

    #[test]
    fn test_confirmation_checks_raw_yes() {
        let meta = CommandMeta::new("group delete")
            .with_param(ParameterMeta::new("yes", &["--yes", "-y"]))
            .with_confirmation();
        let validator = ParamValidator::new(&meta);
        assert_eq!(
            validator.validate_param_keys(&["--output"], true),
            Err(PolicyError::ConfirmationRequired.into())
        );
        assert_eq!(validator.validate_param_keys(&["-y"], true), Ok(Verdict::Valid));
        assert_eq!(validator.validate_param_keys(&["--output"], false), Ok(Verdict::Valid));
    }
}
