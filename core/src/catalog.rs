//! Option catalog shared by both validation modes.
//!
//! A command's parameters plus the CLI-wide global parameters are flattened
//! into [`ParamSpec`]s, and every option string is indexed for lookup. Long
//! options (`--xxx`) are also indexed by each of their strict prefixes so
//! that an unambiguous abbreviation resolves the way argparse resolves it.
//! Short options are never abbreviation targets.

use std::collections::HashMap;

use crate::error::ParameterError;
use crate::meta::{CommandMeta, Nargs, ParameterMeta, ValueKind};

/// Output formats accepted by `--output`.
pub const OUTPUT_FORMATS: [&str; 7] = ["json", "jsonc", "yaml", "yamlc", "table", "tsv", "none"];

/// How a matched option consumes input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Takes values according to its cardinality.
    Store,
    /// Presence-only flag.
    StoreTrue,
}

/// One entry of the declarative argument schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Destination name.
    pub dest: String,
    /// Option strings; empty for positionals.
    pub options: Vec<String>,
    /// Backing value kind.
    pub kind: ValueKind,
    /// Allowed values.
    pub choices: Option<Vec<String>>,
    /// Whether the parameter is required.
    pub required: bool,
    /// Cardinality for [`Action::Store`].
    pub nargs: Nargs,
    /// Whether metadata supplies a non-null default.
    pub has_default: bool,
    /// `--ids` segment.
    pub id_part: Option<String>,
    /// How values are consumed.
    pub action: Action,
    /// Lower-case values before checking choices.
    pub lowercase: bool,
    /// Synthesized CLI-wide parameter.
    pub global: bool,
}

impl ParamSpec {
    fn from_meta(param: &ParameterMeta) -> Self {
        let action = if param.name == "yes" {
            Action::StoreTrue
        } else {
            Action::Store
        };
        Self {
            dest: param.name.clone(),
            options: param.options.clone(),
            kind: param.kind(),
            choices: param.choices.clone(),
            required: param.required,
            nargs: param.nargs.unwrap_or(Nargs::Optional),
            has_default: param.has_default(),
            id_part: param.id_part.clone(),
            action,
            lowercase: false,
            global: false,
        }
    }

    fn global(dest: &str, options: &[&str], action: Action) -> Self {
        Self {
            dest: dest.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            kind: ValueKind::String,
            choices: None,
            required: false,
            nargs: Nargs::Optional,
            has_default: false,
            id_part: None,
            action,
            lowercase: false,
            global: true,
        }
    }

    /// Whether this is a positional parameter.
    pub fn is_positional(&self) -> bool {
        self.options.is_empty()
    }

    /// Name used in argument error messages: option strings joined by `/`,
    /// or the destination for positionals.
    pub fn argument_name(&self) -> String {
        if self.is_positional() {
            self.dest.clone()
        } else {
            self.options.join("/")
        }
    }

    /// Name used in "required" messages: option strings joined by `/`, or
    /// `<DEST>` for positionals.
    pub fn display_name(&self) -> String {
        if self.is_positional() {
            format!("<{}>", self.dest.to_uppercase())
        } else {
            self.options.join("/")
        }
    }
}

/// Parameters of one command indexed by option string.
///
/// # Examples
///
/// ```
/// use cli_validator_core::{CommandMeta, OptionCatalog, ParameterMeta};
///
/// let meta = CommandMeta::new("network vnet subnet create")
///     .with_param(ParameterMeta::new("subnet_name", &["--subnet-name"]))
///     .with_param(ParameterMeta::new("subnet_prefix", &["--subnet-prefix"]));
/// let catalog = OptionCatalog::new(&meta);
///
/// assert_eq!(catalog.find("--subnet-n").unwrap().unwrap().dest, "subnet_name");
/// assert_eq!(catalog.find("--out").unwrap().unwrap().dest, "_output_format");
/// assert!(catalog.find("--su").is_err());
/// assert!(catalog.find("--nope").unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct OptionCatalog {
    specs: Vec<ParamSpec>,
    exact: HashMap<String, usize>,
    prefixes: HashMap<String, Vec<usize>>,
    supports_ids: bool,
}

impl OptionCatalog {
    /// Builds the catalog for `meta`, adding the global parameters and, unless
    /// the command declares its own, `--subscription`.
    pub fn new(meta: &CommandMeta) -> Self {
        let mut specs: Vec<ParamSpec> = meta.parameters.iter().map(ParamSpec::from_meta).collect();
        specs.extend(global_specs());
        if meta.param("subscription").is_none() {
            specs.push(ParamSpec::global("_subscription", &["--subscription"], Action::Store));
        }

        let mut exact = HashMap::new();
        let mut prefixes: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, spec) in specs.iter().enumerate() {
            for option in &spec.options {
                exact.insert(option.clone(), idx);
                if !option.starts_with("--") {
                    continue;
                }
                for end in 3..option.len() {
                    if !option.is_char_boundary(end) {
                        continue;
                    }
                    let owners = prefixes.entry(option[..end].to_string()).or_default();
                    if !owners.contains(&idx) {
                        owners.push(idx);
                    }
                }
            }
        }

        Self {
            specs,
            exact,
            prefixes,
            supports_ids: meta.supports_ids(),
        }
    }

    /// All parameters, own first, then globals.
    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    /// Whether `--ids` stands in for the `id_part` parameters.
    pub fn supports_ids(&self) -> bool {
        self.supports_ids
    }

    /// Positional parameters in declaration order.
    pub fn positionals(&self) -> impl Iterator<Item = &ParamSpec> {
        self.specs.iter().filter(|spec| spec.is_positional())
    }

    /// Exact option lookup, no abbreviation.
    pub fn get(&self, option: &str) -> Option<&ParamSpec> {
        self.exact.get(option).map(|&idx| &self.specs[idx])
    }

    /// Resolves an option string: exact match first, then unique prefix.
    ///
    /// # Errors
    ///
    /// [`ParameterError::AmbiguousOption`] when the prefix is shared by two or
    /// more parameters.
    pub fn find(&self, option: &str) -> Result<Option<&ParamSpec>, ParameterError> {
        if let Some(spec) = self.get(option) {
            return Ok(Some(spec));
        }
        match self.prefixes.get(option).map(Vec::as_slice) {
            Some([idx]) => Ok(Some(&self.specs[*idx])),
            Some(owners) if owners.len() > 1 => {
                let matches = owners
                    .iter()
                    .flat_map(|&idx| self.specs[idx].options.iter())
                    .filter(|candidate| candidate.starts_with(option))
                    .cloned()
                    .collect();
                Err(ParameterError::AmbiguousOption {
                    input: option.to_string(),
                    matches,
                })
            }
            _ => Ok(None),
        }
    }
}

fn global_specs() -> Vec<ParamSpec> {
    let query = ParamSpec {
        kind: ValueKind::JmesPath,
        ..ParamSpec::global("_jmespath_query", &["--query"], Action::Store)
    };
    let output = ParamSpec {
        choices: Some(OUTPUT_FORMATS.iter().map(|f| f.to_string()).collect()),
        lowercase: true,
        ..ParamSpec::global("_output_format", &["--output", "-o"], Action::Store)
    };
    vec![
        ParamSpec::global("_log_verbosity_verbose", &["--verbose"], Action::StoreTrue),
        ParamSpec::global("_log_verbosity_debug", &["--debug"], Action::StoreTrue),
        ParamSpec::global(
            "_log_verbosity_only_show_errors",
            &["--only-show-errors"],
            Action::StoreTrue,
        ),
        output,
        query,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> CommandMeta {
        CommandMeta::new("vm show")
            .with_param(
                ParameterMeta::new("vm_name", &["--name", "-n"])
                    .required()
                    .with_id_part("name"),
            )
            .with_param(ParameterMeta::new("name_prefix", &["--name-prefix"]))
            .with_param(ParameterMeta::new("resource_group_name", &["--resource-group", "-g"]))
            .with_param(ParameterMeta::new("yes", &["--yes", "-y"]))
    }

    #[test]
    fn test_exact_match_beats_longer_option_prefix() {
        let catalog = OptionCatalog::new(&meta());
        assert_eq!(catalog.find("--name").unwrap().unwrap().dest, "vm_name");
        assert_eq!(catalog.find("--name-p").unwrap().unwrap().dest, "name_prefix");
    }

    #[test]
    fn test_ambiguous_prefix_lists_full_options() {
        let catalog = OptionCatalog::new(&meta());
        let err = catalog.find("--na").unwrap_err();
        assert_eq!(
            err,
            ParameterError::AmbiguousOption {
                input: "--na".into(),
                matches: vec!["--name".into(), "--name-prefix".into()],
            }
        );
    }

    #[test]
    fn test_short_options_are_not_abbreviated() {
        let meta = CommandMeta::new("x").with_param(ParameterMeta::new("abc", &["-abc"]));
        let catalog = OptionCatalog::new(&meta);
        assert!(catalog.find("-ab").unwrap().is_none());
        assert_eq!(catalog.find("-abc").unwrap().unwrap().dest, "abc");
    }

    #[test]
    fn test_globals_and_subscription() {
        let catalog = OptionCatalog::new(&meta());
        assert!(catalog.find("-o").unwrap().unwrap().global);
        assert_eq!(catalog.find("--subscription").unwrap().unwrap().dest, "_subscription");

        let own = CommandMeta::new("account set")
            .with_param(ParameterMeta::new("subscription", &["--subscription", "-s"]).required());
        let catalog = OptionCatalog::new(&own);
        let spec = catalog.find("--subscription").unwrap().unwrap();
        assert_eq!(spec.dest, "subscription");
        assert!(!spec.global);
    }

    #[test]
    fn test_yes_is_presence_only() {
        let catalog = OptionCatalog::new(&meta());
        assert_eq!(catalog.find("-y").unwrap().unwrap().action, Action::StoreTrue);
        assert!(catalog.supports_ids());
    }

    #[test]
    fn test_one_parameter_with_two_long_options_is_not_ambiguous() {
        let meta = CommandMeta::new("x")
            .with_param(ParameterMeta::new("location", &["--location", "--loc-name"]));
        let catalog = OptionCatalog::new(&meta);
        assert_eq!(catalog.find("--lo").unwrap().unwrap().dest, "location");
    }
}
