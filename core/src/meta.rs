//! Command metadata model.
//!
//! Module metadata JSON nests command groups under `sub_groups` (keyed by the
//! full group path, e.g. `"vm disk"`) and commands under `commands` (keyed by
//! the full command path, e.g. `"vm disk attach"`):
//!
//! ```json
//! {
//!   "name": "vm",
//!   "commands": {},
//!   "sub_groups": {
//!     "vm": {
//!       "name": "vm",
//!       "commands": {
//!         "vm create": {
//!           "name": "vm create",
//!           "parameters": [
//!             { "name": "name", "options": ["--name", "-n"], "required": true }
//!           ]
//!         }
//!       },
//!       "sub_groups": {}
//!     }
//!   }
//! }
//! ```
//!
//! The validator only reads metadata; it is owned by whichever provider
//! loaded it.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Primitive kind backing a declared metadata type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Any text.
    String,
    /// Boolean. Conversion never fails; any text is truthy.
    Boolean,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Float,
    /// A JMESPath expression, as taken by the global `--query`.
    JmesPath,
}

impl ValueKind {
    /// Maps a metadata type name to its backing kind. Unknown names are text.
    ///
    /// # Examples
    ///
    /// ```
    /// use cli_validator_core::ValueKind;
    ///
    /// assert_eq!(ValueKind::from_type_name("Int"), ValueKind::Integer);
    /// assert_eq!(ValueKind::from_type_name("Duration"), ValueKind::Integer);
    /// assert_eq!(ValueKind::from_type_name("List<Float>"), ValueKind::Float);
    /// assert_eq!(ValueKind::from_type_name("custom_type"), ValueKind::String);
    /// assert_eq!(ValueKind::from_type_name("SomethingNew"), ValueKind::String);
    /// ```
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Boolean" | "bool" | "List<Boolean>" => Self::Boolean,
            "Int" | "int" | "List<Int>" | "Duration" => Self::Integer,
            "Float" | "float" | "List<Float>" => Self::Float,
            _ => Self::String,
        }
    }

    /// Argparse name of the conversion, used in error messages.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::String => "str",
            Self::Boolean => "bool",
            Self::Integer => "int",
            Self::Float => "float",
            Self::JmesPath => "jmespath_type",
        }
    }

    /// Checks that `value` converts to this kind.
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Self::String | Self::Boolean => true,
            Self::Integer => parse_int(value).is_some(),
            Self::Float => parse_float(value).is_some(),
            Self::JmesPath => jmespath::compile(value).is_ok(),
        }
    }

    /// Compares a value with a declared choice under this kind's equality.
    pub(crate) fn same_value(self, value: &str, choice: &str) -> bool {
        match self {
            Self::Integer => match (parse_int(value), parse_int(choice)) {
                (Some(a), Some(b)) => a == b,
                _ => value == choice,
            },
            Self::Float => match (parse_float(value), parse_float(choice)) {
                (Some(a), Some(b)) => a == b,
                _ => value == choice,
            },
            Self::String | Self::Boolean | Self::JmesPath => value == choice,
        }
    }
}

/// Canonical sign and digits of an int literal, any width.
fn parse_int(value: &str) -> Option<(bool, String)> {
    let trimmed = value.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
        || !digits.chars().all(|c| c.is_ascii_digit() || c == '_')
    {
        return None;
    }
    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    let digits = match digits.trim_start_matches('0') {
        "" => "0",
        rest => rest,
    };
    Some((negative && digits != "0", digits.to_string()))
}

fn parse_float(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let lowered = trimmed.to_ascii_lowercase();
    match lowered.trim_start_matches(['+', '-']) {
        "inf" | "infinity" | "nan" => return trimmed.parse().ok(),
        _ => {}
    }
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    trimmed.parse().ok()
}

/// Declared cardinality of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    /// Zero or one value (`?`).
    Optional,
    /// Any number of values (`*`).
    ZeroOrMore,
    /// At least one value (`+`).
    OneOrMore,
    /// Exactly `n` values.
    Exact(usize),
}

impl Serialize for Nargs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Optional => serializer.serialize_str("?"),
            Self::ZeroOrMore => serializer.serialize_str("*"),
            Self::OneOrMore => serializer.serialize_str("+"),
            Self::Exact(n) => serializer.serialize_u64(*n as u64),
        }
    }
}

impl<'de> Deserialize<'de> for Nargs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawNargs {
            Count(usize),
            Tag(String),
        }

        match RawNargs::deserialize(deserializer)? {
            RawNargs::Count(n) => Ok(Self::Exact(n)),
            RawNargs::Tag(tag) => match tag.as_str() {
                "?" => Ok(Self::Optional),
                "*" | "..." => Ok(Self::ZeroOrMore),
                "+" => Ok(Self::OneOrMore),
                other => other
                    .parse()
                    .map(Self::Exact)
                    .map_err(|_| serde::de::Error::custom(format!("invalid nargs: {other}"))),
            },
        }
    }
}

/// Metadata for one parameter of a command.
///
/// # Examples
///
/// ```
/// use cli_validator_core::ParameterMeta;
///
/// let param: ParameterMeta = serde_json::from_str(
///     r#"{ "name": "resource_group_name", "options": ["--resource-group", "-g"], "required": true }"#,
/// )
/// .unwrap();
/// assert!(param.required);
/// assert!(!param.is_positional());
/// assert_eq!(param.display_name(), "--resource-group/-g");
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterMeta {
    /// Destination name.
    pub name: String,
    /// Option strings; empty for positional parameters.
    #[serde(default)]
    pub options: Vec<String>,
    /// Declared type name.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Allowed values.
    #[serde(
        default,
        deserialize_with = "choice_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub choices: Option<Vec<String>>,
    /// Whether the parameter must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Declared cardinality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nargs: Option<Nargs>,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Resource-ID segment this parameter can be taken from via `--ids`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_part: Option<String>,
}

impl ParameterMeta {
    /// Creates an optional parameter with the given option strings.
    pub fn new(name: &str, options: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Marks the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the declared type name.
    pub fn with_type(mut self, type_name: &str) -> Self {
        self.type_name = Some(type_name.to_string());
        self
    }

    /// Sets the allowed values.
    pub fn with_choices(mut self, choices: &[&str]) -> Self {
        self.choices = Some(choices.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Sets the cardinality.
    pub fn with_nargs(mut self, nargs: Nargs) -> Self {
        self.nargs = Some(nargs);
        self
    }

    /// Sets the `--ids` segment.
    pub fn with_id_part(mut self, id_part: &str) -> Self {
        self.id_part = Some(id_part.to_string());
        self
    }

    /// Positional parameters have no option strings.
    pub fn is_positional(&self) -> bool {
        self.options.is_empty()
    }

    /// Backing kind of the declared type.
    pub fn kind(&self) -> ValueKind {
        self.type_name
            .as_deref()
            .map_or(ValueKind::String, ValueKind::from_type_name)
    }

    /// How the parameter is named in "required" messages: option strings
    /// joined by `/`, or `<NAME>` for positionals.
    pub fn display_name(&self) -> String {
        if self.is_positional() {
            format!("<{}>", self.name.to_uppercase())
        } else {
            self.options.join("/")
        }
    }

    /// Whether the metadata carries a non-null default.
    pub fn has_default(&self) -> bool {
        self.default.as_ref().is_some_and(|value| !value.is_null())
    }
}

fn choice_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|values| {
        values
            .into_iter()
            .map(|value| match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect()
    }))
}

/// Metadata for one command.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandMeta {
    /// Full command path, e.g. `"vm create"`.
    pub name: String,
    /// Declared parameters, in order.
    #[serde(default)]
    pub parameters: Vec<ParameterMeta>,
    /// Whether the command asks for confirmation before running.
    #[serde(default)]
    pub confirmation: bool,
}

impl CommandMeta {
    /// Creates a command without parameters.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a parameter.
    pub fn with_param(mut self, param: ParameterMeta) -> Self {
        self.parameters.push(param);
        self
    }

    /// Marks the command as requiring confirmation.
    pub fn with_confirmation(mut self) -> Self {
        self.confirmation = true;
        self
    }

    /// Finds a parameter by destination name.
    pub fn param(&self, name: &str) -> Option<&ParameterMeta> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Whether `--ids` can stand in for the parameters carrying `id_part`.
    ///
    /// True unless the command is a `create`, provided some parameter maps
    /// to the `name` or `resource_name` segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use cli_validator_core::{CommandMeta, ParameterMeta};
    ///
    /// let show = CommandMeta::new("vm show")
    ///     .with_param(ParameterMeta::new("vm_name", &["--name", "-n"]).with_id_part("name"));
    /// assert!(show.supports_ids());
    ///
    /// let create = CommandMeta::new("vm create")
    ///     .with_param(ParameterMeta::new("vm_name", &["--name", "-n"]).with_id_part("name"));
    /// assert!(!create.supports_ids());
    /// ```
    pub fn supports_ids(&self) -> bool {
        if self.name.split_whitespace().last() == Some("create") {
            return false;
        }
        self.parameters
            .iter()
            .filter_map(|p| p.id_part.as_deref())
            .any(|part| part == "name" || part == "resource_name")
    }
}

/// A module, or a command group inside one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupMeta {
    /// Group path (empty for a module root).
    #[serde(default)]
    pub name: String,
    /// Commands keyed by full command path.
    #[serde(default)]
    pub commands: BTreeMap<String, CommandMeta>,
    /// Nested groups keyed by full group path.
    #[serde(default)]
    pub sub_groups: BTreeMap<String, GroupMeta>,
}

/// Metadata for a whole module or extension.
pub type ModuleMeta = GroupMeta;

impl GroupMeta {
    /// Creates an empty group.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a command, keyed by its name.
    pub fn with_command(mut self, command: CommandMeta) -> Self {
        self.commands.insert(command.name.clone(), command);
        self
    }

    /// Adds a nested group, keyed by its name.
    pub fn with_group(mut self, group: GroupMeta) -> Self {
        self.sub_groups.insert(group.name.clone(), group);
        self
    }

    /// Finds the metadata of the command at `signature`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cli_validator_core::{CommandMeta, GroupMeta};
    ///
    /// let module = GroupMeta::new("").with_group(
    ///     GroupMeta::new("vm").with_group(
    ///         GroupMeta::new("vm disk").with_command(CommandMeta::new("vm disk attach")),
    ///     ),
    /// );
    /// assert!(module.find_command(&["vm", "disk", "attach"]).is_some());
    /// assert!(module.find_command(&["vm", "disk", "detach"]).is_none());
    /// ```
    pub fn find_command<S: AsRef<str>>(&self, signature: &[S]) -> Option<&CommandMeta> {
        let words: Vec<&str> = signature.iter().map(AsRef::as_ref).collect();
        let mut group = self;
        for depth in 1..words.len() {
            group = group.sub_groups.get(&words[..depth].join(" "))?;
        }
        group.commands.get(&words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_nargs_forms() {
        let parse = |v: serde_json::Value| serde_json::from_value::<Nargs>(v).unwrap();
        assert_eq!(parse(json!("?")), Nargs::Optional);
        assert_eq!(parse(json!("*")), Nargs::ZeroOrMore);
        assert_eq!(parse(json!("+")), Nargs::OneOrMore);
        assert_eq!(parse(json!(2)), Nargs::Exact(2));
        assert!(serde_json::from_value::<Nargs>(json!("x")).is_err());
    }

    #[test]
    fn test_parameter_json_with_mixed_choices() {
        let param: ParameterMeta = serde_json::from_value(json!({
            "name": "count",
            "options": ["--count"],
            "type": "Int",
            "choices": [1, 2, "3"],
            "default": null,
            "desc": "ignored"
        }))
        .unwrap();
        assert_eq!(param.kind(), ValueKind::Integer);
        assert_eq!(
            param.choices,
            Some(vec!["1".to_string(), "2".to_string(), "3".to_string()])
        );
        assert!(!param.has_default());
    }

    #[test]
    fn test_positional_display_name() {
        let param = ParameterMeta::new("vm_name", &[]);
        assert_eq!(param.display_name(), "<VM_NAME>");
    }

    #[test]
    fn test_value_conversions() {
        assert!(ValueKind::Integer.accepts(" 12 "));
        assert!(ValueKind::Integer.accepts("-3"));
        assert!(ValueKind::Integer.accepts("1_000"));
        assert!(!ValueKind::Integer.accepts("1.5"));
        assert!(!ValueKind::Integer.accepts("abc"));
        assert!(ValueKind::Float.accepts("1.5e3"));
        assert!(ValueKind::Float.accepts("-inf"));
        assert!(!ValueKind::Float.accepts("1.5x"));
        assert!(ValueKind::Boolean.accepts("anything"));
        assert!(ValueKind::JmesPath.accepts("[?name=='vm1'].id"));
        assert!(!ValueKind::JmesPath.accepts("[?name=="));
        assert!(ValueKind::Integer.same_value("03", "3"));
        assert!(ValueKind::Integer.same_value("-0", "0"));
        assert!(!ValueKind::Integer.same_value("-3", "3"));
    }

    #[test]
    fn test_integers_wider_than_64_bits() {
        assert!(ValueKind::Integer.accepts("123456789012345678901234567890"));
        assert!(ValueKind::Integer.accepts("-99999999999999999999"));
        assert!(ValueKind::Integer.accepts("+7"));
        assert!(!ValueKind::Integer.accepts("-"));
        assert!(!ValueKind::Integer.accepts("1_"));
        assert!(ValueKind::Integer.same_value(
            "000123456789012345678901234567890",
            "123456789012345678901234567890"
        ));
    }

    #[test]
    fn test_module_json_lookup_top_level_command() {
        let module: ModuleMeta = serde_json::from_value(json!({
            "name": "profile",
            "commands": {
                "login": { "name": "login", "parameters": [] }
            },
            "sub_groups": {}
        }))
        .unwrap();
        assert_eq!(module.find_command(&["login"]).unwrap().name, "login");
        let empty: [&str; 0] = [];
        assert!(module.find_command(&empty).is_none());
    }
}
