//! Placeholder values.
//!
//! Documentation examples routinely use stand-ins instead of real values:
//! `$rg`, `${RESOURCE_GROUP}`, `$(az group show ...)`, `<RESOURCE_GROUP>`,
//! `<<name>>`. A value shaped like one of these is accepted for any parameter
//! regardless of type or choices.

use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"\$[A-Za-z_][A-Za-z0-9_]*",
        r"|\$\{[A-Za-z0-9_ \-.\[\]]*\}.*",
        r"|\$\([A-Za-z0-9_ \-.\[\]]*.*",
        r"|<<[A-Za-z0-9_ \-]+>>",
        r"|<[A-Za-z0-9_ \-.|]+>",
        r")$"
    ))
    .expect("static regex must compile")
});

/// Unquoted placeholders that follow a space in a raw command line. Used to
/// quote them before splitting so a placeholder with spaces stays one word.
static INLINE_PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r" (",
        r"\$\([a-zA-Z0-9_ \-.\[\]]*\)",
        r"|\$\{[a-zA-Z0-9_ \-.\[\]]*\}",
        r"|<<[a-zA-Z0-9_ \-]*>>",
        r"|<[a-zA-Z0-9_ ]*>",
        r")"
    ))
    .expect("static regex must compile")
});

/// Key-only placeholders such as `<VM_NAME>` standing for a positional.
static KEY_PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<[a-zA-Z\-_.|]+>").expect("static regex must compile"));

/// Whether `value` is a placeholder rather than a literal.
///
/// # Examples
///
/// ```
/// use cli_validator_core::is_placeholder;
///
/// assert!(is_placeholder("$rg"));
/// assert!(is_placeholder("${RG_NAME}"));
/// assert!(is_placeholder("$(az group show -n x --query id -o tsv)"));
/// assert!(is_placeholder("<RESOURCE_GROUP>"));
/// assert!(is_placeholder("<<resource group>>"));
/// assert!(!is_placeholder("eastus"));
/// assert!(!is_placeholder("$rg-suffix"));
/// ```
pub fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_RE.is_match(value)
}

/// Wraps unquoted placeholders that follow a space in double quotes.
///
/// # Examples
///
/// ```
/// use cli_validator_core::quote_placeholders;
///
/// assert_eq!(
///     quote_placeholders("az vm show -g <resource group> -n $(echo vm)"),
///     r#"az vm show -g "<resource group>" -n "$(echo vm)""#,
/// );
/// ```
pub fn quote_placeholders(command: &str) -> String {
    INLINE_PLACEHOLDER_RE
        .replace_all(command, " \"$1\"")
        .into_owned()
}

/// Whether a parameter key is a `<NAME>` placeholder for a positional.
pub(crate) fn is_key_placeholder(key: &str) -> bool {
    KEY_PLACEHOLDER_RE.is_match(key)
}
