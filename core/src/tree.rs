//! Command tree resolution.
//!
//! A command tree is a trie from command words to either a nested group or
//! the name of the module that owns the command. Resolution walks the trie
//! word by word and splits the input into the command signature and the
//! leftover parameter words.
//!
//! Tree JSON uses plain strings for leaves and objects for groups:
//!
//! ```json
//! { "vm": { "create": "vm", "disk": { "attach": "vm" } }, "login": "profile" }
//! ```
//!
//! [`CommandTree::from_json`] turns that shape into the tagged [`CommandNode`]
//! once, at ingestion, so a malformed leaf surfaces there as
//! [`StructuralError::CommandTreeCorrupted`] rather than during every lookup.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{ResolutionError, StructuralError, ValidateError};
use crate::lexer::join;
use crate::result::CommandSource;

/// The first word of every command.
pub const ROOT_COMMAND: &str = "az";

const HELP_FLAGS: [&str; 2] = ["-h", "--help"];

/// A node of the command trie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandNode {
    /// Leaf naming the owning module (or extension).
    Module(String),
    /// Nested command group.
    Group(BTreeMap<String, CommandNode>),
}

impl CommandNode {
    /// Builds a node from tree JSON, labelling corruption with `label`.
    fn from_value(value: &serde_json::Value, label: &str) -> Result<Self, StructuralError> {
        match value {
            serde_json::Value::String(module) => Ok(Self::Module(module.clone())),
            serde_json::Value::Object(children) => children
                .iter()
                .map(|(word, child)| Ok((word.clone(), Self::from_value(child, label)?)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Self::Group),
            _ => Err(StructuralError::CommandTreeCorrupted(label.to_string())),
        }
    }
}

/// A command tree together with the source it came from.
///
/// # Examples
///
/// ```
/// use cli_validator_core::{CommandSource, CommandTree};
/// use serde_json::json;
///
/// let tree = CommandTree::from_json(
///     &json!({ "vm": { "create": "vm", "list": "vm" } }),
///     CommandSource::CoreModule,
/// )
/// .unwrap();
///
/// let info = tree.resolve(&["az", "vm", "create", "-n", "x"]).unwrap();
/// assert_eq!(info.module.as_deref(), Some("vm"));
/// assert_eq!(info.signature, ["vm", "create"]);
/// assert_eq!(info.parameters, ["-n", "x"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandTree {
    root: BTreeMap<String, CommandNode>,
    source: CommandSource,
}

impl CommandTree {
    /// Wraps an already-built root group.
    pub fn new(root: BTreeMap<String, CommandNode>, source: CommandSource) -> Self {
        Self { root, source }
    }

    /// Converts tree JSON into a typed tree.
    ///
    /// # Errors
    ///
    /// [`StructuralError::CommandTreeCorrupted`] when the root is not an object
    /// or any node is neither a string nor an object.
    pub fn from_json(value: &serde_json::Value, source: CommandSource) -> Result<Self, StructuralError> {
        match CommandNode::from_value(value, source.label())? {
            CommandNode::Group(root) => Ok(Self { root, source }),
            CommandNode::Module(_) => Err(StructuralError::CommandTreeCorrupted(
                source.label().to_string(),
            )),
        }
    }

    /// Source the tree belongs to.
    pub fn source(&self) -> CommandSource {
        self.source
    }

    /// Top-level command words.
    pub fn root(&self) -> &BTreeMap<String, CommandNode> {
        &self.root
    }

    /// Resolves a full command line (root word included).
    ///
    /// # Errors
    ///
    /// - [`StructuralError::EmptyCommand`] for no words,
    /// - [`StructuralError::NotRootCommand`] when the first word is not `az`,
    /// - [`ResolutionError::UnknownCommand`] when a word has no matching child,
    /// - [`ResolutionError::MissingSubCommand`] when the words stop on a group.
    pub fn resolve<S: AsRef<str>>(&self, words: &[S]) -> Result<CommandInfo, ValidateError> {
        resolve(&self.root, words)
    }
}

/// Outcome of resolving a command line against a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandInfo {
    /// Owning module; `None` marks a help request.
    pub module: Option<String>,
    /// Matched command words, root word excluded.
    pub signature: Vec<String>,
    /// Remaining words after the signature.
    pub parameters: Vec<String>,
}

impl CommandInfo {
    /// Whether this resolution is a help request.
    pub fn is_help(&self) -> bool {
        self.module.is_none()
    }
}

/// Resolves `words` against the root group of a tree.
///
/// Descent never back-tracks: each word either names a child of the current
/// group or ends resolution.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use cli_validator_core::{CommandNode, resolve};
///
/// let mut vm = BTreeMap::new();
/// vm.insert("list".to_string(), CommandNode::Module("vm".into()));
/// let mut root = BTreeMap::new();
/// root.insert("vm".to_string(), CommandNode::Group(vm));
///
/// // Group-level help.
/// let info = resolve(&root, &["az", "vm", "--help"]).unwrap();
/// assert!(info.is_help());
/// assert_eq!(info.signature, ["vm"]);
///
/// // A group path that never reaches a command.
/// assert!(resolve(&root, &["az", "vm"]).is_err());
/// ```
pub fn resolve<S: AsRef<str>>(
    root: &BTreeMap<String, CommandNode>,
    words: &[S],
) -> Result<CommandInfo, ValidateError> {
    let words: Vec<&str> = words.iter().map(AsRef::as_ref).collect();
    let Some((first, rest)) = words.split_first() else {
        return Err(StructuralError::EmptyCommand.into());
    };
    if *first != ROOT_COMMAND {
        return Err(StructuralError::NotRootCommand.into());
    }
    if rest == ["help"] {
        return Ok(CommandInfo {
            module: None,
            signature: vec!["help".to_string()],
            parameters: Vec::new(),
        });
    }

    let mut signature = Vec::new();
    let mut group = root;
    for (idx, word) in rest.iter().enumerate() {
        match group.get(*word) {
            Some(CommandNode::Module(module)) => {
                signature.push(word.to_string());
                return Ok(CommandInfo {
                    module: Some(module.clone()),
                    signature,
                    parameters: owned(&rest[idx + 1..]),
                });
            }
            Some(CommandNode::Group(children)) => {
                signature.push(word.to_string());
                group = children;
            }
            None if idx + 1 == rest.len() && HELP_FLAGS.contains(word) => {
                return Ok(CommandInfo {
                    module: None,
                    signature,
                    parameters: vec![word.to_string()],
                });
            }
            None => return Err(ResolutionError::UnknownCommand(join(&words)).into()),
        }
    }

    Err(ResolutionError::MissingSubCommand(join(&words)).into())
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tree() -> CommandTree {
        CommandTree::from_json(
            &json!({
                "vm": {
                    "create": "vm",
                    "disk": { "attach": "vm" }
                },
                "network": {
                    "vnet": {
                        "subnet": { "create": "network" }
                    }
                },
                "login": "profile"
            }),
            CommandSource::CoreModule,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_leaf_and_parameters() {
        let info = tree()
            .resolve(&["az", "vm", "disk", "attach", "--vm-name", "v"])
            .unwrap();
        assert_eq!(info.module.as_deref(), Some("vm"));
        assert_eq!(info.signature, ["vm", "disk", "attach"]);
        assert_eq!(info.parameters, ["--vm-name", "v"]);
    }

    #[test]
    fn test_resolve_top_level_command() {
        let info = tree().resolve(&["az", "login"]).unwrap();
        assert_eq!(info.module.as_deref(), Some("profile"));
        assert!(info.parameters.is_empty());
    }

    #[test]
    fn test_structural_failures() {
        let empty: [&str; 0] = [];
        assert_eq!(
            tree().resolve(&empty),
            Err(StructuralError::EmptyCommand.into())
        );
        assert_eq!(
            tree().resolve(&["kubectl", "get"]),
            Err(StructuralError::NotRootCommand.into())
        );
    }

    #[test]
    fn test_bare_help() {
        let info = tree().resolve(&["az", "help"]).unwrap();
        assert!(info.is_help());
        assert_eq!(info.signature, ["help"]);
        assert!(info.parameters.is_empty());
    }

    #[test]
    fn test_group_help_only_as_last_word() {
        let info = tree().resolve(&["az", "network", "vnet", "-h"]).unwrap();
        assert!(info.is_help());
        assert_eq!(info.signature, ["network", "vnet"]);
        assert_eq!(info.parameters, ["-h"]);

        assert_eq!(
            tree().resolve(&["az", "network", "--help", "vnet"]),
            Err(ResolutionError::UnknownCommand("az network --help vnet".into()).into())
        );
    }

    #[test]
    fn test_unknown_and_missing_sub_command() {
        assert_eq!(
            tree().resolve(&["az", "vm", "explode", "--now"]),
            Err(ResolutionError::UnknownCommand("az vm explode --now".into()).into())
        );
        assert_eq!(
            tree().resolve(&["az", "network", "vnet"]),
            Err(ResolutionError::MissingSubCommand("az network vnet".into()).into())
        );
        assert_eq!(
            tree().resolve(&["az"]),
            Err(ResolutionError::MissingSubCommand("az".into()).into())
        );
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let tree = tree();
        let words = ["az", "vm", "create", "--name", "x"];
        assert_eq!(tree.resolve(&words), tree.resolve(&words));
    }

    #[test]
    fn test_corrupted_tree_is_rejected_at_ingestion() {
        let err = CommandTree::from_json(
            &json!({ "vm": { "create": 42 } }),
            CommandSource::Extension,
        )
        .unwrap_err();
        assert_eq!(err, StructuralError::CommandTreeCorrupted("Extension".into()));
        assert!(err.to_string().starts_with("The Extension CommandTree is Corrupted."));

        assert!(CommandTree::from_json(&json!("vm"), CommandSource::CoreModule).is_err());
    }
}
