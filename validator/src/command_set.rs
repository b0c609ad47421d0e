//! Batch validation of command-set entries.
//!
//! A command set is a JSON list describing commands by signature and option
//! names, optionally with a full example invocation:
//!
//! ```json
//! [{ "command": "az vm create", "arguments": ["--name", "--image"], "example": "az vm create -n v --image ubuntu" }]
//! ```

use cli_validator_core::{MetadataProvider, ValidationResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::orchestrator::{ValidateOptions, Validator};

/// One input entry of a command set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSetItem {
    /// Command signature, e.g. `az vm create`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Option names used with the signature.
    #[serde(default)]
    pub arguments: Vec<String>,
    /// A complete example invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// An entry together with its verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSetResultItem {
    #[serde(flatten)]
    pub item: CommandSetItem,
    /// Signature and keys check; absent without a signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ValidationResult>,
    /// Example check; absent without an example.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_result: Option<ValidationResult>,
}

impl CommandSetResultItem {
    fn failed(&self) -> bool {
        self.result.as_ref().is_some_and(|r| !r.is_valid)
    }

    fn example_failed(&self) -> bool {
        self.example_result.as_ref().is_some_and(|r| !r.is_valid)
    }
}

/// Verdicts for a whole command set, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSetReport {
    pub items: Vec<CommandSetResultItem>,
    /// Indices into `items` whose signature check failed.
    pub errors: Vec<usize>,
    /// Indices into `items` whose example failed.
    pub example_errors: Vec<usize>,
}

impl CommandSetReport {
    /// Appends an item, recording it under `errors`/`example_errors` as needed.
    pub fn push(&mut self, item: CommandSetResultItem) {
        let idx = self.items.len();
        if item.failed() {
            self.errors.push(idx);
        }
        if item.example_failed() {
            self.example_errors.push(idx);
        }
        self.items.push(item);
    }

    /// Whether no item failed either check.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.example_errors.is_empty()
    }

    /// Items whose signature check failed.
    pub fn errors(&self) -> impl Iterator<Item = &CommandSetResultItem> {
        self.errors.iter().map(|&idx| &self.items[idx])
    }

    /// Items whose example failed.
    pub fn example_errors(&self) -> impl Iterator<Item = &CommandSetResultItem> {
        self.example_errors.iter().map(|&idx| &self.items[idx])
    }
}

impl<P: MetadataProvider> Validator<P> {
    /// Validates every entry of a command set.
    ///
    /// Entries are checked in parallel; the report keeps input order.
    pub fn validate_command_set(
        &self,
        items: &[CommandSetItem],
        options: ValidateOptions,
    ) -> CommandSetReport {
        let checked: Vec<CommandSetResultItem> = items
            .par_iter()
            .map(|item| self.check_item(item, options))
            .collect();

        let mut report = CommandSetReport::default();
        for item in checked {
            report.push(item);
        }
        report
    }

    fn check_item(&self, item: &CommandSetItem, options: ValidateOptions) -> CommandSetResultItem {
        CommandSetResultItem {
            item: item.clone(),
            result: item
                .command
                .as_deref()
                .map(|signature| self.validate_signature_and_keys(signature, &item.arguments, options)),
            example_result: item
                .example
                .as_deref()
                .map(|example| self.validate_command(example, options)),
        }
    }
}

#[cfg(test)]
mod tests {
    use cli_validator_core::{CommandMeta, CommandSource, CommandTree, GroupMeta, ParameterMeta};
    use serde_json::json;

    use super::*;
    use crate::StaticProvider;

    fn validator() -> Validator<StaticProvider> {
        let tree = CommandTree::from_json(&json!({ "vm": { "list": "vm" } }), CommandSource::CoreModule)
            .unwrap();
        let vm = GroupMeta::new("vm").with_group(GroupMeta::new("vm").with_command(
            CommandMeta::new("vm list")
                .with_param(ParameterMeta::new("resource_group_name", &["--resource-group", "-g"])),
        ));
        Validator::new(
            StaticProvider::new()
                .with_tree(tree)
                .with_module(CommandSource::CoreModule, "vm", vm),
        )
    }

    #[test]
    fn test_report_indexes_failures_in_input_order() {
        let items: Vec<CommandSetItem> = serde_json::from_value(json!([
            { "command": "az vm list", "arguments": ["-g"], "example": "az vm list -g rg" },
            { "command": "az vm list", "arguments": ["--bogus"] },
            { "example": "az vm lsit" },
            { "command": "az vm list", "arguments": [], "example": "az vm list --bogus x" }
        ]))
        .unwrap();

        let report = validator().validate_command_set(&items, ValidateOptions::default());
        assert_eq!(report.items.len(), 4);
        assert_eq!(report.errors, [1]);
        assert_eq!(report.example_errors, [2, 3]);
        assert!(!report.is_valid());
        assert!(report.items[2].result.is_none());
        assert!(report.items[1].example_result.is_none());
        assert_eq!(
            report.errors().next().and_then(|i| i.result.as_ref()?.error_message.clone()),
            Some("unrecognized arguments: --bogus".to_string())
        );
    }

    #[test]
    fn test_result_item_serializes_flat() {
        let report = validator().validate_command_set(
            &[CommandSetItem {
                command: Some("az vm list".into()),
                arguments: vec!["-g".into()],
                example: None,
            }],
            ValidateOptions::default(),
        );
        let value = serde_json::to_value(&report.items[0]).unwrap();
        assert_eq!(value["command"], "az vm list");
        assert_eq!(value["arguments"], json!(["-g"]));
        assert_eq!(value["result"]["is_valid"], true);
        assert!(value.get("example_result").is_none());
    }
}
