//! In-memory metadata provider.

use std::collections::HashMap;
use std::sync::Arc;

use cli_validator_core::{CommandSource, CommandTree, MetadataProvider, ModuleMeta, ProviderError};

/// A provider over trees and modules that are already in memory.
///
/// Sources are offered in the order their trees were added.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    trees: Vec<Arc<CommandTree>>,
    modules: HashMap<(CommandSource, String), Arc<ModuleMeta>>,
}

impl StaticProvider {
    /// Creates a provider with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command tree. A later tree for the same source replaces the
    /// earlier one but keeps its position.
    pub fn with_tree(mut self, tree: CommandTree) -> Self {
        let tree = Arc::new(tree);
        match self.trees.iter_mut().find(|t| t.source() == tree.source()) {
            Some(slot) => *slot = tree,
            None => self.trees.push(tree),
        }
        self
    }

    /// Adds the metadata of `module` within `source`.
    pub fn with_module(mut self, source: CommandSource, module: &str, meta: ModuleMeta) -> Self {
        self.modules
            .insert((source, module.to_string()), Arc::new(meta));
        self
    }
}

impl MetadataProvider for StaticProvider {
    fn sources(&self) -> Vec<CommandSource> {
        self.trees.iter().map(|tree| tree.source()).collect()
    }

    fn command_tree(&self, source: CommandSource) -> Result<Arc<CommandTree>, ProviderError> {
        self.trees
            .iter()
            .find(|tree| tree.source() == source)
            .cloned()
            .ok_or_else(|| ProviderError::Unavailable {
                origin: source,
                reason: "no command tree loaded".to_string(),
            })
    }

    fn module_meta(
        &self,
        source: CommandSource,
        module: &str,
    ) -> Result<Arc<ModuleMeta>, ProviderError> {
        self.modules
            .get(&(source, module.to_string()))
            .cloned()
            .ok_or_else(|| ProviderError::ModuleNotFound {
                origin: source,
                module: module.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_sources_follow_insertion_order() {
        let provider = StaticProvider::new()
            .with_tree(CommandTree::new(BTreeMap::new(), CommandSource::CoreModule))
            .with_tree(CommandTree::new(BTreeMap::new(), CommandSource::Extension))
            .with_tree(CommandTree::new(BTreeMap::new(), CommandSource::CoreModule));
        assert_eq!(
            provider.sources(),
            vec![CommandSource::CoreModule, CommandSource::Extension]
        );
    }

    #[test]
    fn test_missing_entries_are_provider_errors() {
        let provider = StaticProvider::new();
        assert!(matches!(
            provider.command_tree(CommandSource::Extension),
            Err(ProviderError::Unavailable { .. })
        ));
        assert_eq!(
            provider.module_meta(CommandSource::CoreModule, "vm").unwrap_err(),
            ProviderError::ModuleNotFound {
                origin: CommandSource::CoreModule,
                module: "vm".into(),
            }
        );
    }
}
