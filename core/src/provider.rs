//! The seam between validation and metadata retrieval.

use std::sync::Arc;

use crate::error::ProviderError;
use crate::meta::ModuleMeta;
use crate::result::CommandSource;
use crate::tree::CommandTree;

/// Supplies command trees and module metadata.
///
/// Implementations may block or do I/O; callers treat every call as
/// potentially slow and fallible. Returned values are shared and read-only.
pub trait MetadataProvider: Send + Sync {
    /// Sources to try, highest priority first.
    fn sources(&self) -> Vec<CommandSource>;

    /// The command tree of `source`.
    fn command_tree(&self, source: CommandSource) -> Result<Arc<CommandTree>, ProviderError>;

    /// Metadata of `module` (or extension) within `source`.
    fn module_meta(&self, source: CommandSource, module: &str)
    -> Result<Arc<ModuleMeta>, ProviderError>;
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for Arc<P> {
    fn sources(&self) -> Vec<CommandSource> {
        (**self).sources()
    }

    fn command_tree(&self, source: CommandSource) -> Result<Arc<CommandTree>, ProviderError> {
        (**self).command_tree(source)
    }

    fn module_meta(
        &self,
        source: CommandSource,
        module: &str,
    ) -> Result<Arc<ModuleMeta>, ProviderError> {
        (**self).module_meta(source, module)
    }
}
