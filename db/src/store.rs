//! Command metadata loaded lazily from a local directory.
//!
//! The directory mirrors the published metadata layout:
//!
//! ```text
//! <metadata_dir>/version_list.txt                 one version per line, latest last
//! <metadata_dir>/azure-cli-<version>/command_tree.json
//! <metadata_dir>/azure-cli-<version>/az_<module>_meta.json
//! <metadata_dir>/extensions/command_tree.json
//! <metadata_dir>/extensions/ext-<name>/version_list.txt   latest meta file last
//! <metadata_dir>/extensions/ext-<name>/<meta file>
//! ```
//!
//! Nothing but the version list is read when the store is built. Trees and
//! module metadata are read on first use and cached for the life of the
//! store.
//!
//! ```no_run
//! use cli_validator::{ValidateOptions, Validator};
//! use cli_validator_db::MetadataStore;
//!
//! let store = MetadataStore::builder("/var/lib/cli-validator")
//!     .core_version("2.60.0")
//!     .build()
//!     .unwrap();
//! let validator = Validator::new(store);
//! let result = validator.validate_command("az vm list -g rg", ValidateOptions::default());
//! println!("{result}");
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use cli_validator_core::{CommandSource, CommandTree, MetadataProvider, ModuleMeta, ProviderError};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ValidatorConfig;
use crate::error::{Result, StoreError};

const VERSION_LIST: &str = "version_list.txt";
const COMMAND_TREE: &str = "command_tree.json";
const EXTENSION_DIR: &str = "extensions";

/// A [`MetadataProvider`] over a local metadata directory.
///
/// The store is `Send + Sync`; concurrent lookups share one cache.
#[derive(Debug)]
pub struct MetadataStore {
    root: PathBuf,
    core: Option<CoreLayout>,
    extension_dir: Option<PathBuf>,
    trees: RwLock<HashMap<CommandSource, Arc<CommandTree>>>,
    modules: RwLock<HashMap<(CommandSource, String), Arc<ModuleMeta>>>,
}

#[derive(Debug)]
struct CoreLayout {
    version: String,
    dir: PathBuf,
}

impl MetadataStore {
    /// Returns a [`StoreBuilder`] rooted at `metadata_dir`.
    pub fn builder(metadata_dir: impl Into<PathBuf>) -> StoreBuilder {
        StoreBuilder::new(metadata_dir)
    }

    /// Opens `metadata_dir` with the latest core version and extensions.
    ///
    /// # Errors
    ///
    /// See [`StoreBuilder::build`].
    pub fn open(metadata_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(metadata_dir).build()
    }

    /// Opens the store described by `config`.
    ///
    /// # Errors
    ///
    /// See [`StoreBuilder::build`].
    pub fn from_config(config: &ValidatorConfig) -> Result<Self> {
        let mut builder = Self::builder(&config.metadata_dir).extensions(config.extensions);
        if let Some(version) = &config.core_version {
            builder = builder.core_version(version);
        }
        builder.build()
    }

    /// Root of the metadata layout.
    pub fn metadata_dir(&self) -> &Path {
        &self.root
    }

    /// Core metadata version in use, if core metadata is present.
    pub fn core_version(&self) -> Option<&str> {
        self.core.as_ref().map(|core| core.version.as_str())
    }

    fn tree_path(&self, source: CommandSource) -> Option<PathBuf> {
        match source {
            CommandSource::CoreModule => self.core.as_ref().map(|core| core.dir.join(COMMAND_TREE)),
            CommandSource::Extension => self.extension_dir.as_ref().map(|dir| dir.join(COMMAND_TREE)),
            CommandSource::Unknown => None,
        }
    }

    fn module_path(&self, source: CommandSource, module: &str) -> Result<Option<PathBuf>> {
        match source {
            CommandSource::CoreModule => Ok(self
                .core
                .as_ref()
                .map(|core| core.dir.join(format!("az_{module}_meta.json")))),
            CommandSource::Extension => {
                let Some(dir) = &self.extension_dir else {
                    return Ok(None);
                };
                let ext_dir = dir.join(format!("ext-{module}"));
                if !ext_dir.is_dir() {
                    return Ok(None);
                }
                let file = latest_version(&ext_dir.join(VERSION_LIST))?;
                Ok(Some(ext_dir.join(file)))
            }
            CommandSource::Unknown => Ok(None),
        }
    }

    fn load_tree(&self, source: CommandSource) -> Result<Option<CommandTree>> {
        let Some(path) = self.tree_path(source) else {
            return Ok(None);
        };
        debug!(%source, path = %path.display(), "Loading command tree");
        let value: serde_json::Value = read_json(&path)?;
        Ok(Some(CommandTree::from_json(&value, source)?))
    }
}

impl MetadataProvider for MetadataStore {
    fn sources(&self) -> Vec<CommandSource> {
        let mut sources = Vec::with_capacity(2);
        if self.core.is_some() {
            sources.push(CommandSource::CoreModule);
        }
        if self.extension_dir.is_some() {
            sources.push(CommandSource::Extension);
        }
        sources
    }

    fn command_tree(&self, source: CommandSource) -> std::result::Result<Arc<CommandTree>, ProviderError> {
        cached(&self.trees, source, || match self.load_tree(source) {
            Ok(Some(tree)) => Ok(tree),
            Ok(None) => Err(ProviderError::Unavailable {
                origin: source,
                reason: "source is not configured".to_string(),
            }),
            Err(err) => Err(err.into_provider_error(source)),
        })
    }

    fn module_meta(
        &self,
        source: CommandSource,
        module: &str,
    ) -> std::result::Result<Arc<ModuleMeta>, ProviderError> {
        let not_found = || ProviderError::ModuleNotFound {
            origin: source,
            module: module.to_string(),
        };
        cached(&self.modules, (source, module.to_string()), || {
            let path = self
                .module_path(source, module)
                .map_err(|err| err.into_provider_error(source))?
                .ok_or_else(not_found)?;
            debug!(%source, module, path = %path.display(), "Loading module metadata");
            read_json(&path).map_err(|err| {
                if err.is_not_found() {
                    not_found()
                } else {
                    err.into_provider_error(source)
                }
            })
        })
    }
}

/// Cache-aside lookup: readers share the lock, a miss loads outside it and
/// the first writer's value wins.
fn cached<K, V, F>(
    cache: &RwLock<HashMap<K, Arc<V>>>,
    key: K,
    load: F,
) -> std::result::Result<Arc<V>, ProviderError>
where
    K: Eq + Hash,
    F: FnOnce() -> std::result::Result<V, ProviderError>,
{
    if let Some(hit) = cache.read().unwrap_or_else(PoisonError::into_inner).get(&key) {
        return Ok(Arc::clone(hit));
    }
    let value = Arc::new(load()?);
    let mut cache = cache.write().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(cache.entry(key).or_insert(value)))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = std::fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| StoreError::json(path, e))
}

/// Last non-empty line of a version list.
fn latest_version(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(str::to_string)
        .ok_or_else(|| StoreError::EmptyVersionList(path.to_path_buf()))
}

/// Directory holding the core metadata of `version`.
///
/// Release numbers such as `2.60.0` live under `azure-cli-2.60.0`; anything
/// else is taken as a directory name.
fn core_version_dir(version: &str) -> String {
    let mut parts = version.splitn(3, '.');
    let is_release = (0..3).all(|idx| {
        parts.next().is_some_and(|part| {
            let digits = if idx == 2 {
                part.split(|c: char| !c.is_ascii_digit()).next().unwrap_or_default()
            } else {
                part
            };
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        })
    });
    if is_release {
        format!("azure-cli-{version}")
    } else {
        version.to_string()
    }
}

/// Builder for a [`MetadataStore`].
///
/// # Example
///
/// ```no_run
/// use cli_validator_db::MetadataStore;
///
/// let store = MetadataStore::builder("/var/lib/cli-validator")
///     .extensions(false)
///     .build()
///     .unwrap();
/// assert!(store.core_version().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct StoreBuilder {
    root: PathBuf,
    core_version: Option<String>,
    extensions: bool,
}

impl StoreBuilder {
    /// Creates a builder with the latest core version and extensions on.
    pub fn new(metadata_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: metadata_dir.into(),
            core_version: None,
            extensions: true,
        }
    }

    /// Pins the core metadata version.
    pub fn core_version(mut self, version: impl Into<String>) -> Self {
        self.core_version = Some(version.into());
        self
    }

    /// Enables or disables extension metadata.
    pub fn extensions(mut self, enabled: bool) -> Self {
        self.extensions = enabled;
        self
    }

    /// Resolves the layout and returns the store.
    ///
    /// Core metadata is used when a version is pinned or the root has a
    /// version list; extension metadata when enabled and its tree exists.
    ///
    /// # Errors
    ///
    /// - [`StoreError::MissingDirectory`] if the root or the pinned version's
    ///   directory does not exist,
    /// - [`StoreError::EmptyVersionList`] if the version list has no entries,
    /// - [`StoreError::NoSourcesAvailable`] if neither source is present.
    pub fn build(self) -> Result<MetadataStore> {
        if !self.root.is_dir() {
            return Err(StoreError::MissingDirectory(self.root));
        }

        let version = match self.core_version {
            Some(version) => Some(version),
            None => {
                let list = self.root.join(VERSION_LIST);
                if list.is_file() {
                    Some(latest_version(&list)?)
                } else {
                    debug!(path = %list.display(), "No core version list");
                    None
                }
            }
        };
        let core = match version {
            Some(version) => {
                let dir = self.root.join(core_version_dir(&version));
                if !dir.is_dir() {
                    return Err(StoreError::MissingDirectory(dir));
                }
                Some(CoreLayout { version, dir })
            }
            None => None,
        };

        let extension_dir = Some(self.root.join(EXTENSION_DIR))
            .filter(|dir| self.extensions && dir.join(COMMAND_TREE).is_file());

        if core.is_none() && extension_dir.is_none() {
            return Err(StoreError::NoSourcesAvailable(self.root));
        }
        debug!(
            root = %self.root.display(),
            core_version = ?core.as_ref().map(|c| &c.version),
            extensions = extension_dir.is_some(),
            "Opened metadata store"
        );

        Ok(MetadataStore {
            root: self.root,
            core,
            extension_dir,
            trees: RwLock::default(),
            modules: RwLock::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_version_dir() {
        assert_eq!(core_version_dir("2.60.0"), "azure-cli-2.60.0");
        assert_eq!(core_version_dir("2.61.0b1"), "azure-cli-2.61.0b1");
        assert_eq!(core_version_dir("nightly"), "nightly");
        assert_eq!(core_version_dir("2.60"), "2.60");
    }

    #[test]
    fn test_latest_version_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(VERSION_LIST);
        std::fs::write(&path, "2.59.0\n2.60.0\n\n").unwrap();
        assert_eq!(latest_version(&path).unwrap(), "2.60.0");

        std::fs::write(&path, "\n").unwrap();
        assert!(matches!(
            latest_version(&path),
            Err(StoreError::EmptyVersionList(_))
        ));
    }

    #[test]
    fn test_store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MetadataStore>();
    }
}
