//! Error types for metadata store operations.
//!
//! Covers I/O, JSON and YAML failures, a missing or empty metadata layout, and
//! command trees that do not have the expected shape.

use std::path::{Path, PathBuf};

use cli_validator_core::{CommandSource, ProviderError, StructuralError};
use thiserror::Error;

/// Errors that can occur while loading configuration or metadata.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O failure.
    #[error("I/O error on {}: {origin}", .path.display())]
    IoError {
        path: PathBuf,
        origin: std::io::Error,
    },

    /// JSON parsing failure.
    #[error("JSON error in {}: {origin}", .path.display())]
    JsonError {
        path: PathBuf,
        origin: serde_json::Error,
    },

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A directory the layout requires does not exist.
    #[error("metadata directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// A version list has no entries.
    #[error("version list is empty: {}", .0.display())]
    EmptyVersionList(PathBuf),

    /// Neither core nor extension metadata is present.
    #[error("no metadata sources available under {}", .0.display())]
    NoSourcesAvailable(PathBuf),

    /// A command tree file does not describe a tree.
    #[error(transparent)]
    Corrupted(#[from] StructuralError),
}

impl StoreError {
    pub(crate) fn io(path: &Path, origin: std::io::Error) -> Self {
        Self::IoError {
            path: path.to_path_buf(),
            origin,
        }
    }

    pub(crate) fn json(path: &Path, origin: serde_json::Error) -> Self {
        Self::JsonError {
            path: path.to_path_buf(),
            origin,
        }
    }

    /// Whether the failure is a file that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::IoError { origin, .. } if origin.kind() == std::io::ErrorKind::NotFound)
    }

    /// Converts into the provider-level error reported for `origin`.
    ///
    /// A corrupted tree keeps its structural error; everything else is a
    /// retrieval failure.
    pub fn into_provider_error(self, origin: CommandSource) -> ProviderError {
        match self {
            Self::Corrupted(err) => ProviderError::Corrupted(err),
            other => ProviderError::Unavailable {
                origin,
                reason: other.to_string(),
            },
        }
    }
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
