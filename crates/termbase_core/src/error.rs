//! Error types for Termbase core.

use std::io;
use std::path::PathBuf;
use termbase_store::StoreError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Broad class of a [`CoreError`], deciding how much of a pass survives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration or source registration. Nothing was mutated.
    Configuration,
    /// A source (or its backup) failed to load. The pass was discarded.
    Load,
    /// A batched write to the store failed. Published snapshots are kept.
    Persistence,
}

/// Errors that can occur in Termbase core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two sources were registered under the same name.
    #[error("duplicate source '{name}'")]
    DuplicateSource {
        /// The repeated source name.
        name: String,
    },

    /// Configuration references a source with no registered implementation.
    #[error("configured source '{name}' has no implementation")]
    UnknownSource {
        /// The configured source name.
        name: String,
    },

    /// The action mask is empty or carries unknown bits.
    #[error("invalid dictionary action {bits}")]
    InvalidAction {
        /// The raw action value.
        bits: u8,
    },

    /// No store connection is registered under the name.
    #[error("store '{name}' not registered")]
    StoreNotFound {
        /// The store name.
        name: String,
    },

    /// Any other configuration problem.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// A source failed to load.
    #[error("source '{source_name}' failed to load: {message}")]
    Load {
        /// Name of the failing source.
        source_name: String,
        /// Description of the failure.
        message: String,
    },

    /// Writing or reading a backup file failed.
    #[error("backup file {path:?}: {source}")]
    Backup {
        /// Full path of the backup file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A backup file could not be encoded or decoded.
    #[error("backup codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// A batched write to the store failed.
    #[error("store '{store}' rejected batch: {source}")]
    Persistence {
        /// The target store name.
        store: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// The store answered a create batch with the wrong number of ids.
    #[error("store returned {actual} ids for {expected} created rows")]
    IdCount {
        /// Rows in the create batch.
        expected: usize,
        /// Ids the store returned.
        actual: usize,
    },
}

impl CoreError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a load error for a source.
    pub fn load(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::Load {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Creates a persistence error for a store.
    pub fn persistence(store: impl Into<String>, source: StoreError) -> Self {
        Self::Persistence {
            store: store.into(),
            source,
        }
    }

    /// Creates a store-not-found error.
    pub fn store_not_found(name: impl Into<String>) -> Self {
        Self::StoreNotFound { name: name.into() }
    }

    /// Returns the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::DuplicateSource { .. }
            | CoreError::UnknownSource { .. }
            | CoreError::InvalidAction { .. }
            | CoreError::StoreNotFound { .. }
            | CoreError::Configuration { .. } => ErrorKind::Configuration,
            CoreError::Load { .. } | CoreError::Backup { .. } | CoreError::Json(_) => {
                ErrorKind::Load
            }
            CoreError::Persistence { .. } | CoreError::IdCount { .. } => ErrorKind::Persistence,
        }
    }
}
