//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A row could not be encoded or decoded.
    #[error("row codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// No connection is registered under the given name.
    #[error("store '{name}' not found")]
    NotFound {
        /// The requested store name.
        name: String,
    },

    /// A patch referenced a row that does not exist.
    #[error("row {id} not found in table '{table}'")]
    RowNotFound {
        /// Table name.
        table: String,
        /// Primary key of the missing row.
        id: i64,
    },

    /// A row was rejected by the store.
    #[error("row rejected by table '{table}': {reason}")]
    Rejected {
        /// Table name.
        table: String,
        /// Why the row was rejected.
        reason: String,
    },
}

impl StoreError {
    /// Creates a not-found error for a store name.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates a rejected-row error.
    pub fn rejected(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            table: table.into(),
            reason: reason.into(),
        }
    }
}
