//! Store connection trait definition.

use crate::error::StoreResult;
use crate::row::Row;

/// A handle to one system-of-record store.
///
/// Connections are **row stores**. They know tables, rows and the `id`
/// primary key, nothing about dictionaries, categories or statuses. The
/// engine owns all interpretation of row contents.
///
/// # Invariants
///
/// - `find_all` returns rows in a stable order (insertion order)
/// - `batch_update` only touches the columns present in each patch
/// - `batch_create` assigns an `id` to every row that lacks a positive one
/// - Connections must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - For JSON-file backed catalogs
pub trait Connection: Send + Sync {
    /// Returns every row of `table`.
    ///
    /// A table that was never written to is empty, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn find_all(&self, table: &str) -> StoreResult<Vec<Row>>;

    /// Applies partial rows to existing rows, matched by primary key.
    ///
    /// Each patch must carry a positive `id`. Columns absent from a patch
    /// keep their stored value. The batch is all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A patch has no primary key
    /// - A patch references a row that does not exist
    /// - An I/O error occurs
    fn batch_update(&self, table: &str, patches: &[Row]) -> StoreResult<()>;

    /// Inserts new rows.
    ///
    /// Returns the primary keys of the inserted rows, in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if a row reuses an existing primary key or an I/O
    /// error occurs.
    fn batch_create(&self, table: &str, rows: &[Row]) -> StoreResult<Vec<i64>>;
}
