//! In-memory store for testing.

use crate::connection::Connection;
use crate::error::{StoreError, StoreResult};
use crate::row::{row_id, Row, PRIMARY_KEY};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// Rows of one table plus the next primary key to hand out.
///
/// `next_id` is `None` once the id space is used up.
#[derive(Debug, Clone)]
pub(crate) struct TableData {
    rows: Vec<Row>,
    next_id: Option<i64>,
}

impl Default for TableData {
    fn default() -> Self {
        Self::from_rows(Vec::new())
    }
}

impl TableData {
    /// Builds table data from stored rows, continuing after the highest id.
    pub(crate) fn from_rows(rows: Vec<Row>) -> Self {
        let next_id = rows.iter().filter_map(row_id).max().unwrap_or(0).checked_add(1);
        Self { rows, next_id }
    }

    pub(crate) fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Merges every patch into its row. Nothing is applied unless every
    /// patch resolves.
    pub(crate) fn apply_update(&mut self, table: &str, patches: &[Row]) -> StoreResult<()> {
        let mut targets = Vec::with_capacity(patches.len());
        for patch in patches {
            let id = row_id(patch)
                .ok_or_else(|| StoreError::rejected(table, "patch without primary key"))?;
            let idx = self
                .rows
                .iter()
                .position(|row| row_id(row) == Some(id))
                .ok_or_else(|| StoreError::RowNotFound {
                    table: table.to_string(),
                    id,
                })?;
            targets.push(idx);
        }

        for (idx, patch) in targets.into_iter().zip(patches) {
            let row = &mut self.rows[idx];
            for (column, value) in patch {
                if column != PRIMARY_KEY {
                    row.insert(column.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    /// Appends rows, assigning ids to rows without one.
    ///
    /// The batch is all-or-nothing: an id already stored, an id repeated
    /// within the batch, or running out of ids rejects every row.
    pub(crate) fn apply_create(&mut self, table: &str, rows: &[Row]) -> StoreResult<Vec<i64>> {
        let mut taken: HashSet<i64> = self.rows.iter().filter_map(row_id).collect();
        let mut next_id = self.next_id;
        let mut ids = Vec::with_capacity(rows.len());

        for row in rows {
            let id = match row_id(row) {
                Some(id) => id,
                None => next_id
                    .ok_or_else(|| StoreError::rejected(table, "primary keys exhausted"))?,
            };
            if !taken.insert(id) {
                return Err(StoreError::rejected(
                    table,
                    format!("duplicate primary key {id}"),
                ));
            }
            next_id = next_id.zip(id.checked_add(1)).map(|(next, after)| next.max(after));
            ids.push(id);
        }

        for (row, &id) in rows.iter().zip(&ids) {
            let mut row = row.clone();
            row.insert(PRIMARY_KEY.into(), id.into());
            self.rows.push(row);
        }
        self.next_id = next_id;
        Ok(ids)
    }
}

/// An in-memory row store.
///
/// This store keeps every table in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Hosts that seed the catalog at startup and never persist it
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use termbase_store::{Connection, InMemoryStore, Row};
///
/// let store = InMemoryStore::new();
/// let ids = store.batch_create("biz_dict", &[Row::new(), Row::new()]).unwrap();
/// assert_eq!(ids, vec![1, 2]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, TableData>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with one pre-populated table.
    ///
    /// Useful for seeding a catalog in tests.
    #[must_use]
    pub fn with_rows(table: &str, rows: Vec<Row>) -> Self {
        let store = Self::new();
        store
            .tables
            .write()
            .insert(table.to_string(), TableData::from_rows(rows));
        store
    }

    /// Returns the number of rows in a table.
    #[must_use]
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |t| t.rows().len())
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// Removes all tables.
    pub fn clear(&self) {
        self.tables.write().clear();
    }
}

impl Connection for InMemoryStore {
    fn find_all(&self, table: &str) -> StoreResult<Vec<Row>> {
        Ok(self
            .tables
            .read()
            .get(table)
            .map(|t| t.rows().to_vec())
            .unwrap_or_default())
    }

    fn batch_update(&self, table: &str, patches: &[Row]) -> StoreResult<()> {
        let mut tables = self.tables.write();
        tables
            .entry(table.to_string())
            .or_default()
            .apply_update(table, patches)
    }

    fn batch_create(&self, table: &str, rows: &[Row]) -> StoreResult<Vec<i64>> {
        let mut tables = self.tables.write();
        tables
            .entry(table.to_string())
            .or_default()
            .apply_create(table, rows)
    }
}
