//! Source contract and the built-in sources.

use crate::backup;
use crate::entry::Entry;
use crate::error::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;
use termbase_store::{from_row, Connection, StoreRegistry};

/// Opaque per-source parameters from configuration.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Anything that can load and expose dictionary entries.
///
/// Remote feeds and hand-maintained files implement this directly; catalog
/// tables go through [`TableSource`].
pub trait Source: Send {
    /// Unique name, matched against the configured source names.
    fn name(&self) -> &str;

    /// Entries from the last successful load.
    fn values(&self) -> &[Entry];

    /// Loads entries.
    ///
    /// `store_name` is the configured store for this source; sources that
    /// do not read a store may ignore it.
    ///
    /// # Errors
    ///
    /// Any error aborts the reconciliation pass. A failed load should leave
    /// the previous values in place.
    fn load(&mut self, store_name: &str, params: &Params) -> CoreResult<()>;
}

/// A persisted row type that expands into dictionary entries.
pub trait Table: DeserializeOwned + Send + 'static {
    /// Table the rows live in.
    const TABLE: &'static str;

    /// Expands one row into one or more logical entries.
    fn explode(self) -> Vec<Entry>;
}

/// Source backed by every row of one table.
///
/// The row type is fixed at compile time:
///
/// ```rust,ignore
/// let catalog: TableSource<DictRecord> = TableSource::new("biz", stores);
/// ```
pub struct TableSource<T: Table> {
    name: String,
    stores: Arc<StoreRegistry>,
    values: Vec<Entry>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Table> TableSource<T> {
    /// Creates a source that reads through `stores`.
    pub fn new(name: impl Into<String>, stores: Arc<StoreRegistry>) -> Self {
        Self {
            name: name.into(),
            stores,
            values: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Moves the loaded entries out, leaving the source empty.
    pub fn take_values(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.values)
    }
}

impl<T: Table> Source for TableSource<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn values(&self) -> &[Entry] {
        &self.values
    }

    fn load(&mut self, store_name: &str, _params: &Params) -> CoreResult<()> {
        let conn = self
            .stores
            .get(store_name)
            .ok_or_else(|| CoreError::store_not_found(store_name))?;
        let rows = conn
            .find_all(T::TABLE)
            .map_err(|e| CoreError::load(&self.name, e))?;

        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            let record: T = from_row(row).map_err(|e| CoreError::load(&self.name, e))?;
            values.extend(record.explode());
        }

        tracing::debug!(
            source = %self.name,
            table = T::TABLE,
            entries = values.len(),
            "loaded table source"
        );
        self.values = values;
        Ok(())
    }
}

/// Source that replays a JSON array of entries from disk.
///
/// The file is `params["path"]` when configured, otherwise the default
/// path given at construction (usually the source's backup file).
pub struct JsonFileSource {
    name: String,
    default_path: PathBuf,
    values: Vec<Entry>,
}

impl JsonFileSource {
    /// Creates a file source with a fallback path.
    pub fn new(name: impl Into<String>, default_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            default_path: default_path.into(),
            values: Vec::new(),
        }
    }

    fn resolve_path(&self, params: &Params) -> CoreResult<PathBuf> {
        match params.get("path") {
            None => Ok(self.default_path.clone()),
            Some(serde_json::Value::String(path)) => Ok(PathBuf::from(path)),
            Some(other) => Err(CoreError::load(
                &self.name,
                format!("param 'path' must be a string, got {other}"),
            )),
        }
    }
}

impl Source for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn values(&self) -> &[Entry] {
        &self.values
    }

    fn load(&mut self, _store_name: &str, params: &Params) -> CoreResult<()> {
        let path = self.resolve_path(params)?;
        let values: Vec<Entry> = backup::load_path(&path)?;
        tracing::debug!(
            source = %self.name,
            path = %path.display(),
            entries = values.len(),
            "loaded file source"
        );
        self.values = values;
        Ok(())
    }
}
