//! Test fixtures and dictionary helpers.
//!
//! Provides a scripted [`StaticSource`], an instrumented
//! [`RecordingStore`] and a [`TestDictionary`] harness that wires them to a
//! real [`Dictionary`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use termbase_core::{
    CoreError, CoreResult, DictConfig, DictRecord, Dictionary, Entry, EnumNode, Params,
    ReloadReport, Source, SourceConfig, SourceKind, Status, CATALOG_TABLE,
};
use termbase_store::{to_row, Connection, InMemoryStore, Row, StoreError, StoreRegistry, StoreResult};

/// Name the harness registers its catalog store under.
pub const TEST_STORE: &str = "main";

/// Enabled record with no id.
pub fn record(category: &str, key: &str, value: &str) -> DictRecord {
    DictRecord::new(category, key, value)
}

/// Disabled record with no id.
pub fn disabled(category: &str, key: &str, value: &str) -> DictRecord {
    DictRecord::new(category, key, value).with_status(Status::Disabled)
}

/// Enabled alias record redirecting `key` to `target`.
pub fn alias(category: &str, key: &str, target: &str) -> DictRecord {
    DictRecord::new(category, key, "").with_mapping_key(target)
}

/// Display-only node.
pub fn node(category: &str, key: &str, value: &str) -> EnumNode {
    EnumNode::new(category, key, value)
}

/// Wraps records as entries.
pub fn entries(records: impl IntoIterator<Item = DictRecord>) -> Vec<Entry> {
    records.into_iter().map(Entry::Record).collect()
}

/// A source that yields a fixed list of entries, or fails on load.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    pending: Vec<Entry>,
    values: Vec<Entry>,
    failure: Option<String>,
}

impl StaticSource {
    /// Creates a source that yields `values` once loaded.
    pub fn new(name: impl Into<String>, values: Vec<Entry>) -> Self {
        Self {
            name: name.into(),
            pending: values,
            values: Vec::new(),
            failure: None,
        }
    }

    /// Creates a source from records.
    pub fn records(name: impl Into<String>, records: Vec<DictRecord>) -> Self {
        Self::new(name, entries(records))
    }

    /// Creates a source whose load always fails with `message`.
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(name, Vec::new())
        }
    }

    /// Boxes the source for registration.
    pub fn boxed(self) -> Box<dyn Source> {
        Box::new(self)
    }
}

impl Source for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn values(&self) -> &[Entry] {
        &self.values
    }

    fn load(&mut self, _store_name: &str, _params: &Params) -> CoreResult<()> {
        if let Some(message) = &self.failure {
            return Err(CoreError::load(&self.name, message));
        }
        self.values = self.pending.clone();
        Ok(())
    }
}

/// In-memory store that counts batch calls and can be told to fail them.
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: InMemoryStore,
    updates: AtomicUsize,
    creates: AtomicUsize,
    fail_updates: AtomicBool,
    fail_creates: AtomicBool,
}

impl RecordingStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with a seeded catalog table.
    pub fn with_catalog(records: &[DictRecord]) -> Self {
        let rows = records
            .iter()
            .map(|r| to_row(r).expect("record encodes"))
            .collect();
        Self {
            inner: InMemoryStore::with_rows(CATALOG_TABLE, rows),
            ..Self::default()
        }
    }

    /// Number of `batch_update` calls that reached the store.
    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Number of `batch_create` calls that reached the store.
    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Total batch calls.
    pub fn batch_calls(&self) -> usize {
        self.update_calls() + self.create_calls()
    }

    /// Resets the call counters.
    pub fn reset_counts(&self) {
        self.updates.store(0, Ordering::SeqCst);
        self.creates.store(0, Ordering::SeqCst);
    }

    /// Makes every following `batch_update` fail.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Makes every following `batch_create` fail.
    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Decoded catalog rows.
    pub fn catalog(&self) -> Vec<DictRecord> {
        self.inner
            .find_all(CATALOG_TABLE)
            .expect("memory store reads")
            .into_iter()
            .map(|row| termbase_store::from_row(row).expect("catalog row decodes"))
            .collect()
    }
}

impl Connection for RecordingStore {
    fn find_all(&self, table: &str) -> StoreResult<Vec<Row>> {
        self.inner.find_all(table)
    }

    fn batch_update(&self, table: &str, patches: &[Row]) -> StoreResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::rejected(table, "injected update failure"));
        }
        self.inner.batch_update(table, patches)
    }

    fn batch_create(&self, table: &str, rows: &[Row]) -> StoreResult<Vec<i64>> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(StoreError::rejected(table, "injected create failure"));
        }
        self.inner.batch_create(table, rows)
    }
}

/// A dictionary wired to a [`RecordingStore`] and a scratch directory.
pub struct TestDictionary {
    /// The dictionary under test.
    pub dict: Dictionary,
    /// The catalog store, registered as [`TEST_STORE`].
    pub store: Arc<RecordingStore>,
    /// Registry holding the store.
    pub stores: Arc<StoreRegistry>,
    temp_dir: TempDir,
}

impl TestDictionary {
    /// Creates a harness with an empty catalog.
    pub fn new() -> Self {
        Self::with_catalog(Vec::new())
    }

    /// Creates a harness with a seeded catalog.
    pub fn with_catalog(records: Vec<DictRecord>) -> Self {
        let store = Arc::new(RecordingStore::with_catalog(&records));
        let stores = Arc::new(StoreRegistry::new());
        stores.register(TEST_STORE, Arc::clone(&store) as Arc<dyn Connection>);
        Self {
            dict: Dictionary::new(Arc::clone(&stores)),
            store,
            stores,
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Backup directory used by [`TestDictionary::config`].
    pub fn dict_path(&self) -> &std::path::Path {
        self.temp_dir.path()
    }

    /// Base configuration: catalog in [`TEST_STORE`], backups off.
    pub fn config(&self, action: u8) -> DictConfig {
        DictConfig::new()
            .db_name(TEST_STORE)
            .dict_path(self.dict_path())
            .action(action)
    }

    /// Configuration with `sources` declared in order.
    pub fn config_with(&self, action: u8, sources: &[(&str, SourceKind)]) -> DictConfig {
        sources.iter().fold(self.config(action), |config, (name, kind)| {
            config.source(*name, SourceConfig::new(*kind))
        })
    }

    /// Runs one pass.
    pub fn reload(
        &self,
        config: &DictConfig,
        sources: Vec<Box<dyn Source>>,
    ) -> CoreResult<ReloadReport> {
        self.dict.reload(config, sources)
    }
}

impl Default for TestDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestDictionary {
    type Target = Dictionary;

    fn deref(&self) -> &Self::Target {
        &self.dict
    }
}
