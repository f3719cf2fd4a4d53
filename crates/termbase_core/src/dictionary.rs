//! The owned dictionary: published caches plus the reload entry point.

use crate::config::DictConfig;
use crate::entry::Entry;
use crate::enums::{EnumCache, EnumKey, EnumNode};
use crate::error::CoreResult;
use crate::flags::UpdateFlags;
use crate::manager::{Manager, ReloadReport};
use crate::mapping::MappingCache;
use crate::source::Source;
use std::sync::Arc;
use std::time::Instant;
use termbase_store::StoreRegistry;

/// Dictionary engine state shared by a host process.
///
/// Construct one at startup and pass it around by reference (or `Arc`).
/// Readers call [`Dictionary::get_enum`] and [`Dictionary::mapping_key`]
/// from any thread; reconfiguration goes through [`Dictionary::reload`],
/// which callers must not run concurrently with itself.
///
/// # Example
///
/// ```rust,ignore
/// let dict = Dictionary::open(stores, &config, sources)?;
/// let currencies = dict.get_enum("currency").unwrap_or_default();
/// let target = dict.mapping_key("currency", "usd");
/// ```
#[derive(Debug)]
pub struct Dictionary {
    stores: Arc<StoreRegistry>,
    enums: EnumCache,
    mappings: MappingCache,
}

impl Dictionary {
    /// Creates a dictionary with empty caches.
    pub fn new(stores: Arc<StoreRegistry>) -> Self {
        Self {
            stores,
            enums: EnumCache::new(),
            mappings: MappingCache::new(),
        }
    }

    /// Creates a dictionary and runs the first pass.
    ///
    /// # Errors
    ///
    /// Any error of the first pass. Hosts should treat it as a startup
    /// failure.
    pub fn open(
        stores: Arc<StoreRegistry>,
        config: &DictConfig,
        sources: Vec<Box<dyn Source>>,
    ) -> CoreResult<Self> {
        let dict = Self::new(stores);
        dict.reload(config, sources)?;
        Ok(dict)
    }

    /// Runs one reconciliation pass.
    ///
    /// Sources are registered, every configured source and then the catalog
    /// are loaded, and the rebuilds selected by the action mask run. The
    /// mapping table and the enum tree are each published as soon as their
    /// own step succeeds; on error nothing further is published and the
    /// loaded sources are dropped.
    ///
    /// # Errors
    ///
    /// Configuration, load and persistence errors, see
    /// [`crate::ErrorKind`].
    pub fn reload(
        &self,
        config: &DictConfig,
        sources: Vec<Box<dyn Source>>,
    ) -> CoreResult<ReloadReport> {
        let start = Instant::now();
        let action = config.parsed_action()?;

        let mut manager = Manager::new(config, Arc::clone(&self.stores));
        let result = manager
            .register(sources)
            .and_then(|()| manager.load())
            .and_then(|_| manager.construct(action, &self.enums, &self.mappings));

        match &result {
            Ok(report) => tracing::info!(
                sources = report.sources_loaded,
                updates = report.updates,
                creates = report.creates,
                enum_nodes = report.enum_nodes.unwrap_or_default(),
                mapping_entries = report.mapping_entries.unwrap_or_default(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "dictionary reloaded"
            ),
            Err(e) => tracing::warn!(error = %e, kind = ?e.kind(), "dictionary reload aborted"),
        }
        result
    }

    /// Store registry this dictionary reads and writes through.
    pub fn stores(&self) -> &Arc<StoreRegistry> {
        &self.stores
    }

    /// The enum cache, for snapshots and live updates.
    pub fn enums(&self) -> &EnumCache {
        &self.enums
    }

    /// The mapping cache.
    pub fn mappings(&self) -> &MappingCache {
        &self.mappings
    }

    /// Ordered nodes of a category.
    pub fn get_enum(&self, category: &str) -> Option<Vec<EnumNode>> {
        self.enums.get(category)
    }

    /// Redirect key for `key` in `category`, or an empty string.
    pub fn mapping_key(&self, category: &str, key: &str) -> String {
        self.mappings.get_value(category, key)
    }

    /// Sets one redirect in the published mapping table.
    pub fn set_mapping_key(&self, category: &str, key: &str, redirect: &str) {
        self.mappings.set(category, key, redirect);
    }

    /// Live add of one entry.
    pub fn add_enum(&self, entry: &Entry) -> bool {
        self.enums.add(entry)
    }

    /// Live update of one entry with explicit flags.
    pub fn update_enum(&self, entry: &Entry, flags: UpdateFlags) -> bool {
        self.enums.update_with(entry, flags)
    }

    /// Live removal of one identity.
    pub fn remove_enum(&self, key: &EnumKey) -> bool {
        self.enums.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DictRecord, Status, CATALOG_TABLE};
    use termbase_store::{to_row, InMemoryStore};

    fn stores_with(records: &[DictRecord]) -> Arc<StoreRegistry> {
        let rows = records.iter().map(|r| to_row(r).unwrap()).collect();
        let stores = StoreRegistry::new();
        stores.register("main", Arc::new(InMemoryStore::with_rows(CATALOG_TABLE, rows)));
        Arc::new(stores)
    }

    #[test]
    fn open_publishes_catalog() {
        let stores = stores_with(&[
            DictRecord::new("country", "cn", "China").with_id(1),
            DictRecord::new("country", "prc", "").with_id(2).with_mapping_key("cn"),
        ]);
        let config = DictConfig::new().db_name("main").action(3);

        let dict = Dictionary::open(stores, &config, Vec::new()).unwrap();

        let nodes = dict.get_enum("country").unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].value, "China");
        assert_eq!(dict.mapping_key("country", "prc"), "cn");
    }

    #[test]
    fn report_counts_rebuilds() {
        let stores = stores_with(&[DictRecord::new("c", "a", "A").with_id(1)]);
        let dict = Dictionary::new(stores);

        let report = dict
            .reload(&DictConfig::new().db_name("main").action(2), Vec::new())
            .unwrap();
        assert_eq!(report.enum_categories, Some(1));
        assert_eq!(report.enum_nodes, Some(1));
        assert_eq!(report.mapping_entries, None);
        assert_eq!(report.batches, 0);
    }

    #[test]
    fn live_api_goes_through_the_cache() {
        let dict = Dictionary::new(Arc::new(StoreRegistry::new()));
        let entry = Entry::from(DictRecord::new("c", "a", "A"));
        assert!(dict.add_enum(&entry));
        assert!(!dict.add_enum(&entry));

        let renamed = Entry::from(DictRecord::new("c", "a", "B"));
        assert!(dict.update_enum(&renamed, UpdateFlags::VALUE));
        assert_eq!(dict.get_enum("c").unwrap()[0].value, "B");

        assert!(dict.remove_enum(&EnumKey::new("c", "a", Status::Enabled)));
        assert!(dict.get_enum("c").is_none());

        dict.set_mapping_key("c", "x", "a");
        assert_eq!(dict.mapping_key("c", "x"), "a");
    }
}
