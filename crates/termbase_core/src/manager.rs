//! One reconciliation pass: register, load, construct.

use crate::backup;
use crate::config::DictConfig;
use crate::entry::Entry;
use crate::enums::{EnumCache, EnumTree};
use crate::error::{CoreError, CoreResult};
use crate::flags::Action;
use crate::mapping::MappingCache;
use crate::migration::{Catalog, MigrationBatch};
use crate::record::{DictRecord, CATALOG_TABLE};
use crate::source::{Params, Source, TableSource};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use termbase_store::{to_row, Connection, StoreRegistry};

/// Name of the built-in catalog source.
pub const CATALOG_SOURCE: &str = "biz";

/// Outcome of a successful pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReloadReport {
    /// Number of configured sources loaded, the catalog excluded.
    pub sources_loaded: usize,
    /// Catalog rows updated.
    pub updates: usize,
    /// Catalog rows created.
    pub creates: usize,
    /// Batched store calls issued.
    pub batches: usize,
    /// Redirects in the new mapping table, if it was rebuilt.
    pub mapping_entries: Option<usize>,
    /// Categories in the new enum tree, if it was rebuilt.
    pub enum_categories: Option<usize>,
    /// Visible nodes in the new enum tree, if it was rebuilt.
    pub enum_nodes: Option<usize>,
}

/// Drives a single pass. Dropped at the end of the pass, successful or not,
/// taking every loaded source with it.
pub(crate) struct Manager<'a> {
    config: &'a DictConfig,
    stores: Arc<StoreRegistry>,
    sources: HashMap<String, Box<dyn Source>>,
    catalog: TableSource<DictRecord>,
}

impl<'a> Manager<'a> {
    pub(crate) fn new(config: &'a DictConfig, stores: Arc<StoreRegistry>) -> Self {
        let catalog = TableSource::new(CATALOG_SOURCE, Arc::clone(&stores));
        Self {
            config,
            stores,
            sources: HashMap::new(),
            catalog,
        }
    }

    /// Registers source implementations.
    ///
    /// Fails on a repeated name, on a configured source without an
    /// implementation, and on a configured source without a type.
    pub(crate) fn register(&mut self, sources: Vec<Box<dyn Source>>) -> CoreResult<()> {
        let mut registered = HashMap::with_capacity(sources.len());
        for source in sources {
            let name = source.name().to_string();
            if registered.contains_key(&name) {
                return Err(CoreError::DuplicateSource { name });
            }
            registered.insert(name, source);
        }

        for (name, source_config) in &self.config.sources {
            if !registered.contains_key(name) {
                return Err(CoreError::UnknownSource { name: name.clone() });
            }
            if source_config.kind.is_none() {
                return Err(CoreError::configuration(format!(
                    "source '{name}' is missing required setting 'type'"
                )));
            }
        }

        self.sources = registered;
        Ok(())
    }

    /// Loads every configured source in order, then the catalog.
    pub(crate) fn load(&mut self) -> CoreResult<usize> {
        let config = self.config;
        for (name, source_config) in &config.sources {
            let source = self
                .sources
                .get_mut(name)
                .ok_or_else(|| CoreError::UnknownSource { name: name.clone() })?;

            source.load(
                source_config.store_name(&config.db_name),
                &source_config.params,
            )?;
            tracing::debug!(source = %name, entries = source.values().len(), "source loaded");

            if config.backup {
                let path = backup::save_file(
                    source.values(),
                    &config.dict_path,
                    &source_config.backup_filename(name),
                )?;
                tracing::debug!(source = %name, path = %path.display(), "source backed up");
            }
        }

        self.catalog.load(&config.db_name, &Params::new())?;
        Ok(config.sources.len())
    }

    /// Runs the configured rebuilds and publishes each on success.
    pub(crate) fn construct(
        &mut self,
        action: Action,
        enums: &EnumCache,
        mappings: &MappingCache,
    ) -> CoreResult<ReloadReport> {
        let mut report = ReloadReport {
            sources_loaded: self.config.sources.len(),
            ..ReloadReport::default()
        };
        let mut catalog_entries = self.catalog.take_values();

        if action.contains(Action::MAPPING) {
            let catalog = self.migrate(&catalog_entries, &mut report)?;

            let mut table = catalog.mapping_table();
            for entry in self.display_sources().into_iter().flat_map(|s| s.values()) {
                if entry.is_alias() {
                    table.set_if_absent(entry.category(), entry.key(), entry.mapping_key());
                }
            }
            report.mapping_entries = Some(table.len());
            mappings.replace(table);

            catalog_entries = catalog.into_entries();
        }

        if action.contains(Action::ENUM) {
            let mut tree = EnumTree::new();
            for source in self.display_sources() {
                tree.extend(source.values());
            }
            tree.extend(&catalog_entries);

            report.enum_categories = Some(tree.category_count());
            report.enum_nodes = Some(tree.node_count());
            enums.replace(tree);
        }

        Ok(report)
    }

    /// Diffs every authoritative source and writes each source's batch.
    fn migrate(&self, catalog_entries: &[Entry], report: &mut ReloadReport) -> CoreResult<Catalog> {
        let mut catalog = Catalog::from_entries(catalog_entries);

        let authoritative = self.config.sources.iter().filter(|(_, c)| c.is_authoritative());
        for (name, _) in authoritative {
            let Some(source) = self.sources.get(name) else {
                continue;
            };
            let batch = catalog.migrate(source.values());
            tracing::debug!(
                source = %name,
                updates = batch.updates.len(),
                creates = batch.creates.len(),
                "migration diff"
            );

            let ids = self.persist(&catalog, &batch, report)?;
            catalog.assign_ids(&batch, &ids)?;
            report.updates += batch.updates.len();
            report.creates += batch.creates.len();
        }

        Ok(catalog)
    }

    /// Issues the update batch, then the create batch.
    fn persist(
        &self,
        catalog: &Catalog,
        batch: &MigrationBatch,
        report: &mut ReloadReport,
    ) -> CoreResult<Vec<i64>> {
        let store = self.config.db_name.as_str();
        let conn = self
            .stores
            .get(store)
            .ok_or_else(|| CoreError::store_not_found(store))?;

        if !batch.updates.is_empty() {
            let rows = batch
                .updates
                .iter()
                .map(to_row)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| CoreError::persistence(store, e))?;
            conn.batch_update(CATALOG_TABLE, &rows)
                .map_err(|e| CoreError::persistence(store, e))?;
            report.batches += 1;
        }

        if batch.creates.is_empty() {
            return Ok(Vec::new());
        }
        let rows = catalog
            .created(batch)
            .map(to_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CoreError::persistence(store, e))?;
        let ids = conn
            .batch_create(CATALOG_TABLE, &rows)
            .map_err(|e| CoreError::persistence(store, e))?;
        report.batches += 1;
        Ok(ids)
    }

    /// Non-authoritative sources in configured order.
    fn display_sources(&self) -> Vec<&Box<dyn Source>> {
        self.config
            .sources
            .iter()
            .filter(|(_, c)| !c.is_authoritative())
            .filter_map(|(name, _)| self.sources.get(name))
            .collect()
    }
}
