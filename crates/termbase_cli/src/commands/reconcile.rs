//! Reconcile command implementation.
//!
//! Every store named by the configuration is a [`FileStore`] under the
//! store directory. Every source, whatever its type, replays a JSON file:
//! `params.path` when set, else its backup file in the dictionary path.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use termbase_core::{
    DictConfig, Dictionary, EnumNode, JsonFileSource, MappingTable, ReloadReport, Source,
};
use termbase_store::{FileStore, StoreRegistry};

/// Outcome printed by the reconcile command.
#[derive(Debug, Serialize)]
pub struct ReconcileResult {
    /// Pass counters.
    pub report: ReloadReport,
    /// Published enum tree by category.
    pub enums: BTreeMap<String, Vec<EnumNode>>,
    /// Published mapping table.
    pub mappings: MappingTable,
}

/// Runs the reconcile command.
pub fn run(
    config_path: &Path,
    mount: &Path,
    store_dir: &Path,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(config_path)
        .map_err(|e| format!("cannot read config {:?}: {}", config_path, e))?;
    let mut config = DictConfig::from_json(&text)?;

    let stores = Arc::new(open_stores(&config, store_dir)?);
    config.init(mount, &stores)?;

    let sources = file_sources(&config);
    let dict = Dictionary::new(Arc::clone(&stores));
    let report = dict.reload(&config, sources)?;

    let result = ReconcileResult {
        report,
        enums: dict.enums().snapshot().to_map(),
        mappings: MappingTable::clone(&dict.mappings().snapshot()),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Opens a file store for the catalog store and every source store.
fn open_stores(config: &DictConfig, store_dir: &Path) -> Result<StoreRegistry, Box<dyn std::error::Error>> {
    let names: BTreeSet<&str> = std::iter::once(config.db_name.as_str())
        .chain(config.sources.values().map(|s| s.store_name(&config.db_name)))
        .filter(|name| !name.is_empty())
        .collect();

    let stores = StoreRegistry::new();
    for name in names {
        let store = FileStore::open_with_create_dirs(&store_dir.join(name))?;
        tracing::debug!(store = name, path = %store.path().display(), "opened file store");
        stores.register(name, Arc::new(store));
    }
    Ok(stores)
}

/// One file source per configured source. Expects `config` to be
/// initialized so that every filename is set.
fn file_sources(config: &DictConfig) -> Vec<Box<dyn Source>> {
    config
        .sources
        .iter()
        .map(|(name, source)| {
            let path = config.dict_path.join(&source.filename);
            Box::new(JsonFileSource::new(name.as_str(), path)) as Box<dyn Source>
        })
        .collect()
}

fn print_text_output(result: &ReconcileResult) {
    let report = &result.report;
    println!("Reconciliation");
    println!("==============");
    println!("Sources loaded:  {}", report.sources_loaded);
    println!("Rows updated:    {}", report.updates);
    println!("Rows created:    {}", report.creates);
    println!("Store batches:   {}", report.batches);
    if let Some(entries) = report.mapping_entries {
        println!("Mapping entries: {}", entries);
    }
    if let (Some(categories), Some(nodes)) = (report.enum_categories, report.enum_nodes) {
        println!("Enum categories: {}", categories);
        println!("Enum nodes:      {}", nodes);
    }

    for (category, nodes) in &result.enums {
        println!();
        println!("[{}]", category);
        for node in nodes {
            println!(
                "  {:<16} {:<24} seq={} status={}",
                node.key, node.value, node.seq, node.status
            );
        }
    }
}
