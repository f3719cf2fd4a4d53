//! Inspect command implementation.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use termbase_core::{backup, Entry, Status};

/// Counts for one category of a backup file.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    /// Catalog records.
    pub records: usize,
    /// Display-only nodes.
    pub nodes: usize,
    /// Entries redirecting to another key.
    pub aliases: usize,
    /// Disabled entries.
    pub disabled: usize,
}

/// Backup inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Backup file path.
    pub path: String,
    /// Total entries.
    pub entries: usize,
    /// Per-category counts, sorted by category.
    pub categories: BTreeMap<String, CategoryStats>,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No backup file found at {:?}", path).into());
    }

    let entries: Vec<Entry> = backup::load_path(path)?;
    let result = InspectResult {
        path: path.display().to_string(),
        entries: entries.len(),
        categories: summarize(&entries),
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

fn summarize(entries: &[Entry]) -> BTreeMap<String, CategoryStats> {
    let mut categories: BTreeMap<String, CategoryStats> = BTreeMap::new();
    for entry in entries {
        let stats = categories.entry(entry.category().to_string()).or_default();
        match entry {
            Entry::Record(_) => stats.records += 1,
            Entry::Node(_) => stats.nodes += 1,
        }
        if entry.is_alias() {
            stats.aliases += 1;
        }
        if entry.status() == Status::Disabled {
            stats.disabled += 1;
        }
    }
    categories
}

fn print_text_output(result: &InspectResult) {
    println!("Backup: {}", result.path);
    println!("Entries: {}", result.entries);
    println!();
    println!(
        "{:<20} {:>8} {:>8} {:>8} {:>8}",
        "CATEGORY", "RECORDS", "NODES", "ALIASES", "DISABLED"
    );
    for (category, stats) in &result.categories {
        println!(
            "{:<20} {:>8} {:>8} {:>8} {:>8}",
            category, stats.records, stats.nodes, stats.aliases, stats.disabled
        );
    }
}
