//! Alias mapping table and its shared cache.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Category to original key to redirect key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingTable {
    entries: HashMap<String, HashMap<String, String>>,
}

impl MappingTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirect key for `key` in `category`, or `""` if there is none.
    pub fn get_value(&self, category: &str, key: &str) -> &str {
        self.entries
            .get(category)
            .and_then(|keys| keys.get(key))
            .map_or("", String::as_str)
    }

    /// Inserts or overwrites a redirect.
    pub fn set(&mut self, category: &str, key: &str, redirect: &str) {
        self.entries
            .entry(category.to_string())
            .or_default()
            .insert(key.to_string(), redirect.to_string());
    }

    /// Inserts a redirect unless the key already has one.
    ///
    /// Returns true if the redirect was inserted.
    pub fn set_if_absent(&mut self, category: &str, key: &str, redirect: &str) -> bool {
        let keys = self.entries.entry(category.to_string()).or_default();
        if keys.contains_key(key) {
            return false;
        }
        keys.insert(key.to_string(), redirect.to_string());
        true
    }

    /// Total number of redirects.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Returns true if there are no redirects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared, swappable mapping table.
#[derive(Debug, Default)]
pub struct MappingCache {
    table: RwLock<Arc<MappingTable>>,
}

impl MappingCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirect key for `key` in `category`, or an empty string.
    pub fn get_value(&self, category: &str, key: &str) -> String {
        self.table.read().get_value(category, key).to_string()
    }

    /// Inserts or overwrites one redirect in the published table.
    pub fn set(&self, category: &str, key: &str, redirect: &str) {
        let mut table = self.table.write();
        Arc::make_mut(&mut table).set(category, key, redirect);
    }

    /// Current published table.
    pub fn snapshot(&self) -> Arc<MappingTable> {
        Arc::clone(&self.table.read())
    }

    /// Publishes a freshly built table.
    pub fn replace(&self, table: MappingTable) {
        *self.table.write() = Arc::new(table);
    }
}
