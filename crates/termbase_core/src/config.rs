//! Dictionary configuration.

use crate::error::{CoreError, CoreResult};
use crate::flags::Action;
use crate::source::Params;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use termbase_store::StoreRegistry;

/// Directory under the mount path used when `dictPath` is not set.
pub const DEFAULT_DICT_DIR: &str = "dict";

/// How a configured source takes part in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Authoritative: reconciled into the catalog.
    Migration,
    /// Fetched from a remote service, display only.
    Remote,
    /// Read from local files, display only.
    Local,
}

/// Configuration of one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    /// Source type. Required.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SourceKind>,
    /// Store the source reads from. Defaults to the top-level store.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub db_name: String,
    /// Backup file name. Defaults to `<sourceName>.json`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filename: String,
    /// Opaque parameters passed to the source's `load`.
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,
}

impl SourceConfig {
    /// Creates a source configuration of the given type.
    #[must_use]
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Sets the store name.
    #[must_use]
    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }

    /// Sets the backup file name.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Returns true for authoritative sources.
    pub fn is_authoritative(&self) -> bool {
        self.kind == Some(SourceKind::Migration)
    }

    /// Store name, falling back to `default`.
    pub fn store_name<'a>(&'a self, default: &'a str) -> &'a str {
        if self.db_name.is_empty() {
            default
        } else {
            &self.db_name
        }
    }

    /// Backup file name for a source called `name`.
    pub fn backup_filename(&self, name: &str) -> String {
        if self.filename.is_empty() {
            format!("{name}.json")
        } else {
            self.filename.clone()
        }
    }

    fn init(&mut self, name: &str, db_name: &str, stores: &StoreRegistry) -> CoreResult<()> {
        if self.kind.is_none() {
            return Err(CoreError::configuration(format!(
                "source '{name}' is missing required setting 'type'"
            )));
        }
        if self.db_name.is_empty() {
            self.db_name = db_name.to_string();
        }
        if !stores.contains(&self.db_name) {
            return Err(CoreError::store_not_found(&self.db_name));
        }
        if self.filename.is_empty() {
            self.filename = self.backup_filename(name);
        }
        Ok(())
    }
}

/// Configuration for a dictionary pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictConfig {
    /// Store holding the catalog and the default store for sources.
    #[serde(default)]
    pub db_name: String,

    /// Directory for backup files.
    #[serde(default)]
    pub dict_path: PathBuf,

    /// Whether to snapshot each source's output during a pass.
    #[serde(default)]
    pub backup: bool,

    /// Raw action mask: 1 = mapping, 2 = enum.
    #[serde(default)]
    pub action: u8,

    /// Sources by name, in configured order.
    #[serde(default, rename = "source")]
    pub sources: IndexMap<String, SourceConfig>,
}

impl DictConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the text is not a valid
    /// configuration document.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        serde_json::from_str(text).map_err(|e| CoreError::configuration(e.to_string()))
    }

    /// Sets the catalog store name.
    #[must_use]
    pub fn db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }

    /// Sets the backup directory.
    #[must_use]
    pub fn dict_path(mut self, dict_path: impl Into<PathBuf>) -> Self {
        self.dict_path = dict_path.into();
        self
    }

    /// Sets whether backups are written.
    #[must_use]
    pub fn backup(mut self, value: bool) -> Self {
        self.backup = value;
        self
    }

    /// Sets the raw action mask.
    #[must_use]
    pub fn action(mut self, action: u8) -> Self {
        self.action = action;
        self
    }

    /// Appends a source.
    #[must_use]
    pub fn source(mut self, name: impl Into<String>, source: SourceConfig) -> Self {
        self.sources.insert(name.into(), source);
        self
    }

    /// Parsed action mask.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAction`] for zero or unknown bits.
    pub fn parsed_action(&self) -> CoreResult<Action> {
        Action::parse(self.action)
    }

    /// Applies defaults and validates against the registered stores.
    ///
    /// - `dictPath` defaults to `<mount_path>/dict` and is created if missing
    /// - the action mask must be 1, 2 or 3
    /// - every source needs a type; its store defaults to `dbName` and must
    ///   be registered; its backup file defaults to `<name>.json`
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found.
    pub fn init(&mut self, mount_path: &Path, stores: &StoreRegistry) -> CoreResult<()> {
        if self.dict_path.as_os_str().is_empty() {
            self.dict_path = mount_path.join(DEFAULT_DICT_DIR);
        }
        self.parsed_action()?;
        if !stores.contains(&self.db_name) {
            return Err(CoreError::store_not_found(&self.db_name));
        }
        for (name, source) in &mut self.sources {
            source.init(name, &self.db_name, stores)?;
        }
        fs::create_dir_all(&self.dict_path).map_err(|e| {
            CoreError::configuration(format!(
                "cannot create dictionary path {}: {e}",
                self.dict_path.display()
            ))
        })?;
        Ok(())
    }
}
