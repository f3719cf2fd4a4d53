//! # Termbase Core
//!
//! Dictionary reconciliation and enum materialization engine.
//!
//! This crate provides:
//! - The canonical dictionary record and its sparse update payload
//! - A source contract, with a table-backed and a JSON-file source
//! - The migration diff that reconciles authoritative sources into the
//!   persisted catalog
//! - The published enum tree with a live add/update/remove API
//! - The alias mapping table
//! - A [`Dictionary`] that owns both caches and runs reconciliation passes
//!
//! ## Key Invariants
//!
//! - Within one category no two published nodes share key and status
//! - Aliased records never appear in the enum tree
//! - A failed pass publishes nothing further; earlier snapshots stay
//! - The mapping table and the enum tree are swapped independently

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backup;
mod config;
mod dictionary;
mod entry;
mod enums;
mod error;
mod flags;
mod manager;
mod mapping;
mod migration;
mod record;
mod source;

pub use config::{DictConfig, SourceConfig, SourceKind, DEFAULT_DICT_DIR};
pub use dictionary::Dictionary;
pub use entry::Entry;
pub use enums::{EnumCache, EnumKey, EnumNode, EnumTree};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use flags::{Action, UpdateFlags};
pub use manager::{ReloadReport, CATALOG_SOURCE};
pub use mapping::{MappingCache, MappingTable};
pub use migration::{Catalog, MigrationBatch};
pub use record::{DictRecord, RecordPatch, Status, CATALOG_TABLE};
pub use source::{JsonFileSource, Params, Source, Table, TableSource};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
