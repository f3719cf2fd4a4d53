//! # Termbase Store
//!
//! Persistence contract and implementations for Termbase.
//!
//! This crate is the narrow seam between the dictionary engine and the
//! system-of-record store. The engine never talks to a database directly;
//! it asks a [`StoreRegistry`] for a named [`Connection`] and uses three
//! operations on it:
//!
//! - find every row of a table
//! - batch-update partial rows by primary key
//! - batch-create new rows
//!
//! Rows travel as JSON objects ([`Row`]). Typed records are converted with
//! [`to_row`] and [`from_row`], which go through `serde` derive and map
//! camelCase fields to snake_case columns.
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral catalogs
//! - [`FileStore`] - One JSON file per table in a directory
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use termbase_store::{Connection, InMemoryStore, Row, StoreRegistry};
//!
//! let registry = StoreRegistry::new();
//! registry.register("main", Arc::new(InMemoryStore::new()));
//!
//! let conn = registry.connection("main").unwrap();
//! let mut row = Row::new();
//! row.insert("key".into(), "cn".into());
//! conn.batch_create("biz_dict", &[row]).unwrap();
//! assert_eq!(conn.find_all("biz_dict").unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod error;
mod file;
mod memory;
mod registry;
mod row;

pub use connection::Connection;
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use registry::StoreRegistry;
pub use row::{column_name, field_name, from_row, row_id, to_row, Row, PRIMARY_KEY};
