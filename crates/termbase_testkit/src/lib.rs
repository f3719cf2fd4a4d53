//! # Termbase Testkit
//!
//! Test utilities for Termbase.
//!
//! This crate provides:
//! - Record builders, a scripted source and an instrumented store
//! - A dictionary harness with a seeded catalog and a scratch backup dir
//! - Property-based test generators using proptest
//! - Concurrent reader/writer stress runs against the enum cache
//!
//! ## Usage
//!
//! ```rust,ignore
//! use termbase_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_dictionary() {
//!     let harness = TestDictionary::with_catalog(vec![record("c", "a", "A").with_id(1)]);
//!     let report = harness.reload(Action::ENUM.bits(), vec![]).unwrap();
//!     // ... assertions
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
    pub use termbase_core::{
        Action, DictConfig, DictRecord, Entry, EnumKey, EnumNode, SourceConfig, SourceKind,
        Status, UpdateFlags,
    };
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
