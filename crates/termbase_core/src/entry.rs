//! The closed set of things a source can yield.

use crate::enums::{EnumKey, EnumNode};
use crate::flags::UpdateFlags;
use crate::record::{DictRecord, Status};
use serde::{Deserialize, Serialize};

/// A dictionary entry produced by a source.
///
/// Persisted records take part in reconciliation; bare nodes (typically from
/// remote or file sources) are only displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    /// A catalog record.
    Record(DictRecord),
    /// A display-only node.
    Node(EnumNode),
}

impl Entry {
    /// Category of the entry.
    pub fn category(&self) -> &str {
        match self {
            Entry::Record(r) => &r.category,
            Entry::Node(n) => &n.category,
        }
    }

    /// Key of the entry.
    pub fn key(&self) -> &str {
        match self {
            Entry::Record(r) => &r.key,
            Entry::Node(n) => &n.key,
        }
    }

    /// Alias key, empty when the entry is not an alias.
    pub fn mapping_key(&self) -> &str {
        match self {
            Entry::Record(r) => &r.mapping_key,
            Entry::Node(_) => "",
        }
    }

    /// Effective status.
    pub fn status(&self) -> Status {
        match self {
            Entry::Record(r) => r.status(),
            Entry::Node(n) => n.status,
        }
    }

    /// Returns true if the entry redirects to another key.
    pub fn is_alias(&self) -> bool {
        !self.mapping_key().is_empty()
    }

    /// Identity key: category, key and status.
    pub fn identity(&self) -> EnumKey {
        EnumKey::new(self.category(), self.key(), self.status())
    }

    /// Fields this entry carries when used as a live update.
    ///
    /// A node always carries its status and carries value and seq when they
    /// are non-empty.
    pub fn update_flags(&self) -> UpdateFlags {
        match self {
            Entry::Record(r) => r.update_flags(),
            Entry::Node(n) => {
                let mut flags = UpdateFlags::STATUS;
                if !n.value.is_empty() {
                    flags |= UpdateFlags::VALUE;
                }
                if n.seq != 0 {
                    flags |= UpdateFlags::SEQ;
                }
                flags
            }
        }
    }

    /// Display node for the entry.
    pub fn to_node(&self) -> EnumNode {
        match self {
            Entry::Record(r) => r.to_node(),
            Entry::Node(n) => n.clone(),
        }
    }

    /// Returns the catalog record, if this is one.
    pub fn as_record(&self) -> Option<&DictRecord> {
        match self {
            Entry::Record(r) => Some(r),
            Entry::Node(_) => None,
        }
    }
}

impl From<DictRecord> for Entry {
    fn from(record: DictRecord) -> Self {
        Entry::Record(record)
    }
}

impl From<EnumNode> for Entry {
    fn from(node: EnumNode) -> Self {
        Entry::Node(node)
    }
}
