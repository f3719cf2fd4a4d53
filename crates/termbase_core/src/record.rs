//! The canonical dictionary record and its sparse update payload.

use crate::enums::{EnumKey, EnumNode};
use crate::flags::UpdateFlags;
use crate::source::Table;
use crate::Entry;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Table holding the persisted catalog.
pub const CATALOG_TABLE: &str = "biz_dict";

/// Enabled or disabled.
///
/// Stored as an integer: `0` is enabled, any other value reads as disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Status {
    /// Visible to lookups.
    #[default]
    Enabled,
    /// Retired but kept.
    Disabled,
}

impl Status {
    /// Returns the other status.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Status::Enabled => Status::Disabled,
            Status::Disabled => Status::Enabled,
        }
    }

    /// Returns the stored integer code.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Status::Enabled => 0,
            Status::Disabled => 1,
        }
    }
}

impl From<i64> for Status {
    fn from(code: i64) -> Self {
        if code == 0 {
            Status::Enabled
        } else {
            Status::Disabled
        }
    }
}

impl From<Status> for i64 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One persisted lookup-table entry.
///
/// The pair `(category, key)` locates a record inside the catalog; adding the
/// effective status gives its identity. Records are never deleted, only
/// disabled.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictRecord {
    /// Primary key. Zero for records not yet persisted.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    /// Namespace of the key.
    pub category: String,
    /// Key within the category.
    pub key: String,
    /// Display value.
    #[serde(default)]
    pub value: String,
    /// Redirect key. Aliased records never show up in the enum tree.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mapping_key: String,
    /// Ordering within the category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<i64>,
    /// Absent means enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Creation time, Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<u64>,
    /// Last update time, Unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<u64>,
}

fn is_zero(id: &i64) -> bool {
    *id == 0
}

impl DictRecord {
    /// Creates an enabled record with no ordering.
    pub fn new(
        category: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            key: key.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// Sets the primary key.
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn with_seq(mut self, seq: i64) -> Self {
        self.seq = Some(seq);
        self
    }

    /// Sets the status explicitly.
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the alias key.
    #[must_use]
    pub fn with_mapping_key(mut self, mapping_key: impl Into<String>) -> Self {
        self.mapping_key = mapping_key.into();
        self
    }

    /// Effective status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status.unwrap_or_default()
    }

    /// Effective ordering.
    #[must_use]
    pub fn seq(&self) -> i64 {
        self.seq.unwrap_or(0)
    }

    /// Returns true if the record redirects to another key.
    #[must_use]
    pub fn is_alias(&self) -> bool {
        !self.mapping_key.is_empty()
    }

    /// Returns true if the record has been persisted.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// Identity of this record: category, key and effective status.
    #[must_use]
    pub fn identity(&self) -> EnumKey {
        EnumKey::new(&self.category, &self.key, self.status())
    }

    /// Fields this record carries when used as a live update.
    #[must_use]
    pub fn update_flags(&self) -> UpdateFlags {
        let mut flags = UpdateFlags::empty();
        if !self.value.is_empty() {
            flags |= UpdateFlags::VALUE;
        }
        if self.seq.is_some() {
            flags |= UpdateFlags::SEQ;
        }
        if self.status.is_some() {
            flags |= UpdateFlags::STATUS;
        }
        flags
    }

    /// Display node for this record.
    #[must_use]
    pub fn to_node(&self) -> EnumNode {
        EnumNode::new(&self.category, &self.key, &self.value)
            .with_seq(self.seq())
            .with_status(self.status())
    }

    /// Absorbs an incoming authoritative version of this record.
    ///
    /// Every field of `incoming` that differs from the current value is
    /// copied in and reported in the returned patch; equal fields are left
    /// out. An empty incoming value means "no value supplied". Returns
    /// `None` when nothing changed.
    ///
    /// Timestamps are left alone. The patch does not carry them, so the
    /// working copy stays equal to the stored row.
    pub fn absorb(&mut self, incoming: &DictRecord) -> Option<RecordPatch> {
        let mut patch = RecordPatch::new(self.id);

        if !incoming.value.is_empty() && incoming.value != self.value {
            self.value = incoming.value.clone();
            patch.value = Some(incoming.value.clone());
        }
        if incoming.seq() != self.seq() {
            self.seq = incoming.seq;
            patch.seq = Some(incoming.seq());
        }
        if incoming.status() != self.status() {
            self.status = Some(incoming.status());
            patch.status = Some(incoming.status());
        }

        if patch.is_empty() {
            None
        } else {
            Some(patch)
        }
    }

    /// Copy of this record ready to be inserted as a new catalog row.
    #[must_use]
    pub fn for_create(&self) -> DictRecord {
        let now = now_millis();
        DictRecord {
            id: 0,
            create_time: Some(now),
            update_time: Some(now),
            ..self.clone()
        }
    }
}

impl Table for DictRecord {
    const TABLE: &'static str = CATALOG_TABLE;

    fn explode(self) -> Vec<Entry> {
        vec![Entry::Record(self)]
    }
}

/// Sparse update for one catalog row.
///
/// Only fields that changed are present; the store leaves every other
/// column alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    /// Primary key of the row to update.
    pub id: i64,
    /// New value, if changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// New ordering, if changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<i64>,
    /// New status, if changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl RecordPatch {
    /// Creates an empty patch for a row.
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            id,
            value: None,
            seq: None,
            status: None,
        }
    }

    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.seq.is_none() && self.status.is_none()
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
