//! Migration diff between authoritative sources and the persisted catalog.
//!
//! The catalog is partitioned by status into an enabled and a disabled map,
//! both keyed by `(category, key)`. Incoming records are matched against
//! those maps in order:
//!
//! 1. A match in the enabled map is updated in place when it is a plain
//!    persisted record (no alias key, positive id). Disabling it moves it
//!    to the disabled map.
//! 2. Otherwise an enabled incoming record promotes a plain persisted match
//!    from the disabled map, or becomes a new record.
//! 3. A disabled incoming record with no enabled match is ignored.
//!
//! Several authoritative sources run one after another against the same
//! maps, so a later source sees what an earlier one created or changed.

use crate::entry::Entry;
use crate::error::{CoreError, CoreResult};
use crate::mapping::MappingTable;
use crate::record::{DictRecord, RecordPatch, Status};
use std::collections::HashMap;

/// `category -> key -> index into the record list`.
type Partition = HashMap<String, HashMap<String, usize>>;

fn find(partition: &Partition, record: &DictRecord) -> Option<usize> {
    partition
        .get(&record.category)
        .and_then(|keys| keys.get(&record.key))
        .copied()
}

fn insert(partition: &mut Partition, record: &DictRecord, idx: usize) {
    partition
        .entry(record.category.clone())
        .or_default()
        .insert(record.key.clone(), idx);
}

fn remove(partition: &mut Partition, category: &str, key: &str) {
    if let Some(keys) = partition.get_mut(category) {
        keys.remove(key);
        if keys.is_empty() {
            partition.remove(category);
        }
    }
}

/// Writes produced by diffing one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationBatch {
    /// Sparse updates, in source order.
    pub updates: Vec<RecordPatch>,
    /// Indices of new records in the working catalog, in source order.
    pub creates: Vec<usize>,
}

impl MigrationBatch {
    /// Returns true if there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.creates.is_empty()
    }
}

/// Working copy of the catalog during a pass.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<DictRecord>,
    enabled: Partition,
    disabled: Partition,
}

impl Catalog {
    /// Partitions the catalog records among `entries`. Display-only nodes
    /// are not part of the catalog and are dropped.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        let mut catalog = Self::default();
        for record in entries.into_iter().filter_map(Entry::as_record) {
            let idx = catalog.records.len();
            match record.status() {
                Status::Enabled => insert(&mut catalog.enabled, record, idx),
                Status::Disabled => insert(&mut catalog.disabled, record, idx),
            }
            catalog.records.push(record.clone());
        }
        catalog
    }

    /// Diffs one authoritative source against the running maps.
    ///
    /// The working records are updated immediately; the returned batch
    /// says what has to be written to the store.
    pub fn migrate<'a, I>(&mut self, incoming: I) -> MigrationBatch
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        let mut batch = MigrationBatch::default();

        for record in incoming.into_iter().filter_map(Entry::as_record) {
            if let Some(idx) = find(&self.enabled, record) {
                let existing = &mut self.records[idx];
                if existing.is_alias() || !existing.is_persisted() {
                    continue;
                }
                if let Some(patch) = existing.absorb(record) {
                    if existing.status() == Status::Disabled {
                        remove(&mut self.enabled, &record.category, &record.key);
                        insert(&mut self.disabled, record, idx);
                    }
                    batch.updates.push(patch);
                }
            } else if record.status() == Status::Enabled {
                if let Some(idx) = find(&self.disabled, record) {
                    let existing = &mut self.records[idx];
                    if existing.is_alias() || !existing.is_persisted() {
                        continue;
                    }
                    if let Some(patch) = existing.absorb(record) {
                        batch.updates.push(patch);
                    }
                    remove(&mut self.disabled, &record.category, &record.key);
                    insert(&mut self.enabled, record, idx);
                } else {
                    let idx = self.records.len();
                    self.records.push(record.for_create());
                    insert(&mut self.enabled, record, idx);
                    batch.creates.push(idx);
                }
            }
        }

        batch
    }

    /// Records queued for creation by `batch`.
    pub fn created<'a>(&'a self, batch: &'a MigrationBatch) -> impl Iterator<Item = &'a DictRecord> {
        batch.creates.iter().map(move |&idx| &self.records[idx])
    }

    /// Stores the primary keys handed out for created records.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IdCount`] and assigns nothing unless there is
    /// exactly one id per created record.
    pub fn assign_ids(&mut self, batch: &MigrationBatch, ids: &[i64]) -> CoreResult<()> {
        if ids.len() != batch.creates.len() {
            return Err(CoreError::IdCount {
                expected: batch.creates.len(),
                actual: ids.len(),
            });
        }
        for (&idx, &id) in batch.creates.iter().zip(ids) {
            self.records[idx].id = id;
        }
        Ok(())
    }

    /// Redirects of every aliased record.
    pub fn mapping_table(&self) -> MappingTable {
        let mut table = MappingTable::new();
        for record in self.records.iter().filter(|r| r.is_alias()) {
            table.set(&record.category, &record.key, &record.mapping_key);
        }
        table
    }

    /// Current records: loaded ones first, then created ones.
    pub fn records(&self) -> &[DictRecord] {
        &self.records
    }

    /// Number of `(category, key)` pairs currently enabled.
    pub fn enabled_len(&self) -> usize {
        self.enabled.values().map(HashMap::len).sum()
    }

    /// Number of `(category, key)` pairs currently disabled.
    pub fn disabled_len(&self) -> usize {
        self.disabled.values().map(HashMap::len).sum()
    }

    /// Converts the working records back into entries.
    pub fn into_entries(self) -> Vec<Entry> {
        self.records.into_iter().map(Entry::Record).collect()
    }
}
