//! Property-based test generators using proptest.
//!
//! Key and category alphabets are deliberately small so that generated
//! sources collide with each other and with the catalog.

use proptest::prelude::*;
use termbase_core::{DictRecord, Entry, EnumNode, Status};

/// Strategy for category names.
pub fn category_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-c]").expect("Invalid regex")
}

/// Strategy for keys within a category.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[k-p]").expect("Invalid regex")
}

/// Strategy for display values, sometimes empty.
pub fn value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z]{0,3}").expect("Invalid regex")
}

/// Strategy for statuses.
pub fn status_strategy() -> impl Strategy<Value = Status> {
    prop_oneof![Just(Status::Enabled), Just(Status::Disabled)]
}

/// Strategy for incoming records: no id, optional seq and status.
pub fn record_strategy() -> impl Strategy<Value = DictRecord> {
    (
        category_strategy(),
        key_strategy(),
        value_strategy(),
        prop::option::of(0i64..5),
        prop::option::of(status_strategy()),
    )
        .prop_map(|(category, key, value, seq, status)| {
            let mut record = DictRecord::new(category, key, value);
            record.seq = seq;
            record.status = status;
            record
        })
}

/// Strategy for records that may carry an alias key.
pub fn maybe_alias_strategy() -> impl Strategy<Value = DictRecord> {
    (record_strategy(), prop::option::of(key_strategy())).prop_map(|(record, target)| {
        match target {
            Some(target) => record.with_mapping_key(target),
            None => record,
        }
    })
}

/// Strategy for display-only nodes.
pub fn node_strategy() -> impl Strategy<Value = EnumNode> {
    (
        category_strategy(),
        key_strategy(),
        value_strategy(),
        0i64..5,
        status_strategy(),
    )
        .prop_map(|(category, key, value, seq, status)| {
            EnumNode::new(&category, &key, &value)
                .with_seq(seq)
                .with_status(status)
        })
}

/// Strategy for a source's output: records and nodes mixed.
pub fn entries_strategy(max: usize) -> impl Strategy<Value = Vec<Entry>> {
    prop::collection::vec(
        prop_oneof![
            3 => maybe_alias_strategy().prop_map(Entry::Record),
            1 => node_strategy().prop_map(Entry::Node),
        ],
        0..max,
    )
}

/// Strategy for a persisted catalog: ids are assigned `1..=n`.
pub fn catalog_strategy(max: usize) -> impl Strategy<Value = Vec<DictRecord>> {
    prop::collection::vec(maybe_alias_strategy(), 0..max).prop_map(|records| {
        records
            .into_iter()
            .zip(1..)
            .map(|(record, id)| record.with_id(id))
            .collect()
    })
}
