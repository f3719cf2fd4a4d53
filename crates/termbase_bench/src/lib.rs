//! Benchmark utilities.

#![warn(missing_docs)]

use rand::seq::SliceRandom;
use rand::Rng;
use termbase_core::{DictRecord, Entry, Status};

/// Generate `categories * keys` enabled records, some of them aliases.
pub fn generate_records(categories: usize, keys: usize) -> Vec<DictRecord> {
    let mut rng = rand::thread_rng();
    (0..categories)
        .flat_map(|c| (0..keys).map(move |k| (c, k)))
        .map(|(c, k)| {
            let record = DictRecord::new(format!("cat{c}"), format!("key{k}"), format!("value {k}"))
                .with_seq(rng.gen_range(0..100));
            if rng.gen_ratio(1, 10) {
                record.with_mapping_key(format!("key{}", rng.gen_range(0..keys)))
            } else {
                record
            }
        })
        .collect()
}

/// Assign ids `1..=n` as if the records were persisted.
pub fn persisted(records: Vec<DictRecord>) -> Vec<DictRecord> {
    records
        .into_iter()
        .zip(1..)
        .map(|(record, id)| record.with_id(id))
        .collect()
}

/// Wrap records as entries.
pub fn to_entries(records: Vec<DictRecord>) -> Vec<Entry> {
    records.into_iter().map(Entry::Record).collect()
}

/// An incoming source where about a quarter of the records changed value,
/// flipped status or are new, in random order.
pub fn churned(records: &[DictRecord], new_keys: usize) -> Vec<DictRecord> {
    let mut rng = rand::thread_rng();
    let mut incoming: Vec<DictRecord> = records
        .iter()
        .map(|r| {
            let mut next = DictRecord::new(r.category.clone(), r.key.clone(), r.value.clone());
            next.seq = r.seq;
            match rng.gen_range(0..8) {
                0 => next.value.push_str(" (new)"),
                1 => next = next.with_status(Status::Disabled),
                _ => {}
            }
            next
        })
        .collect();
    incoming.extend((0..new_keys).map(|k| DictRecord::new("cat_new", format!("key{k}"), "fresh")));
    incoming.shuffle(&mut rng);
    incoming
}
