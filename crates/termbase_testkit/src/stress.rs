//! Stress runs for the published caches.
//!
//! Readers take snapshots while a writer applies live updates, checking
//! that no snapshot ever shows two nodes with the same identity in one
//! category.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use termbase_core::{DictRecord, EnumCache, EnumTree, Entry, Status, UpdateFlags};

/// Result of a stress run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Live mutations applied by the writer.
    pub writes: usize,
    /// Snapshots taken by readers.
    pub reads: usize,
    /// Snapshots that broke identity uniqueness.
    pub violations: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Writes: {}", self.writes);
        println!("Reads: {}", self.reads);
        println!("Violations: {}", self.violations);
        println!("Duration: {:?}", self.duration);
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of live mutations the writer performs.
    pub operations: usize,
    /// Number of reader threads.
    pub readers: usize,
    /// Number of categories.
    pub categories: usize,
    /// Keys per category.
    pub keys: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 2_000,
            readers: 4,
            categories: 4,
            keys: 16,
        }
    }
}

fn seed(config: &StressConfig) -> EnumTree {
    let entries: Vec<Entry> = (0..config.categories)
        .flat_map(|c| {
            (0..config.keys).map(move |k| {
                Entry::Record(DictRecord::new(format!("c{c}"), format!("k{k}"), format!("v{k}")))
            })
        })
        .collect();
    EnumTree::build(&entries)
}

/// Returns true if no category lists the same key and status twice.
pub fn is_unique(tree: &EnumTree) -> bool {
    tree.to_map().values().all(|nodes| {
        let mut seen = HashSet::new();
        nodes.iter().all(|n| seen.insert(n.identity()))
    })
}

/// Toggles statuses and values on a shared cache while readers check
/// every snapshot.
pub fn run_status_churn(config: &StressConfig) -> StressTestResult {
    let cache = Arc::new(EnumCache::new());
    cache.replace(seed(config));

    let done = Arc::new(AtomicBool::new(false));
    let reads = Arc::new(AtomicUsize::new(0));
    let violations = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.readers)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let done = Arc::clone(&done);
            let reads = Arc::clone(&reads);
            let violations = Arc::clone(&violations);
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    if !is_unique(&cache.snapshot()) {
                        violations.fetch_add(1, Ordering::Relaxed);
                    }
                    reads.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    let mut statuses = vec![Status::Enabled; config.categories * config.keys];
    for op in 0..config.operations {
        let slot = op % statuses.len();
        let (c, k) = (slot / config.keys, slot % config.keys);
        statuses[slot] = statuses[slot].flipped();
        let entry = Entry::Record(
            DictRecord::new(format!("c{c}"), format!("k{k}"), format!("v{op}"))
                .with_status(statuses[slot]),
        );
        cache.update_with(&entry, UpdateFlags::VALUE | UpdateFlags::STATUS);
    }

    done.store(true, Ordering::Relaxed);
    for handle in handles {
        handle.join().expect("reader thread panicked");
    }

    StressTestResult {
        writes: config.operations,
        reads: reads.load(Ordering::Relaxed),
        violations: violations.load(Ordering::Relaxed),
        duration: start.elapsed(),
    }
}
