//! Enum nodes, the published enum tree and its live cache.
//!
//! The tree has two parts:
//!
//! - an index from identity key to node, covering every tracked entry
//!   (aliased entries added through the live API included)
//! - per-category buckets listing, in insertion order, the identity keys
//!   that are visible to lookups
//!
//! Every key in a bucket is present in the index. Within a bucket keys are
//! unique, so no category ever lists two nodes with the same key and status.

use crate::entry::Entry;
use crate::flags::UpdateFlags;
use crate::record::Status;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Initial bucket capacity for a full rebuild.
const REBUILD_BUCKET_CAPACITY: usize = 10;
/// Initial bucket capacity for a live add.
const LIVE_BUCKET_CAPACITY: usize = 2;

/// Identity of a dictionary entry: category, key and status.
///
/// Enabled and disabled versions of the same key are different identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumKey {
    category: String,
    key: String,
    status: Status,
}

impl EnumKey {
    /// Creates an identity key.
    pub fn new(category: &str, key: &str, status: Status) -> Self {
        Self {
            category: category.to_string(),
            key: key.to_string(),
            status,
        }
    }

    /// Category part.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Key part.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Status part.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Same category and key under another status.
    #[must_use]
    pub fn with_status(&self, status: Status) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

impl std::fmt::Display for EnumKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.category, self.key, self.status)
    }
}

/// Lightweight display view of a dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumNode {
    /// Key within the category.
    pub key: String,
    /// Display value.
    #[serde(default)]
    pub value: String,
    /// Ordering within the category.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub seq: i64,
    /// Enabled or disabled.
    #[serde(default, skip_serializing_if = "is_enabled")]
    pub status: Status,
    /// Namespace of the key.
    pub category: String,
    /// Nested entries, for hierarchical enumerations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EnumNode>,
}

fn is_zero(seq: &i64) -> bool {
    *seq == 0
}

fn is_enabled(status: &Status) -> bool {
    *status == Status::Enabled
}

impl EnumNode {
    /// Creates an enabled node with no ordering.
    pub fn new(category: &str, key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            seq: 0,
            status: Status::Enabled,
            category: category.to_string(),
            children: Vec::new(),
        }
    }

    /// Sets the ordering.
    #[must_use]
    pub fn with_seq(mut self, seq: i64) -> Self {
        self.seq = seq;
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Replaces the children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<EnumNode>) -> Self {
        self.children = children;
        self
    }

    /// Identity key of the node.
    pub fn identity(&self) -> EnumKey {
        EnumKey::new(&self.category, &self.key, self.status)
    }

    /// Appends a child unless one with the same identity is present.
    pub fn append_child(&mut self, child: EnumNode) -> bool {
        let identity = child.identity();
        if self.children.iter().any(|c| c.identity() == identity) {
            return false;
        }
        self.children.push(child);
        true
    }

    /// Copies the flagged fields from `other`.
    pub fn merge(&mut self, other: &EnumNode, flags: UpdateFlags) {
        let flags = flags.fields();
        if flags.contains(UpdateFlags::VALUE) {
            self.value = other.value.clone();
        }
        if flags.contains(UpdateFlags::SEQ) {
            self.seq = other.seq;
        }
        if flags.contains(UpdateFlags::STATUS) {
            self.status = other.status;
        }
    }
}

/// Category to ordered, deduplicated node list, plus the live index.
#[derive(Debug, Clone, Default)]
pub struct EnumTree {
    nodes: HashMap<EnumKey, EnumNode>,
    buckets: HashMap<String, Vec<EnumKey>>,
}

impl EnumTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from entries in priority order.
    ///
    /// Aliased entries are skipped, and for each identity the first entry
    /// wins.
    pub fn build<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        let mut tree = Self::new();
        tree.extend(entries);
        tree
    }

    /// Appends entries with the rebuild rules of [`EnumTree::build`].
    pub fn extend<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        for entry in entries {
            if entry.is_alias() {
                continue;
            }
            let identity = entry.identity();
            if self.nodes.contains_key(&identity) {
                continue;
            }
            self.push_bucket(identity.clone(), REBUILD_BUCKET_CAPACITY);
            self.nodes.insert(identity, entry.to_node());
        }
    }

    /// Ordered nodes of a category, or `None` if the category is empty.
    pub fn get(&self, category: &str) -> Option<Vec<EnumNode>> {
        self.buckets.get(category).map(|keys| {
            keys.iter()
                .filter_map(|k| self.nodes.get(k))
                .cloned()
                .collect()
        })
    }

    /// Tracked node for an identity key, visible or not.
    pub fn lookup(&self, key: &EnumKey) -> Option<&EnumNode> {
        self.nodes.get(key)
    }

    /// Returns true if the identity key is tracked.
    pub fn contains(&self, key: &EnumKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Non-empty categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.buckets.keys().map(String::as_str).collect();
        categories.sort_unstable();
        categories
    }

    /// Number of non-empty categories.
    pub fn category_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of visible nodes across all categories.
    pub fn node_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Number of tracked identities, visible or not.
    pub fn tracked_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every category with its ordered nodes.
    pub fn to_map(&self) -> BTreeMap<String, Vec<EnumNode>> {
        self.buckets
            .keys()
            .filter_map(|c| self.get(c).map(|nodes| (c.clone(), nodes)))
            .collect()
    }

    /// Tracks an entry and shows it in its category unless it is an alias.
    ///
    /// Returns false if the identity was already tracked.
    pub fn add(&mut self, entry: &Entry) -> bool {
        let identity = entry.identity();
        if self.nodes.contains_key(&identity) {
            return false;
        }
        self.nodes.insert(identity.clone(), entry.to_node());
        if !entry.is_alias() {
            self.push_bucket(identity, LIVE_BUCKET_CAPACITY);
        }
        true
    }

    /// Applies a live update.
    ///
    /// The node is found under the entry's identity, or, when `flags`
    /// carries [`UpdateFlags::STATUS`], under the identity with the opposite
    /// status, in which case it is re-keyed. The flagged fields are merged
    /// first. Then, when `flags` carries [`UpdateFlags::MAPPING`], the node
    /// joins its bucket if the entry has no alias key and leaves it if it
    /// has one.
    ///
    /// Returns false if no node was found.
    pub fn update(&mut self, entry: &Entry, flags: UpdateFlags) -> bool {
        let new_key = entry.identity();
        let incoming = entry.to_node();

        if let Some(node) = self.nodes.get_mut(&new_key) {
            node.merge(&incoming, flags);
        } else if flags.contains(UpdateFlags::STATUS) {
            let old_key = new_key.with_status(new_key.status().flipped());
            let Some(mut node) = self.nodes.remove(&old_key) else {
                return false;
            };
            node.merge(&incoming, flags);
            self.nodes.insert(new_key.clone(), node);
            self.rename_in_bucket(&old_key, &new_key);
        } else {
            return false;
        }

        if flags.contains(UpdateFlags::MAPPING) {
            if entry.is_alias() {
                self.drop_from_bucket(&new_key);
            } else {
                self.push_bucket(new_key, LIVE_BUCKET_CAPACITY);
            }
        }
        true
    }

    /// Stops tracking an identity. Returns false if it was not tracked.
    pub fn remove(&mut self, key: &EnumKey) -> bool {
        if self.nodes.remove(key).is_none() {
            return false;
        }
        self.drop_from_bucket(key);
        true
    }

    fn push_bucket(&mut self, key: EnumKey, capacity: usize) -> bool {
        let bucket = self
            .buckets
            .entry(key.category().to_string())
            .or_insert_with(|| Vec::with_capacity(capacity));
        if bucket.contains(&key) {
            return false;
        }
        bucket.push(key);
        true
    }

    fn drop_from_bucket(&mut self, key: &EnumKey) {
        let Some(bucket) = self.buckets.get_mut(key.category()) else {
            return;
        };
        if let Some(idx) = bucket.iter().position(|k| k == key) {
            bucket.remove(idx);
        }
        if bucket.is_empty() {
            self.buckets.remove(key.category());
        }
    }

    fn rename_in_bucket(&mut self, old: &EnumKey, new: &EnumKey) {
        if let Some(bucket) = self.buckets.get_mut(old.category()) {
            if let Some(slot) = bucket.iter_mut().find(|k| *k == old) {
                *slot = new.clone();
            }
        }
    }
}

impl Serialize for EnumTree {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Shared, swappable enum tree.
///
/// Readers get an `Arc` snapshot and never see a half-applied change. A
/// rebuild swaps the whole tree; live updates copy the tree first if a
/// reader still holds the current snapshot.
#[derive(Debug, Default)]
pub struct EnumCache {
    tree: RwLock<Arc<EnumTree>>,
}

impl EnumCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current published tree.
    pub fn snapshot(&self) -> Arc<EnumTree> {
        Arc::clone(&self.tree.read())
    }

    /// Ordered nodes of a category.
    pub fn get(&self, category: &str) -> Option<Vec<EnumNode>> {
        self.tree.read().get(category)
    }

    /// Tracked node for an identity key.
    pub fn lookup(&self, key: &EnumKey) -> Option<EnumNode> {
        self.tree.read().lookup(key).cloned()
    }

    /// Publishes a freshly built tree.
    pub fn replace(&self, tree: EnumTree) {
        *self.tree.write() = Arc::new(tree);
    }

    /// Live add. See [`EnumTree::add`].
    pub fn add(&self, entry: &Entry) -> bool {
        let mut tree = self.tree.write();
        Arc::make_mut(&mut tree).add(entry)
    }

    /// Live update using the entry's own flags. See [`EnumTree::update`].
    pub fn update(&self, entry: &Entry) -> bool {
        self.update_with(entry, entry.update_flags())
    }

    /// Live update with explicit flags. See [`EnumTree::update`].
    pub fn update_with(&self, entry: &Entry, flags: UpdateFlags) -> bool {
        let mut tree = self.tree.write();
        Arc::make_mut(&mut tree).update(entry, flags)
    }

    /// Live remove. See [`EnumTree::remove`].
    pub fn remove(&self, key: &EnumKey) -> bool {
        let mut tree = self.tree.write();
        Arc::make_mut(&mut tree).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DictRecord;

    fn record(category: &str, key: &str, value: &str) -> DictRecord {
        DictRecord::new(category, key, value)
    }

    fn keys(tree: &EnumTree, category: &str) -> Vec<String> {
        tree.get(category)
            .unwrap_or_default()
            .iter()
            .map(|n| n.identity().to_string())
            .collect()
    }

    #[test]
    fn build_first_occurrence_wins() {
        let entries = vec![
            Entry::from(record("country", "cn", "China")),
            Entry::from(record("country", "cn", "PRC")),
            Entry::from(record("country", "us", "USA")),
        ];
        let tree = EnumTree::build(&entries);

        let nodes = tree.get("country").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].value, "China");
        assert_eq!(nodes[1].key, "us");
    }

    #[test]
    fn build_skips_aliases() {
        let entries = vec![
            Entry::from(record("currency", "usd", "Dollar").with_mapping_key("USD")),
            Entry::from(record("currency", "eur", "Euro")),
        ];
        let tree = EnumTree::build(&entries);

        assert_eq!(keys(&tree, "currency"), vec!["currency/eur/0"]);
        assert!(!tree.contains(&EnumKey::new("currency", "usd", Status::Enabled)));
    }

    #[test]
    fn build_keeps_enabled_and_disabled_apart() {
        let entries = vec![
            Entry::from(record("c", "k", "on")),
            Entry::from(record("c", "k", "off").with_status(Status::Disabled)),
        ];
        let tree = EnumTree::build(&entries);
        assert_eq!(keys(&tree, "c"), vec!["c/k/0", "c/k/1"]);
    }

    #[test]
    fn add_tracks_alias_without_showing_it() {
        let mut tree = EnumTree::new();
        let alias = Entry::from(record("c", "k", "v").with_mapping_key("K"));

        assert!(tree.add(&alias));
        assert!(tree.contains(&alias.identity()));
        assert!(tree.get("c").is_none());
        assert!(!tree.add(&alias));
    }

    #[test]
    fn add_appends_in_insertion_order() {
        let mut tree = EnumTree::new();
        tree.add(&Entry::from(record("c", "b", "")));
        tree.add(&Entry::from(record("c", "a", "")));
        assert_eq!(keys(&tree, "c"), vec!["c/b/0", "c/a/0"]);
    }

    #[test]
    fn update_merges_flagged_fields_only() {
        let mut tree = EnumTree::new();
        tree.add(&Entry::from(record("c", "k", "old").with_seq(1)));

        let patch = Entry::from(record("c", "k", "new").with_seq(9));
        assert!(tree.update(&patch, UpdateFlags::VALUE));

        let node = tree.lookup(&EnumKey::new("c", "k", Status::Enabled)).unwrap();
        assert_eq!(node.value, "new");
        assert_eq!(node.seq, 1);
    }

    #[test]
    fn update_status_rekeys() {
        let mut tree = EnumTree::new();
        tree.add(&Entry::from(record("c", "k", "v")));
        tree.add(&Entry::from(record("c", "other", "v")));

        let disabled = Entry::from(record("c", "k", "").with_status(Status::Disabled));
        assert!(tree.update(&disabled, UpdateFlags::STATUS));

        let old = EnumKey::new("c", "k", Status::Enabled);
        let new = EnumKey::new("c", "k", Status::Disabled);
        assert!(!tree.contains(&old));
        assert_eq!(tree.lookup(&new).unwrap().status, Status::Disabled);
        assert_eq!(tree.lookup(&new).unwrap().value, "v");
        assert_eq!(keys(&tree, "c"), vec!["c/k/1", "c/other/0"]);
    }

    #[test]
    fn update_without_status_bit_does_not_rekey() {
        let mut tree = EnumTree::new();
        tree.add(&Entry::from(record("c", "k", "v")));

        let disabled = Entry::from(record("c", "k", "x").with_status(Status::Disabled));
        assert!(!tree.update(&disabled, UpdateFlags::VALUE));
        assert_eq!(
            tree.lookup(&EnumKey::new("c", "k", Status::Enabled))
                .unwrap()
                .value,
            "v"
        );
    }

    #[test]
    fn update_missing_returns_false() {
        let mut tree = EnumTree::new();
        let entry = Entry::from(record("c", "k", "v"));
        assert!(!tree.update(&entry, UpdateFlags::all()));
        assert!(tree.is_empty());
    }

    #[test]
    fn update_mapping_set_hides_and_clear_shows() {
        let mut tree = EnumTree::new();
        tree.add(&Entry::from(record("c", "k", "v")));

        let aliased = Entry::from(record("c", "k", "").with_mapping_key("K"));
        assert!(tree.update(&aliased, UpdateFlags::MAPPING));
        assert!(tree.get("c").is_none());
        assert!(tree.contains(&aliased.identity()));

        let cleared = Entry::from(record("c", "k", ""));
        assert!(tree.update(&cleared, UpdateFlags::MAPPING));
        assert_eq!(keys(&tree, "c"), vec!["c/k/0"]);

        // Clearing twice does not duplicate the node.
        assert!(tree.update(&cleared, UpdateFlags::MAPPING));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn update_status_and_mapping_apply_in_order() {
        let mut tree = EnumTree::new();
        tree.add(&Entry::from(record("c", "k", "v")));

        // Disable and alias at once: re-key first, then leave the bucket
        // under the new identity.
        let entry = Entry::from(
            record("c", "k", "")
                .with_status(Status::Disabled)
                .with_mapping_key("K"),
        );
        assert!(tree.update(&entry, UpdateFlags::STATUS | UpdateFlags::MAPPING));

        let new = EnumKey::new("c", "k", Status::Disabled);
        assert_eq!(tree.lookup(&new).unwrap().status, Status::Disabled);
        assert!(!tree.contains(&EnumKey::new("c", "k", Status::Enabled)));
        assert!(tree.get("c").is_none());

        // Enable and clear the alias at once: re-key back and rejoin.
        let entry = Entry::from(record("c", "k", "").with_status(Status::Enabled));
        assert!(tree.update(&entry, UpdateFlags::STATUS | UpdateFlags::MAPPING));
        assert_eq!(keys(&tree, "c"), vec!["c/k/0"]);
        assert_eq!(tree.tracked_count(), 1);
    }

    #[test]
    fn remove_deletes_empty_bucket() {
        let mut tree = EnumTree::new();
        let a = Entry::from(record("c", "a", ""));
        let b = Entry::from(record("c", "b", ""));
        tree.add(&a);
        tree.add(&b);

        assert!(tree.remove(&a.identity()));
        assert_eq!(keys(&tree, "c"), vec!["c/b/0"]);
        assert!(tree.remove(&b.identity()));
        assert!(tree.get("c").is_none());
        assert_eq!(tree.category_count(), 0);
        assert!(!tree.remove(&b.identity()));
    }

    #[test]
    fn children_serialize_only_when_present() {
        let leaf = EnumNode::new("region", "sh", "Shanghai");
        assert!(serde_json::to_value(&leaf).unwrap().get("children").is_none());

        let parent = EnumNode::new("region", "cn", "China").with_children(vec![leaf.clone()]);
        let json = serde_json::to_value(&parent).unwrap();
        assert_eq!(json["children"][0]["key"], "sh");

        let back: EnumNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, parent);
        assert_eq!(back.children, vec![leaf]);
    }

    #[test]
    fn categories_are_sorted() {
        let tree = EnumTree::build(&[
            Entry::from(record("b", "k", "v")),
            Entry::from(record("a", "k", "v")),
            Entry::from(record("b", "k2", "v")),
        ]);
        assert_eq!(tree.categories(), vec!["a", "b"]);
        assert_eq!(tree.category_count(), 2);
        assert!(EnumTree::new().categories().is_empty());
    }

    #[test]
    fn append_child_dedupes() {
        let mut parent = EnumNode::new("region", "asia", "Asia");
        assert!(parent.append_child(EnumNode::new("country", "cn", "China")));
        assert!(!parent.append_child(EnumNode::new("country", "cn", "PRC")));
        assert_eq!(parent.children.len(), 1);
    }

    #[test]
    fn tree_serializes_as_category_map() {
        let entries = vec![Entry::from(record("c", "k", "v").with_seq(2))];
        let tree = EnumTree::build(&entries);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            serde_json::json!({"c": [{"key": "k", "value": "v", "seq": 2, "category": "c"}]})
        );
    }

    #[test]
    fn cache_snapshot_is_isolated_from_live_updates() {
        let cache = EnumCache::new();
        cache.replace(EnumTree::build(&[Entry::from(record("c", "k", "v"))]));

        let before = cache.snapshot();
        assert!(cache.add(&Entry::from(record("c", "k2", "v2"))));

        assert_eq!(before.node_count(), 1);
        assert_eq!(cache.get("c").unwrap().len(), 2);
    }

    #[test]
    fn cache_live_rekey() {
        let cache = EnumCache::new();
        let entry = Entry::from(record("c", "k", "v"));
        cache.add(&entry);

        let flipped = Entry::from(record("c", "k", "").with_status(Status::Disabled));
        assert!(cache.update(&flipped));

        assert!(cache.lookup(&flipped.identity()).is_some());
        assert!(cache.lookup(&entry.identity()).is_none());
        assert!(cache.remove(&flipped.identity()));
        assert!(cache.get("c").is_none());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        fn entry_strategy() -> impl Strategy<Value = Entry> {
            (
                "[a-b]",
                "[k-n]",
                "[A-C]{0,2}",
                any::<bool>(),
                prop::option::of("[k-n]"),
            )
                .prop_map(|(category, key, value, disabled, target)| {
                    let mut record = DictRecord::new(category, key, value);
                    if disabled {
                        record = record.with_status(Status::Disabled);
                    }
                    if let Some(target) = target {
                        record = record.with_mapping_key(target);
                    }
                    Entry::Record(record)
                })
        }

        proptest! {
            #[test]
            fn built_tree_is_unique_and_alias_free(
                entries in prop::collection::vec(entry_strategy(), 0..40)
            ) {
                let tree = EnumTree::build(&entries);
                let aliases: HashSet<EnumKey> = entries
                    .iter()
                    .filter(|e| e.is_alias())
                    .map(Entry::identity)
                    .collect();
                let plain: HashSet<EnumKey> = entries
                    .iter()
                    .filter(|e| !e.is_alias())
                    .map(Entry::identity)
                    .collect();

                for (_, nodes) in tree.to_map() {
                    let mut seen = HashSet::new();
                    for node in &nodes {
                        prop_assert!(seen.insert(node.identity()));
                        prop_assert!(plain.contains(&node.identity()));
                    }
                }
                prop_assert_eq!(tree.node_count(), plain.len());
                for key in aliases.difference(&plain) {
                    prop_assert!(!tree.contains(key));
                }
            }
        }
    }
}
