//! End-to-end reconciliation passes against an instrumented store.

use proptest::prelude::*;
use std::sync::Arc;
use termbase_core::backup;
use termbase_core::{
    Catalog, CoreError, Dictionary, ErrorKind, JsonFileSource, RecordPatch, CATALOG_TABLE,
};
use termbase_store::{Connection, FileStore, StoreRegistry};
use termbase_testkit::prelude::*;

const BOTH: u8 = 3;

fn keys(nodes: &[EnumNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.key.as_str()).collect()
}

fn migration(records: Vec<DictRecord>) -> Box<dyn termbase_core::Source> {
    StaticSource::records("m", records).boxed()
}

#[test]
fn second_pass_with_unchanged_sources_writes_nothing() {
    let harness = TestDictionary::new();
    let config = harness.config_with(BOTH, &[("m", SourceKind::Migration)]);
    let input = || {
        vec![
            record("c", "a", "A"),
            record("c", "b", "B").with_seq(2),
            alias("c", "x", "a"),
            disabled("c", "gone", "G"),
        ]
    };

    let first = harness.reload(&config, vec![migration(input())]).unwrap();
    assert_eq!(first.creates, 3);
    assert_eq!(first.batches, 1);

    harness.store.reset_counts();
    let second = harness.reload(&config, vec![migration(input())]).unwrap();
    assert_eq!(second.updates, 0);
    assert_eq!(second.creates, 0);
    assert_eq!(second.batches, 0);
    assert_eq!(harness.store.batch_calls(), 0);
}

#[test]
fn aliases_map_but_never_show() {
    let harness = TestDictionary::with_catalog(vec![
        record("c", "a", "A").with_id(1),
        alias("c", "x", "a").with_id(2),
    ]);
    let config = harness.config_with(BOTH, &[("r", SourceKind::Remote)]);
    let remote = StaticSource::new(
        "r",
        vec![
            Entry::Node(node("c", "n", "N")),
            Entry::Record(alias("c", "y", "a")),
            Entry::Record(alias("c", "x", "n")),
        ],
    );

    harness.reload(&config, vec![remote.boxed()]).unwrap();

    assert_eq!(keys(&harness.get_enum("c").unwrap()), vec!["n", "a"]);
    assert!(harness.enums().lookup(&EnumKey::new("c", "x", Status::Enabled)).is_none());
    assert!(harness.enums().lookup(&EnumKey::new("c", "y", Status::Enabled)).is_none());
    // the catalog alias wins over the remote one
    assert_eq!(harness.mapping_key("c", "x"), "a");
    assert_eq!(harness.mapping_key("c", "y"), "a");
    assert_eq!(harness.mapping_key("c", "a"), "");
}

#[test]
fn enabled_and_disabled_are_separate_identities() {
    let harness = TestDictionary::with_catalog(vec![
        record("c", "k", "on").with_id(1),
        disabled("c", "k", "off").with_id(2),
    ]);
    let config = harness.config_with(BOTH, &[("m", SourceKind::Migration)]);

    let report = harness
        .reload(&config, vec![migration(vec![record("c", "k", "on2")])])
        .unwrap();
    assert_eq!(report.updates, 1);
    assert_eq!(report.creates, 0);

    let catalog = harness.store.catalog();
    assert_eq!(catalog[0].value, "on2");
    assert_eq!(catalog[1].value, "off");

    let nodes = harness.get_enum("c").unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].status, Status::Enabled);
    assert_eq!(nodes[1].status, Status::Disabled);
}

#[test]
fn update_payload_carries_only_changed_fields() {
    let persisted = record("c", "k", "A")
        .with_id(1)
        .with_seq(1)
        .with_status(Status::Enabled);
    let incoming = record("c", "k", "A").with_seq(2).with_status(Status::Enabled);

    let mut catalog = Catalog::from_entries(&entries(vec![persisted.clone()]));
    let batch = catalog.migrate(&entries(vec![incoming.clone()]));
    let mut expected = RecordPatch::new(1);
    expected.seq = Some(2);
    assert_eq!(batch.updates, vec![expected]);
    assert!(batch.creates.is_empty());

    let harness = TestDictionary::with_catalog(vec![persisted]);
    let config = harness.config_with(1, &[("m", SourceKind::Migration)]);
    harness.reload(&config, vec![migration(vec![incoming])]).unwrap();
    assert_eq!(harness.store.update_calls(), 1);
    assert_eq!(harness.store.catalog()[0].seq, Some(2));
}

#[test]
fn enabled_source_promotes_disabled_record() {
    let persisted = disabled("X", "k1", "old").with_id(7);
    let incoming = record("X", "k1", "new").with_status(Status::Enabled);

    let mut catalog = Catalog::from_entries(&entries(vec![persisted.clone()]));
    let batch = catalog.migrate(&entries(vec![incoming.clone()]));
    assert_eq!(batch.updates.len(), 1);
    assert_eq!(batch.updates[0].id, 7);
    assert_eq!(batch.updates[0].status, Some(Status::Enabled));

    let harness = TestDictionary::with_catalog(vec![persisted]);
    let config = harness.config_with(BOTH, &[("m", SourceKind::Migration)]);
    let report = harness.reload(&config, vec![migration(vec![incoming])]).unwrap();
    assert_eq!(report.updates, 1);
    assert_eq!(report.creates, 0);

    let nodes = harness.get_enum("X").unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].key, "k1");
    assert_eq!(nodes[0].status, Status::Enabled);
    assert_eq!(nodes[0].value, "new");

    let stored = &harness.store.catalog()[0];
    assert_eq!(stored.id, 7);
    assert_eq!(stored.status(), Status::Enabled);
}

#[test]
fn unmatched_enabled_record_is_created_and_shown() {
    let harness = TestDictionary::new();
    let config = harness.config_with(BOTH, &[("m", SourceKind::Migration)]);

    let report = harness
        .reload(&config, vec![migration(vec![record("Y", "k2", "").with_status(Status::Enabled)])])
        .unwrap();
    assert_eq!(report.creates, 1);
    assert_eq!(harness.store.create_calls(), 1);
    assert_eq!(harness.store.update_calls(), 0);

    let stored = harness.store.catalog();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].is_persisted());
    assert!(stored[0].create_time.is_some());

    assert_eq!(keys(&harness.get_enum("Y").unwrap()), vec!["k2"]);
}

#[test]
fn later_migration_source_sees_earlier_creates() {
    let harness = TestDictionary::new();
    let config = harness.config_with(
        BOTH,
        &[("m1", SourceKind::Migration), ("m2", SourceKind::Migration)],
    );

    let report = harness
        .reload(
            &config,
            vec![
                StaticSource::records("m1", vec![record("c", "a", "A")]).boxed(),
                StaticSource::records("m2", vec![record("c", "a", "B")]).boxed(),
            ],
        )
        .unwrap();

    assert_eq!(report.creates, 1);
    assert_eq!(report.updates, 1);
    assert_eq!(report.batches, 2);
    assert_eq!(harness.store.catalog()[0].value, "B");
    assert_eq!(harness.get_enum("c").unwrap()[0].value, "B");
}

#[test]
fn backup_files_round_trip() {
    let harness = TestDictionary::new();
    let config = harness
        .config_with(2, &[("r", SourceKind::Remote)])
        .backup(true);
    let values = vec![
        Entry::Node(node("c", "n", "N").with_seq(3)),
        Entry::Record(disabled("c", "d", "D").with_id(4)),
        Entry::Record(alias("c", "x", "n")),
    ];

    harness
        .reload(&config, vec![StaticSource::new("r", values.clone()).boxed()])
        .unwrap();

    let restored: Vec<Entry> = backup::load_file(harness.dict_path(), "r.json").unwrap();
    assert_eq!(restored, values);
}

#[test]
fn live_status_update_rekeys() {
    let dict = Dictionary::new(Arc::new(StoreRegistry::new()));
    assert!(dict.add_enum(&Entry::Record(record("c", "a", "A"))));

    let flipped = Entry::Record(record("c", "a", "").with_status(Status::Disabled));
    assert!(dict.update_enum(&flipped, UpdateFlags::STATUS));

    assert!(dict.enums().lookup(&EnumKey::new("c", "a", Status::Disabled)).is_some());
    assert!(dict.enums().lookup(&EnumKey::new("c", "a", Status::Enabled)).is_none());
    let nodes = dict.get_enum("c").unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].value, "A");
}

#[test]
fn persistence_failure_keeps_published_snapshots() {
    let harness = TestDictionary::with_catalog(vec![
        record("c", "a", "A").with_id(1),
        alias("c", "x", "a").with_id(2),
    ]);
    let config = harness.config_with(BOTH, &[("m", SourceKind::Migration)]);
    harness.reload(&config, vec![migration(vec![])]).unwrap();
    let enums = harness.enums().snapshot();
    let mappings = harness.mappings().snapshot();

    harness.store.fail_creates(true);
    let err = harness
        .reload(&config, vec![migration(vec![record("c", "new", "N")])])
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert!(Arc::ptr_eq(&enums, &harness.enums().snapshot()));
    assert!(Arc::ptr_eq(&mappings, &harness.mappings().snapshot()));
    assert_eq!(harness.store.catalog().len(), 2);
}

#[test]
fn failed_update_batch_skips_creates() {
    let harness = TestDictionary::with_catalog(vec![record("c", "a", "A").with_id(1)]);
    let config = harness.config_with(BOTH, &[("m", SourceKind::Migration)]);
    harness.store.fail_updates(true);

    let err = harness
        .reload(
            &config,
            vec![migration(vec![record("c", "a", "B"), record("c", "b", "B")])],
        )
        .unwrap_err();

    assert!(matches!(err, CoreError::Persistence { .. }));
    assert_eq!(harness.store.update_calls(), 1);
    assert_eq!(harness.store.create_calls(), 0);
}

#[test]
fn load_failure_aborts_pass() {
    let harness = TestDictionary::with_catalog(vec![record("c", "a", "A").with_id(1)]);
    let config = harness.config_with(
        BOTH,
        &[("ok", SourceKind::Remote), ("bad", SourceKind::Local)],
    );
    let before = harness.enums().snapshot();

    let err = harness
        .reload(
            &config,
            vec![
                StaticSource::new("ok", vec![Entry::Node(node("c", "n", "N"))]).boxed(),
                StaticSource::failing("bad", "connection refused").boxed(),
            ],
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Load);
    assert!(err.to_string().contains("connection refused"));
    assert!(Arc::ptr_eq(&before, &harness.enums().snapshot()));
    assert_eq!(harness.store.batch_calls(), 0);
}

#[test]
fn registration_errors() {
    let harness = TestDictionary::new();

    let config = harness.config_with(BOTH, &[("a", SourceKind::Remote)]);
    let err = harness
        .reload(
            &config,
            vec![
                StaticSource::new("a", vec![]).boxed(),
                StaticSource::new("a", vec![]).boxed(),
            ],
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateSource { ref name } if name == "a"));

    let config = harness.config_with(BOTH, &[("z", SourceKind::Remote)]);
    let err = harness.reload(&config, vec![]).unwrap_err();
    assert!(matches!(err, CoreError::UnknownSource { ref name } if name == "z"));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn invalid_action_is_rejected() {
    let harness = TestDictionary::new();
    for bits in [0u8, 4, 7] {
        let err = harness.reload(&harness.config(bits), vec![]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAction { bits: b } if b == bits));
    }
}

#[test]
fn missing_catalog_store_is_a_configuration_error() {
    let harness = TestDictionary::new();
    let config = harness.config(BOTH).db_name("elsewhere");
    let err = harness.reload(&config, vec![]).unwrap_err();
    assert!(matches!(err, CoreError::StoreNotFound { ref name } if name == "elsewhere"));
}

#[test]
fn first_display_source_wins() {
    let harness = TestDictionary::with_catalog(vec![record("c", "a", "catalog").with_id(1)]);
    let config = harness.config_with(2, &[("r1", SourceKind::Remote), ("r2", SourceKind::Local)]);

    harness
        .reload(
            &config,
            vec![
                StaticSource::new("r2", vec![Entry::Node(node("c", "a", "second"))]).boxed(),
                StaticSource::new("r1", vec![Entry::Node(node("c", "a", "first"))]).boxed(),
            ],
        )
        .unwrap();

    let nodes = harness.get_enum("c").unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].value, "first");
}

#[test]
fn enum_only_pass_leaves_store_and_mappings_alone() {
    let harness = TestDictionary::with_catalog(vec![alias("c", "x", "a").with_id(1)]);
    let config = harness.config_with(2, &[("m", SourceKind::Migration)]);

    let report = harness
        .reload(&config, vec![migration(vec![record("c", "new", "N")])])
        .unwrap();

    assert_eq!(report.mapping_entries, None);
    assert_eq!(report.enum_nodes, Some(0));
    assert_eq!(harness.store.batch_calls(), 0);
    assert_eq!(harness.mapping_key("c", "x"), "");
    assert!(harness.get_enum("c").is_none());
}

#[test]
fn file_backed_pass() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open_with_create_dirs(&dir.path().join("main")).unwrap());
    let stores = Arc::new(StoreRegistry::new());
    stores.register("main", Arc::clone(&store) as Arc<dyn Connection>);

    let seed = entries(vec![record("lang", "en", "English"), alias("lang", "eng", "en")]);
    backup::save_file(&seed, dir.path(), "seed.json").unwrap();

    let config = DictConfig::new()
        .db_name("main")
        .dict_path(dir.path())
        .action(3)
        .source(
            "seed",
            SourceConfig::new(SourceKind::Migration)
                .with_param("path", dir.path().join("seed.json").display().to_string()),
        );
    let source = JsonFileSource::new("seed", dir.path().join("unused.json"));

    let dict = Dictionary::open(Arc::clone(&stores), &config, vec![Box::new(source)]).unwrap();

    assert_eq!(store.find_all(CATALOG_TABLE).unwrap().len(), 2);
    assert_eq!(keys(&dict.get_enum("lang").unwrap()), vec!["en"]);
    assert_eq!(dict.mapping_key("lang", "eng"), "en");
}

fn is_published_unique(dict: &Dictionary) -> bool {
    is_unique(&dict.enums().snapshot())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn published_tree_is_unique_and_aliases_are_mapped(
        catalog in catalog_strategy(12),
        authoritative in entries_strategy(12),
        remote in entries_strategy(12),
        local in entries_strategy(12),
    ) {
        let harness = TestDictionary::with_catalog(catalog);
        let config = harness.config_with(
            BOTH,
            &[("m", SourceKind::Migration), ("r", SourceKind::Remote), ("l", SourceKind::Local)],
        );
        harness.reload(&config, vec![
            StaticSource::new("m", authoritative).boxed(),
            StaticSource::new("r", remote).boxed(),
            StaticSource::new("l", local).boxed(),
        ]).unwrap();

        prop_assert!(is_published_unique(&harness));
        for stored in harness.store.catalog().iter().filter(|r| r.is_alias()) {
            prop_assert!(!harness.mapping_key(&stored.category, &stored.key).is_empty());
        }
    }
}
