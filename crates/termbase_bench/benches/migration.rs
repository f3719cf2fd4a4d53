//! Migration diff benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use termbase_bench::{churned, generate_records, persisted, to_entries};
use termbase_core::Catalog;

/// Benchmark diffing an authoritative source against the catalog.
fn bench_migrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("migrate");

    for keys in [100, 1000, 5000].iter() {
        let catalog = to_entries(persisted(generate_records(10, *keys / 10)));
        let records: Vec<_> = catalog.iter().filter_map(|e| e.as_record().cloned()).collect();
        let incoming = to_entries(churned(&records, *keys / 20));

        group.throughput(Throughput::Elements(incoming.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(keys),
            &(catalog, incoming),
            |b, (catalog, incoming)| {
                b.iter(|| {
                    let mut working = Catalog::from_entries(catalog);
                    black_box(working.migrate(incoming))
                });
            },
        );
    }
    group.finish();
}

/// Benchmark building the mapping table from the working catalog.
fn bench_mapping_table(c: &mut Criterion) {
    let catalog = Catalog::from_entries(&to_entries(persisted(generate_records(20, 500))));
    c.bench_function("mapping_table", |b| {
        b.iter(|| black_box(catalog.mapping_table()));
    });
}

criterion_group!(benches, bench_migrate, bench_mapping_table);
criterion_main!(benches);
