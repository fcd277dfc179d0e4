//! # Name Index Benchmarks
//!
//! Autocomplete runs on every keystroke, so lookups must stay fast while the
//! roster grows and identities churn.
//!
//! | Operation | Target |
//! |-----------|--------|
//! | `find` one-letter prefix, 20 results | < 50µs |
//! | `find` full-name prefix | < 5µs |
//! | `replace` (rename) | < 20µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use shared_types::Identity;
use std::time::Duration;
use tq_01_name_index::{identity_fragments, PrefixIndex};

const SYLLABLES: &[&str] = &[
    "an", "be", "ca", "do", "el", "fi", "ga", "ho", "is", "ja", "ke", "lu", "ma", "no", "or",
    "pa", "ri", "sa", "ta", "ve",
];

fn random_name(rng: &mut impl Rng) -> String {
    let parts = rng.gen_range(2..=4);
    (0..parts)
        .map(|_| SYLLABLES[rng.gen_range(0..SYLLABLES.len())])
        .collect()
}

fn roster(size: i64) -> Vec<Identity> {
    let mut rng = rand::thread_rng();
    (0..size)
        .map(|id| {
            let first = random_name(&mut rng);
            let last = random_name(&mut rng);
            Identity::new(id, [format!("{first}{id}"), first, last])
        })
        .collect()
}

fn seeded(identities: &[Identity]) -> PrefixIndex {
    let index = PrefixIndex::new();
    for identity in identities {
        index.add_all(identity_fragments(identity), identity.id);
    }
    index
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("name-index-find");
    group.measurement_time(Duration::from_secs(5));

    for size in [1_000_i64, 10_000, 50_000] {
        let identities = roster(size);
        let index = seeded(&identities);
        let full = identities[identities.len() / 2].names[1].to_lowercase();

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("one_letter", size), &index, |b, index| {
            b.iter(|| black_box(index.find(black_box("m"), 20)))
        });
        group.bench_with_input(BenchmarkId::new("full_name", size), &index, |b, index| {
            b.iter(|| black_box(index.find(black_box(&full), 20)))
        });
    }

    group.finish();
}

fn bench_seed(c: &mut Criterion) {
    let mut group = c.benchmark_group("name-index-seed");
    group.sample_size(10);

    for size in [1_000_i64, 10_000] {
        let identities = roster(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &identities, |b, ids| {
            b.iter(|| black_box(seeded(ids).len()))
        });
    }

    group.finish();
}

fn bench_rename(c: &mut Criterion) {
    let identities = roster(10_000);
    let index = seeded(&identities);
    let original = identities[0].clone();
    let renamed = Identity::new(original.id, ["renamed0", "Someone", "Else"]);

    c.bench_function("name-index-rename", |b| {
        b.iter(|| {
            index.replace(
                identity_fragments(&original),
                identity_fragments(&renamed),
                original.id,
            );
            index.replace(
                identity_fragments(&renamed),
                identity_fragments(&original),
                original.id,
            );
        })
    });
}

criterion_group!(benches, bench_find, bench_seed, bench_rename);
criterion_main!(benches);
