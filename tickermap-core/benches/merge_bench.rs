//! Criterion benchmarks for the reconciliation hot paths.
//!
//! Benchmarks:
//! 1. Merge-and-fill of a sparse candidate into a full map
//! 2. Forward + reverse pivot
//! 3. Duplicate detection

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tickermap_core::{find_duplicates, Candidate, Field, KeyScheme, TickerMap, TickerRecord};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_map(n: usize) -> TickerMap {
    TickerMap::from_records((0..n).map(|i| {
        let mut r = TickerRecord::new(format!("T{i:05} US"))
            .with(Field::LegacyTicker, format!("T{i:05}"))
            .with(Field::EodhdTicker, format!("T{i:05}.US"));
        if i % 2 == 0 {
            r = r.with(Field::Country, "US");
        }
        r
    }))
    .unwrap()
}

fn make_candidate(n: usize) -> Candidate {
    let mut c = Candidate::new(KeyScheme::Bloomberg);
    for i in 0..n {
        let key = format!("T{i:05} US");
        c.insert(&key, Field::Country, "US");
        c.insert(&key, Field::Sector, "Technology");
    }
    c
}

fn bench_merge_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_fill");
    for n in [1_000usize, 10_000] {
        let map = make_map(n);
        let candidate = make_candidate(n + n / 10);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut m = map.clone();
                m.merge_fill(black_box(&candidate)).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_pivot(c: &mut Criterion) {
    let map = make_map(10_000);
    c.bench_function("pivot_round_trip_10k", |b| {
        b.iter(|| {
            black_box(map.clone())
                .pivot(KeyScheme::Eodhd)
                .unwrap()
                .pivot(KeyScheme::Bloomberg)
                .unwrap()
        });
    });
}

fn bench_duplicates(c: &mut Criterion) {
    let map = make_map(10_000);
    c.bench_function("find_duplicates_10k", |b| {
        b.iter(|| find_duplicates(black_box(&map)));
    });
}

criterion_group!(benches, bench_merge_fill, bench_pivot, bench_duplicates);
criterion_main!(benches);
