//! Criterion benchmarks for PriceLens hot paths.
//!
//! Benchmarks:
//! 1. Full view pipeline (filter → normalize → smooth)
//! 2. Individual transforms on a ten-year daily table
//! 3. Trailing performance over the canonical windows

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pricelens_core::transform::{
    filter_window, normalize_to_instrument, normalize_to_reference_point, smooth,
};
use pricelens_core::window::CANONICAL_WINDOWS;
use pricelens_core::{build_view, compute_performance, BaselinePolicy, PriceTable, ViewConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_table(rows: usize, width: usize) -> PriceTable {
    let base = NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
    let index = (0..rows).map(|i| base + Duration::days(i as i64)).collect();
    let instruments = (0..width).map(|j| format!("SYM{j:03}")).collect();
    let columns = (0..width)
        .map(|j| {
            (0..rows)
                .map(|i| {
                    // sprinkle gaps
                    if (i + j) % 97 == 0 {
                        None
                    } else {
                        Some(100.0 + (i as f64 * 0.01 + j as f64).sin() * 10.0)
                    }
                })
                .collect()
        })
        .collect();
    PriceTable::new(index, instruments, columns).unwrap()
}

// ── 1. View pipeline ─────────────────────────────────────────────────

fn bench_view_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_pipeline");
    let table = make_table(3650, 20);

    for window in ["1 Months", "1 Years", "5 Years"] {
        let config = ViewConfig {
            window: window.into(),
            reference_instrument: Some("SYM000".into()),
            smoothing_window: Some(5),
            ..ViewConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(window), &config, |b, config| {
            b.iter(|| build_view(black_box(&table), config).unwrap())
        });
    }

    group.finish();
}

// ── 2. Transforms ────────────────────────────────────────────────────

fn bench_transforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("transforms");
    let table = make_table(3650, 20);

    group.bench_function("filter_1_years", |b| {
        b.iter(|| filter_window(black_box(&table), "1 Years"))
    });
    group.bench_function("normalize_first_week", |b| {
        b.iter(|| normalize_to_reference_point(black_box(&table), BaselinePolicy::FirstWeek))
    });
    group.bench_function("normalize_to_instrument", |b| {
        b.iter(|| normalize_to_instrument(black_box(&table), "SYM000").unwrap())
    });
    for k in [5usize, 50] {
        group.bench_with_input(BenchmarkId::new("smooth", k), &k, |b, &k| {
            b.iter(|| smooth(black_box(&table), k).unwrap())
        });
    }

    group.finish();
}

// ── 3. Performance ───────────────────────────────────────────────────

fn bench_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("performance");

    for width in [10usize, 100] {
        let table = make_table(3650, width);
        group.bench_with_input(BenchmarkId::new("canonical", width), &table, |b, table| {
            b.iter(|| compute_performance(black_box(table), &CANONICAL_WINDOWS))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_view_pipeline,
    bench_transforms,
    bench_performance,
);
criterion_main!(benches);
