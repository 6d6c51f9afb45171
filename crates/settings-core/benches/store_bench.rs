//! Criterion benchmarks for the settings store and file codec.
//!
//! Run with:
//! ```bash
//! cargo bench --package settings-core --bench store_bench
//! ```

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use settings_core::{decode_settings, encode_settings, SettingValue, SettingsStore};

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn make_map(entries: usize) -> BTreeMap<String, SettingValue> {
    (0..entries)
        .map(|i| {
            let value = match i % 3 {
                0 => SettingValue::from(format!("value-{i}")),
                1 => SettingValue::from(i as i32),
                _ => SettingValue::from(i % 2 == 0),
            };
            (format!("key.{i:05}"), value)
        })
        .collect()
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    for entries in [16usize, 256, 4096] {
        let map = make_map(entries);
        let bytes = encode_settings(&map).expect("encode");

        group.bench_with_input(BenchmarkId::new("encode", entries), &map, |b, map| {
            b.iter(|| encode_settings(black_box(map)).expect("encode"))
        });
        group.bench_with_input(BenchmarkId::new("decode", entries), &bytes, |b, bytes| {
            b.iter(|| decode_settings(black_box(bytes)).expect("decode"))
        });
    }
    group.finish();
}

fn bench_get_set(c: &mut Criterion) {
    let mut store = SettingsStore::new(make_map(256), "bench").expect("store");

    c.bench_function("store_get_i32", |b| {
        b.iter(|| store.get::<i32>(black_box("key.00001")).expect("get"))
    });
    c.bench_function("store_set_text", |b| {
        b.iter(|| {
            store
                .set(black_box("key.00000"), "updated".to_string())
                .expect("set")
        })
    });
}

criterion_group!(benches, bench_codec, bench_get_set);
criterion_main!(benches);
