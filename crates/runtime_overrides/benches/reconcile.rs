//! Performance benchmarks for live reads, parsing and reconciliation.
//!
//! Run with: `cargo bench -p runtime_overrides`

#![allow(clippy::pedantic)]

use std::sync::Arc;
use std::time::Duration;

use runtime_overrides::server::{ServerRuntimeConfig, ServerRuntimeConfigOverlay};
use runtime_overrides::{DynamicValue, MemorySink, Slot, parse_json, parse_yaml, update};

fn main() {
    divan::main();
}

const FULL_YAML: &str = "maximum_allowed_collections_count: 13
autoschema_enabled: true
async_replication_disabled: false
tenant_activity_read_log_level: debug
tenant_activity_write_log_level: info
revectorize_check_disabled: true
replica_movement_minimum_async_wait: 1m 30s
";

const FULL_JSON: &str = r#"{
    "maximum_allowed_collections_count": 13,
    "autoschema_enabled": true,
    "async_replication_disabled": false,
    "tenant_activity_read_log_level": "debug",
    "tenant_activity_write_log_level": "info",
    "revectorize_check_disabled": true,
    "replica_movement_minimum_async_wait": "1m 30s"
}"#;

fn wired_registry() -> ServerRuntimeConfig {
    ServerRuntimeConfig {
        maximum_allowed_collections_count: Slot::wired(Arc::new(DynamicValue::new(7))),
        autoschema_enabled: Slot::wired(Arc::default()),
        async_replication_disabled: Slot::wired(Arc::default()),
        tenant_activity_read_log_level: Slot::wired(Arc::new(DynamicValue::new(
            "info".to_string(),
        ))),
        tenant_activity_write_log_level: Slot::wired(Arc::default()),
        revectorize_check_disabled: Slot::wired(Arc::default()),
        replica_movement_minimum_async_wait: Slot::wired(Arc::new(DynamicValue::new(
            Duration::from_secs(60),
        ))),
    }
}

// ============================================================================
// Reads
// ============================================================================

#[divan::bench]
fn get_bool(bencher: divan::Bencher) {
    let cell = DynamicValue::new(true);
    bencher.bench(|| divan::black_box(&cell).get());
}

#[divan::bench]
fn get_string(bencher: divan::Bencher) {
    let cell = DynamicValue::new("info".to_string());
    bencher.bench(|| divan::black_box(&cell).get());
}

#[divan::bench]
fn read_string_len(bencher: divan::Bencher) {
    let cell = DynamicValue::new("info".to_string());
    bencher.bench(|| divan::black_box(&cell).read(String::len));
}

#[divan::bench(threads = [1, 4, 8])]
fn get_contended(bencher: divan::Bencher) {
    let cell = Arc::new(DynamicValue::new(42_i64));
    bencher.bench(|| divan::black_box(&cell).get());
}

// ============================================================================
// Parsing
// ============================================================================

#[divan::bench]
fn parse_full_yaml() -> ServerRuntimeConfigOverlay {
    parse_yaml(divan::black_box(FULL_YAML.as_bytes())).unwrap()
}

#[divan::bench]
fn parse_full_json() -> ServerRuntimeConfigOverlay {
    parse_json(divan::black_box(FULL_JSON.as_bytes())).unwrap()
}

// ============================================================================
// Reconciliation
// ============================================================================

#[divan::bench]
fn update_no_changes(bencher: divan::Bencher) {
    let registry = wired_registry();
    let overlay: ServerRuntimeConfigOverlay = parse_yaml(FULL_YAML.as_bytes()).unwrap();
    update(&mut MemorySink::new(), &registry, &overlay).unwrap();

    bencher.bench(|| update(&mut MemorySink::new(), &registry, divan::black_box(&overlay)));
}

#[divan::bench]
fn update_flip_all(bencher: divan::Bencher) {
    let registry = wired_registry();
    let full: ServerRuntimeConfigOverlay = parse_yaml(FULL_YAML.as_bytes()).unwrap();
    let empty = ServerRuntimeConfigOverlay::default();
    let mut sink = MemorySink::new();

    bencher.bench_local(|| {
        update(&mut sink, &registry, &full).unwrap();
        update(&mut sink, &registry, &empty).unwrap();
        sink.drain().len()
    });
}
