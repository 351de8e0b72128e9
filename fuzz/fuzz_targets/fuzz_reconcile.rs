#![no_main]

use std::sync::Arc;
use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use runtime_overrides::server::{ServerRuntimeConfig, ServerRuntimeConfigOverlay};
use runtime_overrides::{DynamicValue, MemorySink, Slot, update};

#[derive(Debug, Arbitrary)]
struct Pass {
    count: Option<i64>,
    autoschema: Option<bool>,
    level: Option<String>,
    wait_ms: Option<u32>,
}

impl Pass {
    fn overlay(&self) -> ServerRuntimeConfigOverlay {
        ServerRuntimeConfigOverlay {
            maximum_allowed_collections_count: self.count,
            autoschema_enabled: self.autoschema,
            tenant_activity_read_log_level: self.level.clone(),
            replica_movement_minimum_async_wait: self
                .wait_ms
                .map(|ms| Duration::from_millis(u64::from(ms))),
            ..ServerRuntimeConfigOverlay::default()
        }
    }
}

fuzz_target!(|passes: Vec<Pass>| {
    let count = Arc::new(DynamicValue::new(7_i64));
    let level = Arc::new(DynamicValue::new("info".to_string()));
    let registry = ServerRuntimeConfig {
        maximum_allowed_collections_count: Slot::from(&count),
        tenant_activity_read_log_level: Slot::from(&level),
        replica_movement_minimum_async_wait: Slot::wired(Arc::default()),
        ..ServerRuntimeConfig::default()
    };

    for pass in &passes {
        let overlay = pass.overlay();
        update(&mut MemorySink::new(), &registry, &overlay).unwrap();

        assert_eq!(count.get(), pass.count.unwrap_or(7));
        assert_eq!(level.get(), pass.level.clone().unwrap_or_else(|| "info".to_string()));

        // A second pass with the same overlay is a no-op
        let again = update(&mut MemorySink::new(), &registry, &overlay).unwrap();
        assert!(again.is_empty());
    }
});
