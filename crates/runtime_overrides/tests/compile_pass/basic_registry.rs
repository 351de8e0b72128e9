use std::sync::Arc;

use runtime_overrides::{DynamicValue, MemorySink, RuntimeOverrides, Slot, parse_json, update};

#[derive(RuntimeOverrides, Default)]
struct Live {
    autoschema_enabled: Slot<bool>,
    maximum_allowed_collections_count: Slot<i64>,
}

fn main() {
    let autoschema = Arc::new(DynamicValue::new(false));
    let live = Live {
        autoschema_enabled: Slot::from(&autoschema),
        ..Live::default()
    };

    let overlay: LiveOverlay = parse_json(br#"{"autoschema_enabled": true}"#).unwrap();
    update(&mut MemorySink::new(), &live, &overlay).unwrap();
    assert!(autoschema.get());
    assert_eq!(live.wired_count(), 1);
}
