use std::time::Duration;

use runtime_overrides::{Overlay, RuntimeOverrides, Slot};

#[derive(RuntimeOverrides, Default)]
#[overrides(overlay = "ReplicationPatch")]
pub struct Replication {
    #[overrides(key = "min_async_wait", label = "MinAsyncWait")]
    replica_movement_minimum_async_wait: Slot<Duration>,

    #[overrides(label = "AsyncOff")]
    async_replication_disabled: Slot<bool>,
}

fn main() {
    assert_eq!(
        ReplicationPatch::FIELD_NAMES,
        &["min_async_wait", "async_replication_disabled"]
    );
    assert_eq!(Replication::SLOT_NAMES, &["MinAsyncWait", "AsyncOff"]);

    let patch = ReplicationPatch {
        replica_movement_minimum_async_wait: Some(Duration::from_secs(3)),
        async_replication_disabled: None,
    };
    assert_eq!(patch.present_keys(), vec!["min_async_wait"]);
}
