use std::time::Duration;

use runtime_overrides::{RuntimeOverrides, Slot};

#[derive(RuntimeOverrides, Default, Clone, Debug)]
struct Knobs {
    flag: Slot<bool>,
    small: Slot<i32>,
    large: Slot<i64>,
    small_unsigned: Slot<u32>,
    large_unsigned: Slot<u64>,
    count: Slot<usize>,
    ratio: Slot<f32>,
    precise_ratio: Slot<f64>,
    level: Slot<String>,
    wait: Slot<Duration>,
}

fn main() {
    let knobs = Knobs::default();
    assert_eq!(knobs.wired_count(), 0);
    assert_eq!(Knobs::SLOT_NAMES.len(), 10);

    let overlay = KnobsOverlay::default();
    assert_eq!(overlay, overlay.clone());
}
