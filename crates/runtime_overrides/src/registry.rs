//! The registry contract.
//!
//! A registry is a plain struct of [`Slot`](crate::Slot) fields. Deriving
//! [`RuntimeOverrides`](macro@crate::RuntimeOverrides) on it produces, at
//! compile time, the table that ties each slot to its document key and log
//! label, plus the companion overlay struct that the parser fills in.
//!
//! ```rust,ignore
//! use runtime_overrides::{RuntimeOverrides, Slot};
//! use std::time::Duration;
//!
//! #[derive(RuntimeOverrides, Default)]
//! pub struct LiveConfig {
//!     pub autoschema_enabled: Slot<bool>,
//!
//!     #[overrides(key = "min_async_wait")]
//!     pub replica_movement_minimum_async_wait: Slot<Duration>,
//! }
//!
//! // Generated alongside:
//! //
//! // pub struct LiveConfigOverlay {
//! //     pub autoschema_enabled: Option<bool>,
//! //     pub replica_movement_minimum_async_wait: Option<Duration>,
//! // }
//! ```

use crate::overlay::Overlay;
use crate::reconcile::ChangeRecord;

/// A fixed set of named, typed, optionally wired slots.
///
/// Implemented by `#[derive(RuntimeOverrides)]`; writing it by hand is
/// possible but the derive keeps keys, labels and slots in sync.
pub trait RuntimeOverrides {
    /// The overlay struct whose fields mirror this registry's slots.
    type Overlay: Overlay;

    /// Labels used in change records, in declared order.
    const SLOT_NAMES: &'static [&'static str];

    /// Apply `overlay` to every slot in declared order, appending one record
    /// per slot whose effective value changed.
    ///
    /// Present keys set their slot; absent keys reset it to its default;
    /// unwired slots are skipped.
    fn reconcile(&self, overlay: &Self::Overlay, changes: &mut Vec<ChangeRecord>);

    /// Number of slots currently wired.
    fn wired_count(&self) -> usize;
}
