//! Ready-made registry of server knobs.
//!
//! Each subsystem that wants a knob to be live owns the
//! [`DynamicValue`](crate::DynamicValue), reads it directly, and wires it
//! into one slot here. Subsystems that are not compiled into a given binary
//! simply leave their slot unwired.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use runtime_overrides::{DynamicValue, Slot, TracingSink, apply_file};
//! use runtime_overrides::server::ServerRuntimeConfig;
//!
//! let max_collections = Arc::new(DynamicValue::new(1000_i64));
//! let autoschema = Arc::new(DynamicValue::new(true));
//!
//! let registry = ServerRuntimeConfig {
//!     maximum_allowed_collections_count: Slot::from(&max_collections),
//!     autoschema_enabled: Slot::from(&autoschema),
//!     ..ServerRuntimeConfig::default()
//! };
//!
//! // Called by whatever decides the file changed.
//! apply_file(&mut TracingSink, &registry, "/etc/server/overrides.yaml")?;
//! ```

use std::time::Duration;

use crate::value::Slot;

/// Server settings that may be changed without a restart.
///
/// | Key | Type |
/// |-----|------|
/// | `maximum_allowed_collections_count` | integer |
/// | `autoschema_enabled` | boolean |
/// | `async_replication_disabled` | boolean |
/// | `tenant_activity_read_log_level` | string |
/// | `tenant_activity_write_log_level` | string |
/// | `revectorize_check_disabled` | boolean |
/// | `replica_movement_minimum_async_wait` | duration (`10s`) |
#[derive(crate::RuntimeOverrides, Debug, Default, Clone)]
pub struct ServerRuntimeConfig {
    /// Upper bound on the number of collections a server will create.
    pub maximum_allowed_collections_count: Slot<i64>,

    /// Whether unknown properties extend the schema on write.
    pub autoschema_enabled: Slot<bool>,

    /// Turns off background replica reconciliation.
    pub async_replication_disabled: Slot<bool>,

    /// Log level for tenant read activity.
    pub tenant_activity_read_log_level: Slot<String>,

    /// Log level for tenant write activity.
    pub tenant_activity_write_log_level: Slot<String>,

    /// Skips the check for whether a vector needs recomputing on update.
    pub revectorize_check_disabled: Slot<bool>,

    /// Minimum wait before a moved replica is considered caught up.
    pub replica_movement_minimum_async_wait: Slot<Duration>,
}
