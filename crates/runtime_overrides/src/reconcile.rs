//! Applying overlays to a registry.
//!
//! Reconciliation walks every slot of a registry in declared order:
//!
//! | Key in overlay | Slot wired | Effect |
//! |----------------|------------|--------|
//! | present | yes | set to the overlay value |
//! | absent | yes | reset to the construction-time default |
//! | either | no | nothing |
//!
//! A [`ChangeRecord`] is produced only when a slot's effective value actually
//! changed, so applying the same overlay twice yields no records the second
//! time. Defaults are fixed reference points: removing a key always restores
//! the value the cell was constructed with, never an earlier override.

use std::fmt::{self, Display, Formatter};
use std::path::Path;

use crate::error::Error;
use crate::overlay::load_overlay;
use crate::registry::RuntimeOverrides;
use crate::sink::ChangeSink;
use crate::value::{OverrideValue, Slot};

/// One field's transition during a reconciliation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeRecord {
    /// Slot label, e.g. `MaximumAllowedCollectionsCount`.
    pub field: &'static str,

    /// Document key, e.g. `maximum_allowed_collections_count`.
    pub key: &'static str,

    /// Rendered value before the pass.
    pub old_value: String,

    /// Rendered value after the pass.
    pub new_value: String,
}

impl ChangeRecord {
    /// Create a change record.
    pub fn new(
        field: &'static str,
        key: &'static str,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            field,
            key,
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }
}

impl Display for ChangeRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "config '{}' changed from '{}' to '{}'",
            self.field, self.old_value, self.new_value
        )
    }
}

/// Reconcile one slot against its overlay value.
///
/// This is what the code generated by `#[derive(RuntimeOverrides)]` calls for
/// each field. `value` is `None` when the key is absent from the overlay.
pub fn reconcile_slot<T: OverrideValue>(
    field: &'static str,
    key: &'static str,
    slot: &Slot<T>,
    value: Option<&T>,
    changes: &mut Vec<ChangeRecord>,
) {
    let Some(cell) = slot.value() else {
        return;
    };

    let target = value.unwrap_or_else(|| cell.default_value());

    if let Some(old) = cell.replace_if_changed(target) {
        changes.push(ChangeRecord::new(
            field,
            key,
            old.render(),
            target.render(),
        ));
    }
}

/// Apply `overlay` to `registry` and record every change to `sink`.
///
/// All slots are updated before anything is written to the sink, so a sink
/// failure never leaves the registry half-applied. Every record is offered
/// to the sink even after one fails.
///
/// Returns the records of this pass.
///
/// # Errors
///
/// [`Error::Log`] for the first record the sink failed to accept. The new
/// values are in effect regardless.
///
/// # Example
///
/// ```rust,ignore
/// let overlay = parse_yaml(b"autoschema_enabled: true")?;
/// let changes = update(&mut TracingSink, &registry, &overlay)?;
/// ```
pub fn update<R, S>(
    sink: &mut S,
    registry: &R,
    overlay: &R::Overlay,
) -> Result<Vec<ChangeRecord>, Error>
where
    R: RuntimeOverrides + ?Sized,
    S: ChangeSink + ?Sized,
{
    let mut changes = Vec::new();
    registry.reconcile(overlay, &mut changes);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        slots = R::SLOT_NAMES.len(),
        wired = registry.wired_count(),
        changed = changes.len(),
        "reconciled runtime overrides"
    );

    let mut first_failure = None;
    for change in &changes {
        if let Err(source) = sink.record(change) {
            #[cfg(feature = "tracing")]
            tracing::warn!(field = change.field, error = %source, "failed to record runtime override change");

            first_failure.get_or_insert(Error::Log {
                field: change.field.to_string(),
                source,
            });
        }
    }

    match first_failure {
        Some(err) => Err(err),
        None => Ok(changes),
    }
}

/// Read an overrides file and apply it to `registry`.
///
/// When the file cannot be read or parsed, the registry is left untouched.
///
/// # Errors
///
/// Any error from [`load_overlay`], or [`Error::Log`] from [`update`].
pub fn apply_file<R, S>(
    sink: &mut S,
    registry: &R,
    path: impl AsRef<Path>,
) -> Result<Vec<ChangeRecord>, Error>
where
    R: RuntimeOverrides + ?Sized,
    S: ChangeSink + ?Sized,
{
    let overlay = load_overlay::<R::Overlay>(path)?;
    update(sink, registry, &overlay)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::value::DynamicValue;

    #[test]
    fn test_present_value_sets_slot() {
        let cell = Arc::new(DynamicValue::new(7_i64));
        let slot = Slot::from(&cell);
        let mut changes = Vec::new();

        reconcile_slot("Count", "count", &slot, Some(&13), &mut changes);

        assert_eq!(cell.get(), 13);
        assert_eq!(changes, vec![ChangeRecord::new("Count", "count", "7", "13")]);
    }

    #[test]
    fn test_absent_value_resets_to_default() {
        let cell = Arc::new(DynamicValue::new(7_i64));
        cell.set_value(10);
        let slot = Slot::from(&cell);
        let mut changes = Vec::new();

        reconcile_slot("Count", "count", &slot, None, &mut changes);

        assert_eq!(cell.get(), 7);
        assert_eq!(changes, vec![ChangeRecord::new("Count", "count", "10", "7")]);
    }

    #[test]
    fn test_unchanged_value_records_nothing() {
        let cell = Arc::new(DynamicValue::new(false));
        let slot = Slot::from(&cell);
        let mut changes = Vec::new();

        reconcile_slot("Flag", "flag", &slot, None, &mut changes);
        reconcile_slot("Flag", "flag", &slot, Some(&false), &mut changes);

        assert!(changes.is_empty());
        assert_eq!(cell.epoch(), 0);
    }

    #[test]
    fn test_unwired_slot_is_skipped() {
        let slot: Slot<String> = Slot::unwired();
        let mut changes = Vec::new();

        reconcile_slot("Level", "level", &slot, Some(&"debug".to_string()), &mut changes);
        reconcile_slot("Level", "level", &slot, None, &mut changes);

        assert!(changes.is_empty());
        assert_eq!(slot.get(), "");
    }

    #[test]
    fn test_change_record_display() {
        let record = ChangeRecord::new("AutoschemaEnabled", "autoschema_enabled", "false", "true");
        assert_eq!(
            record.to_string(),
            "config 'AutoschemaEnabled' changed from 'false' to 'true'"
        );
    }
}
