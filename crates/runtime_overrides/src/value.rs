//! Live value cells.
//!
//! This module provides [`DynamicValue`], a thread-safe cell holding one
//! overridable value plus the default it was constructed with, and [`Slot`],
//! the optional reference a registry field uses to point at such a cell.
//!
//! # Supported Types
//!
//! | Kind | Rust Type | Document Form |
//! |------|-----------|---------------|
//! | boolean | `bool` | `true` / `false` |
//! | integer | `i32`, `i64`, `u32`, `u64`, `usize` | `13` |
//! | floating point | `f32`, `f64` | `2.5` |
//! | string | `String` | `debug` |
//! | duration | [`Duration`] | `10s`, `1m 30s`, `250ms` |
//!
//! # Unwired Slots
//!
//! A registry may leave any slot unwired. Reads through an unwired [`Slot`]
//! return the type's zero value and writes are silently dropped, so callers
//! never have to check whether a slot is wired before touching it.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use runtime_overrides::{DynamicValue, Slot};
//!
//! let wired: Slot<i64> = Slot::wired(Arc::new(DynamicValue::new(7)));
//! let unwired: Slot<i64> = Slot::unwired();
//!
//! wired.set_value(13);
//! unwired.set_value(13);
//!
//! assert_eq!(wired.get(), 13);
//! assert_eq!(unwired.get(), 0);
//! ```

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

mod sealed {
    pub trait Sealed {}
}

/// A value type that can live inside a [`DynamicValue`].
///
/// The set of implementors is closed: booleans, the common integer and
/// floating point widths, `String`, and [`Duration`]. Each kind knows how to
/// render itself for change records and how to travel through a document.
pub trait OverrideValue:
    sealed::Sealed + Clone + PartialEq + Default + Debug + Send + Sync + 'static
{
    /// Short kind name used in diagnostics (e.g. `"bool"`, `"duration"`).
    const KIND: &'static str;

    /// Render the value the way it appears in change records.
    fn render(&self) -> String;

    /// Deserialize the value from its document representation.
    ///
    /// # Errors
    ///
    /// Returns the deserializer's error when the input has the wrong shape.
    fn deserialize_value<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>;

    /// Serialize the value into its document representation.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error.
    fn serialize_value<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer;
}

macro_rules! plain_override_value {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl OverrideValue for $ty {
                const KIND: &'static str = $kind;

                fn render(&self) -> String {
                    self.to_string()
                }

                fn deserialize_value<'de, D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: Deserializer<'de>,
                {
                    <$ty as Deserialize>::deserialize(deserializer)
                }

                fn serialize_value<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: Serializer,
                {
                    Serialize::serialize(self, serializer)
                }
            }
        )*
    };
}

plain_override_value! {
    bool => "bool",
    i32 => "i32",
    i64 => "i64",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
    String => "string",
}

impl sealed::Sealed for Duration {}

// Durations are written as humantime literals (`10s`) in documents and logs.
impl OverrideValue for Duration {
    const KIND: &'static str = "duration";

    fn render(&self) -> String {
        humantime::format_duration(*self).to_string()
    }

    fn deserialize_value<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        humantime_serde::deserialize(deserializer)
    }

    fn serialize_value<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        humantime_serde::serialize(self, serializer)
    }
}

/// Thread-safe cell holding one overridable value.
///
/// A `DynamicValue` captures its default once, at construction, and never
/// changes it. The current value is guarded by a [`parking_lot::RwLock`], so
/// any number of threads may read while an updater replaces it; every call is
/// atomic with respect to every other call.
///
/// # Epoch
///
/// Each write that goes through [`set_value`](Self::set_value),
/// [`replace`](Self::replace) or [`reset`](Self::reset) bumps an epoch
/// counter. Readers that cache a derived value can use
/// [`has_changed_since`](Self::has_changed_since) instead of comparing values.
///
/// # Example
///
/// ```rust,ignore
/// let count = DynamicValue::new(7_i64);
///
/// count.set_value(13);
/// assert_eq!(count.get(), 13);
///
/// count.reset();
/// assert_eq!(count.get(), 7);
/// ```
pub struct DynamicValue<T> {
    current: RwLock<T>,

    /// Fixed reference point restored by [`reset`](Self::reset).
    default: T,

    epoch: AtomicU64,
}

impl<T: OverrideValue> DynamicValue<T> {
    /// Create a cell whose current value and default are both `default`.
    pub fn new(default: T) -> Self {
        Self {
            current: RwLock::new(default.clone()),
            default,
            epoch: AtomicU64::new(0),
        }
    }

    /// Get a copy of the current value.
    pub fn get(&self) -> T {
        self.current.read().clone()
    }

    /// Read the current value via a closure without cloning it.
    ///
    /// ```rust,ignore
    /// let len = level.read(|s| s.len());
    /// ```
    pub fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let guard = self.current.read();
        f(&*guard)
    }

    /// Replace the current value.
    pub fn set_value(&self, value: T) {
        let _ = self.replace(value);
    }

    /// Replace the current value and return the one it displaced.
    pub fn replace(&self, value: T) -> T {
        let old = {
            let mut guard = self.current.write();
            std::mem::replace(&mut *guard, value)
        };
        self.epoch.fetch_add(1, Ordering::Release);
        old
    }

    /// Restore the construction-time default.
    pub fn reset(&self) {
        self.set_value(self.default.clone());
    }

    /// The construction-time default.
    pub const fn default_value(&self) -> &T {
        &self.default
    }

    /// Number of writes applied so far.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Returns `true` if the cell was written after `epoch` was observed.
    pub fn has_changed_since(&self, epoch: u64) -> bool {
        self.epoch() != epoch
    }

    /// Swap in `value` only if it differs from the current value.
    ///
    /// Comparison and swap happen under one write lock, so two racing
    /// reconciliation passes never both report the same transition.
    pub(crate) fn replace_if_changed(&self, value: &T) -> Option<T> {
        let old = {
            let mut guard = self.current.write();
            if *guard == *value {
                return None;
            }
            std::mem::replace(&mut *guard, value.clone())
        };
        self.epoch.fetch_add(1, Ordering::Release);
        Some(old)
    }
}

impl<T: OverrideValue> Default for DynamicValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: OverrideValue> Debug for DynamicValue<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicValue")
            .field("current", &*self.current.read())
            .field("default", &self.default)
            .field("epoch", &self.epoch())
            .finish()
    }
}

/// Optional reference from a registry field to a [`DynamicValue`].
///
/// Slots are how a registry expresses "this process does not care about this
/// field": an unwired slot reads as the type's zero value and ignores writes.
/// Wired slots share their cell through an [`Arc`], so the subsystem that owns
/// the value keeps reading it directly while the reconciler updates it.
pub struct Slot<T>(Option<Arc<DynamicValue<T>>>);

impl<T> Slot<T> {
    /// A slot that points at nothing.
    pub const fn unwired() -> Self {
        Self(None)
    }

    /// A slot that points at `value`.
    pub const fn wired(value: Arc<DynamicValue<T>>) -> Self {
        Self(Some(value))
    }

    /// Returns `true` if the slot points at a cell.
    pub const fn is_wired(&self) -> bool {
        self.0.is_some()
    }

    /// The wired cell, if any.
    pub fn value(&self) -> Option<&Arc<DynamicValue<T>>> {
        self.0.as_ref()
    }
}

impl<T: OverrideValue> Slot<T> {
    /// Current value, or `T::default()` when unwired.
    pub fn get(&self) -> T {
        self.0.as_ref().map_or_else(T::default, |cell| cell.get())
    }

    /// Set the current value. No-op when unwired.
    pub fn set_value(&self, value: T) {
        if let Some(cell) = &self.0 {
            cell.set_value(value);
        }
    }

    /// Restore the cell's default. No-op when unwired.
    pub fn reset(&self) {
        if let Some(cell) = &self.0 {
            cell.reset();
        }
    }

    /// Replace the current value, returning the displaced one.
    ///
    /// Returns `None` when unwired.
    pub fn replace(&self, value: T) -> Option<T> {
        self.0.as_ref().map(|cell| cell.replace(value))
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::unwired()
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> From<Arc<DynamicValue<T>>> for Slot<T> {
    fn from(value: Arc<DynamicValue<T>>) -> Self {
        Self::wired(value)
    }
}

impl<T> From<&Arc<DynamicValue<T>>> for Slot<T> {
    fn from(value: &Arc<DynamicValue<T>>) -> Self {
        Self::wired(Arc::clone(value))
    }
}

impl<T: OverrideValue> Debug for Slot<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(cell) => f.debug_tuple("Slot").field(cell).finish(),
            None => f.write_str("Slot(<unwired>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_at_default() {
        let value = DynamicValue::new(7_i64);
        assert_eq!(value.get(), 7);
        assert_eq!(*value.default_value(), 7);
        assert_eq!(value.epoch(), 0);
    }

    #[test]
    fn test_replace_returns_previous() {
        let value = DynamicValue::new(String::from("info"));
        let old = value.replace(String::from("debug"));

        assert_eq!(old, "info");
        assert_eq!(value.get(), "debug");
        assert_eq!(*value.default_value(), "info");
    }

    #[test]
    fn test_replace_if_changed_skips_equal_values() {
        let value = DynamicValue::new(true);

        assert_eq!(value.replace_if_changed(&true), None);
        assert_eq!(value.epoch(), 0);

        assert_eq!(value.replace_if_changed(&false), Some(true));
        assert_eq!(value.epoch(), 1);
    }

    #[test]
    fn test_epoch_tracks_writes() {
        let value = DynamicValue::new(Duration::from_secs(1));
        let epoch = value.epoch();
        assert!(!value.has_changed_since(epoch));

        value.set_value(Duration::from_secs(2));
        assert!(value.has_changed_since(epoch));
    }

    #[test]
    fn test_duration_render() {
        assert_eq!(Duration::from_secs(10).render(), "10s");
        assert_eq!(Duration::ZERO.render(), "0s");
        assert_eq!(Duration::from_millis(1500).render(), "1s 500ms");
    }

    #[test]
    fn test_unwired_slot_debug() {
        let slot: Slot<bool> = Slot::unwired();
        assert_eq!(format!("{slot:?}"), "Slot(<unwired>)");
    }
}
